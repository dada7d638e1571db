//! Category table operations.

use proglearn_core::{Category, CategoryId, CategoryPayload};
use reqwest::Method;
use tracing::{debug, instrument};

use crate::client::BackendClient;
use crate::error::BackendError;

const TABLE: &str = "categories";

impl BackendClient {
    /// All categories with their lesson counts, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        let url = self.table_url(
            TABLE,
            &[
                ("select", "id,name,difficulty,lessons(count)"),
                ("order", "name.asc"),
            ],
        );
        let categories: Vec<Category> = self.send_json(self.request(Method::GET, url)).await?;
        debug!(count = categories.len(), "Fetched categories");
        Ok(categories)
    }

    /// A single category.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if no category has this id.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn fetch_category(&self, id: CategoryId) -> Result<Category, BackendError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(
            TABLE,
            &[("select", "id,name,difficulty,lessons(count)"), ("id", &filter)],
        );
        self.send_single(self.request(Method::GET, url)).await
    }

    /// Insert a category. The returned row has a lesson count of zero.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the name is taken (when the table enforces it).
    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_category(
        &self,
        payload: &CategoryPayload,
    ) -> Result<Category, BackendError> {
        let url = self.table_url(TABLE, &[("select", "*")]);
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(payload);
        let category: Category = self.send_single(request).await?;
        debug!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Rename a category or change its difficulty.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    #[instrument(skip(self, payload), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        payload: &CategoryPayload,
    ) -> Result<Category, BackendError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(TABLE, &[("id", &filter), ("select", "*")]);
        let request = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(payload);
        self.send_single(request).await
    }

    /// Delete a category. Lessons filed under it are handled by the store.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), BackendError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(TABLE, &[("id", &filter)]);
        self.send_empty(self.request(Method::DELETE, url)).await
    }
}
