//! Media storage and the media table.

use chrono::Utc;
use proglearn_core::types::media::storage_key;
use proglearn_core::{MediaAsset, MediaId, NewMedia, UserId};
use reqwest::{Method, header};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::client::BackendClient;
use crate::error::BackendError;

const TABLE: &str = "media";

/// A file received from an upload form.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original file name as sent by the browser.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Serialize)]
struct RemoveObjects<'a> {
    prefixes: [&'a str; 1],
}

impl BackendClient {
    /// Public URL of an object in the media bucket.
    #[must_use]
    pub fn public_url(&self, key: &str) -> Url {
        self.endpoint(&["storage", "v1", "object", "public", self.media_bucket(), key])
    }

    /// All media, newest first, with the uploader's display name.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_media(&self) -> Result<Vec<MediaAsset>, BackendError> {
        let url = self.table_url(
            TABLE,
            &[
                (
                    "select",
                    "id,filename,url,type,uploaded_by,created_at,profiles(name)",
                ),
                ("order", "created_at.desc"),
            ],
        );
        let media: Vec<MediaAsset> = self.send_json(self.request(Method::GET, url)).await?;
        debug!(count = media.len(), "Fetched media");
        Ok(media)
    }

    /// Store a file and record it in the media table.
    ///
    /// The object key is `<unix-millis>-<name>`; an existing object with the
    /// same key is never overwritten. If recording the row fails the object
    /// stays in storage.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the key already exists, or any error from the
    /// insert.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_media(
        &self,
        upload: Upload,
        uploaded_by: Option<UserId>,
    ) -> Result<MediaAsset, BackendError> {
        let key = storage_key(Utc::now().timestamp_millis(), &upload.file_name);
        let object_url = self.endpoint(&["storage", "v1", "object", self.media_bucket(), &key]);

        let request = self
            .request(Method::POST, object_url)
            .header(header::CONTENT_TYPE, upload.content_type.as_str())
            .header("x-upsert", "false")
            .body(upload.bytes);
        self.send_empty(request).await?;
        debug!(key = %key, "Object stored");

        let row = NewMedia {
            url: self.public_url(&key).to_string(),
            filename: key,
            content_type: upload.content_type,
            uploaded_by,
        };
        let url = self.table_url(TABLE, &[("select", "*")]);
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&row);
        self.send_single(request).await
    }

    /// Remove a stored object, then its media row.
    ///
    /// # Errors
    ///
    /// Returns the storage error without touching the row if the object
    /// cannot be removed.
    #[instrument(skip(self), fields(media_id = %id))]
    pub async fn delete_media(&self, id: MediaId, filename: &str) -> Result<(), BackendError> {
        let bucket_url = self.endpoint(&["storage", "v1", "object", self.media_bucket()]);
        let request = self
            .request(Method::DELETE, bucket_url)
            .json(&RemoveObjects {
                prefixes: [filename],
            });
        self.send_empty(request).await?;

        let filter = format!("eq.{id}");
        let url = self.table_url(TABLE, &[("id", &filter)]);
        self.send_empty(self.request(Method::DELETE, url)).await?;
        debug!("Media deleted");
        Ok(())
    }
}
