//! Gateway traits for the operations the admin services depend on.
//!
//! [`BackendClient`] implements both; tests substitute in-memory fakes.

use async_trait::async_trait;
use proglearn_core::{
    Category, CategoryPayload, Email, Lesson, LessonId, LessonPatch, LessonPayload, Profile,
};
use secrecy::SecretString;

use crate::auth::AuthSession;
use crate::client::BackendClient;
use crate::error::BackendError;

/// Lesson and category persistence.
#[async_trait]
pub trait LessonGateway: Send + Sync {
    async fn list_all_lessons(&self) -> Result<Vec<Lesson>, BackendError>;

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError>;

    async fn create_lesson(&self, payload: &LessonPayload) -> Result<Lesson, BackendError>;

    async fn update_lesson(
        &self,
        id: LessonId,
        patch: &LessonPatch,
    ) -> Result<Lesson, BackendError>;

    async fn delete_lesson(&self, id: LessonId) -> Result<(), BackendError>;

    async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, BackendError>;
}

/// Sign-in and session lifecycle.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError>;

    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<AuthSession, BackendError>;

    async fn sign_out(&self, access_token: &SecretString) -> Result<(), BackendError>;

    async fn fetch_profile(&self, session: &AuthSession) -> Result<Profile, BackendError>;
}

#[async_trait]
impl LessonGateway for BackendClient {
    async fn list_all_lessons(&self) -> Result<Vec<Lesson>, BackendError> {
        Self::list_all_lessons(self).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        Self::list_categories(self).await
    }

    async fn create_lesson(&self, payload: &LessonPayload) -> Result<Lesson, BackendError> {
        Self::create_lesson(self, payload).await
    }

    async fn update_lesson(
        &self,
        id: LessonId,
        patch: &LessonPatch,
    ) -> Result<Lesson, BackendError> {
        Self::update_lesson(self, id, patch).await
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), BackendError> {
        Self::delete_lesson(self, id).await
    }

    async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, BackendError> {
        Self::create_category(self, payload).await
    }
}

#[async_trait]
impl AuthGateway for BackendClient {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        Self::sign_in_with_password(self, email, password).await
    }

    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        Self::refresh_session(self, refresh_token).await
    }

    async fn sign_out(&self, access_token: &SecretString) -> Result<(), BackendError> {
        Self::sign_out(self, access_token).await
    }

    async fn fetch_profile(&self, session: &AuthSession) -> Result<Profile, BackendError> {
        Self::fetch_profile(self, session).await
    }
}
