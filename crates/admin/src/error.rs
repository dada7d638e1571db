//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use proglearn_backend::{BackendError, ErrorKind};
use proglearn_core::UserId;
use thiserror::Error;

use crate::services::EditorError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Editor or lesson-manager operation failed.
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const fn backend_status(err: &BackendError) -> StatusCode {
    match err.kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Rejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Transport | ErrorKind::Server | ErrorKind::Decode => StatusCode::BAD_GATEWAY,
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(err) | Self::Editor(EditorError::Backend(err)) => backend_status(err),
            Self::Editor(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Backend messages are shown verbatim to admins; internals are not.
        let message = match &self {
            Self::Backend(err) | Self::Editor(EditorError::Backend(err)) => err.message.clone(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the signed-in admin.
pub fn set_sentry_user(user_id: &UserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use proglearn_core::editor::DraftError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("lesson 12".to_string());
        assert_eq!(err.to_string(), "Not found: lesson 12");

        let err = AppError::Editor(EditorError::Draft(DraftError::MissingTitleOrContent));
        assert_eq!(err.to_string(), "Title and content are required.");
    }

    #[test]
    fn test_backend_errors_map_by_kind() {
        let rls = r#"{"code":"42501","message":"new row violates row-level security policy"}"#;
        assert_eq!(
            get_status(BackendError::from_response(StatusCode::UNAUTHORIZED, rls).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(BackendError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "").into()),
            StatusCode::BAD_GATEWAY
        );
        let editor = EditorError::Backend(BackendError::from_response(StatusCode::NOT_FOUND, ""));
        assert_eq!(get_status(editor.into()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Editor(EditorError::EmptyCategoryName)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
