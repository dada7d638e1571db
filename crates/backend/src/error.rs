//! Errors returned by the backend service.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Broad classification of a failed call.
///
/// Callers branch on this rather than on raw status codes: the storefront
/// ignores `PermissionDenied` when counting views, the admin shows
/// `Rejected` messages verbatim, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, TLS, timeout, refused).
    Transport,
    /// Missing or insufficient credentials, or a row-level policy rejection.
    PermissionDenied,
    /// The addressed record does not exist.
    NotFound,
    /// A uniqueness constraint was violated.
    Conflict,
    /// Any other client error, such as bad input or wrong credentials.
    Rejected,
    /// The service failed.
    Server,
    /// The response body could not be decoded.
    Decode,
}

/// A failed backend call.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: ErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Service error code (`42501`, `PGRST116`, `invalid_grant`, ...).
    pub code: Option<String>,
    pub message: String,
}

/// Insufficient privilege (row-level security).
const CODE_INSUFFICIENT_PRIVILEGE: &str = "42501";
/// Unique violation.
const CODE_UNIQUE_VIOLATION: &str = "23505";
/// Single-object request matched no rows.
const CODE_NO_ROWS: &str = "PGRST116";
/// Remote procedure not found in the schema cache.
const CODE_UNKNOWN_FUNCTION: &str = "PGRST202";

impl BackendError {
    pub(crate) fn transport(error: &reqwest::Error) -> Self {
        Self {
            kind: ErrorKind::Transport,
            status: None,
            code: None,
            message: format!("Network error: {error}"),
        }
    }

    pub(crate) fn decode(status: StatusCode, error: impl std::fmt::Display) -> Self {
        Self {
            kind: ErrorKind::Decode,
            status: Some(status.as_u16()),
            code: None,
            message: format!("Unexpected response from backend: {error}"),
        }
    }

    /// Build an error from a non-success response body.
    ///
    /// Table, auth and storage endpoints each shape their error bodies a
    /// little differently; the code and message are picked from whichever
    /// fields are present.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);

        let code = ["code", "error_code", "error"]
            .iter()
            .find_map(|key| match parsed.get(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            });

        let message = ["message", "msg", "error_description", "error"]
            .iter()
            .find_map(|key| parsed.get(key).and_then(Value::as_str))
            .filter(|m| !m.is_empty())
            .map_or_else(
                || {
                    let text = body.trim();
                    if text.is_empty() || text.len() > 200 {
                        format!("Request failed with status {}", status.as_u16())
                    } else {
                        text.to_string()
                    }
                },
                str::to_string,
            );

        Self {
            kind: classify(status, code.as_deref()),
            status: Some(status.as_u16()),
            code,
            message,
        }
    }

    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        self.kind == ErrorKind::PermissionDenied
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Whether a procedure call failed because the procedure doesn't exist.
    #[must_use]
    pub fn is_unknown_function(&self) -> bool {
        self.code.as_deref() == Some(CODE_UNKNOWN_FUNCTION)
            || (self.status == Some(404) && self.code.is_none())
    }
}

fn classify(status: StatusCode, code: Option<&str>) -> ErrorKind {
    match code {
        Some(CODE_INSUFFICIENT_PRIVILEGE) => return ErrorKind::PermissionDenied,
        Some(CODE_NO_ROWS) => return ErrorKind::NotFound,
        Some(CODE_UNIQUE_VIOLATION) => return ErrorKind::Conflict,
        _ => {}
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::PermissionDenied,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        s if s.is_server_error() => ErrorKind::Server,
        _ => ErrorKind::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_level_security_is_permission_denied() {
        let error = BackendError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"code":"42501","message":"new row violates row-level security policy"}"#,
        );
        assert_eq!(error.kind, ErrorKind::PermissionDenied);
        assert_eq!(error.message, "new row violates row-level security policy");
    }

    #[test]
    fn test_single_object_with_no_rows_is_not_found() {
        let error = BackendError::from_response(
            StatusCode::NOT_ACCEPTABLE,
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#,
        );
        assert!(error.is_not_found());
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let error = BackendError::from_response(StatusCode::CONFLICT, r#"{"code":"23505"}"#);
        assert_eq!(error.kind, ErrorKind::Conflict);
        assert_eq!(error.message, r#"{"code":"23505"}"#);
    }

    #[test]
    fn test_auth_error_body() {
        let error = BackendError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(error.kind, ErrorKind::Rejected);
        assert_eq!(error.code.as_deref(), Some("invalid_grant"));
        assert_eq!(error.message, "Invalid login credentials");
    }

    #[test]
    fn test_status_fallbacks() {
        let unauthorized = BackendError::from_response(StatusCode::UNAUTHORIZED, "");
        assert!(unauthorized.is_permission_denied());
        assert_eq!(unauthorized.message, "Request failed with status 401");

        let server = BackendError::from_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(server.kind, ErrorKind::Server);
        assert_eq!(server.message, "upstream down");
    }

    #[test]
    fn test_unknown_function() {
        let error = BackendError::from_response(
            StatusCode::NOT_FOUND,
            r#"{"code":"PGRST202","message":"Could not find the function"}"#,
        );
        assert!(error.is_unknown_function());

        let denied = BackendError::from_response(StatusCode::FORBIDDEN, r#"{"code":"42501"}"#);
        assert!(!denied.is_unknown_function());
    }
}
