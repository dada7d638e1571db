//! Data kept in the admin's server-side session.

use serde::{Deserialize, Serialize};

/// Severity of a one-shot message shown after a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A message carried across one redirect, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.level, FlashLevel::Error)
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// The visitor's resolved identity (tokens and profile).
    pub const IDENTITY: &str = "identity";

    /// Pending flash message.
    pub const FLASH: &str = "flash";
}
