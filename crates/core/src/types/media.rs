//! Uploaded media assets.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::id::{MediaId, UserId};
use super::lesson::null_as_default;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// A media row. `filename` is the storage key inside the media bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: MediaId,
    pub filename: String,
    pub url: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(default)]
    pub uploaded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    /// Embedded `profiles(name)` of the uploader.
    #[serde(default, rename = "profiles")]
    pub uploader: Option<Uploader>,
}

impl MediaAsset {
    /// Whether the asset can be shown inline as an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Display name of the uploader, if known.
    #[must_use]
    pub fn uploader_name(&self) -> Option<&str> {
        self.uploader
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// The `profiles(name)` embed on a media row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uploader {
    #[serde(default)]
    pub name: Option<String>,
}

/// Body inserted into the media table after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMedia {
    pub filename: String,
    pub url: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub uploaded_by: Option<UserId>,
}

/// Storage key for an uploaded file: `<unix-millis>-<name>`, with every
/// whitespace run in the name replaced by a single `-`.
#[must_use]
pub fn storage_key(timestamp_millis: i64, file_name: &str) -> String {
    format!(
        "{timestamp_millis}-{}",
        WHITESPACE_RUN.replace_all(file_name, "-")
    )
}
