//! Lesson categories.

use serde::{Deserialize, Deserializer, Serialize};

use super::id::CategoryId;
use super::lesson::null_as_default;
use super::status::Difficulty;

/// A category row, optionally carrying the number of lessons filed under it.
///
/// The backend returns the count as an embedded aggregate
/// (`lessons(count)` → `"lessons": [{"count": 4}]`); it is flattened into
/// `lesson_count` here and defaults to zero when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(
        default,
        rename(deserialize = "lessons"),
        deserialize_with = "embedded_count"
    )]
    pub lesson_count: u64,
}

/// Body for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub difficulty: Difficulty,
}

impl CategoryPayload {
    /// Build a payload, trimming the name.
    ///
    /// Returns `None` when the trimmed name is empty.
    #[must_use]
    pub fn new(name: &str, difficulty: Difficulty) -> Option<Self> {
        let name = name.trim();
        (!name.is_empty()).then(|| Self {
            name: name.to_string(),
            difficulty,
        })
    }
}

#[derive(Deserialize)]
struct CountRow {
    #[serde(default)]
    count: u64,
}

fn embedded_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let rows = Option::<Vec<CountRow>>::deserialize(deserializer)?;
    Ok(rows
        .and_then(|rows| rows.into_iter().next())
        .map_or(0, |row| row.count))
}
