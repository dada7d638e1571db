//! Lesson records and the payloads used to write them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::id::{CategoryId, LessonId};
use super::status::{Difficulty, LessonStatus};
use crate::text;

/// Language assumed for code snippets that don't declare one.
pub const DEFAULT_SNIPPET_LANGUAGE: &str = "javascript";

/// A lesson row as returned by the backend.
///
/// Optional text columns are normalized on the way in: `null` and empty
/// strings both become `None`, so templates only have to check one thing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub status: LessonStatus,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Embedded `categories(name, difficulty)` relation, when selected.
    #[serde(default, rename = "categories")]
    pub category: Option<CategoryRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "non_empty")]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "CodeSnippet::deserialize_lenient")]
    pub code_snippets: Vec<CodeSnippet>,
}

impl Lesson {
    /// Timestamp of the most recent change: `updated_at`, else `created_at`.
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Name of the embedded category, if the row carried one.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    /// Whether the lesson is visible on the public site.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == LessonStatus::Published
    }

    /// Estimated reading time in minutes (at least one).
    #[must_use]
    pub fn reading_time_minutes(&self) -> u32 {
        text::reading_time_minutes(&self.content)
    }
}

/// The `categories(name, difficulty)` embed on a lesson row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// A code example attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub id: String,
    pub code: String,
    pub language: String,
    pub title: String,
}

impl CodeSnippet {
    /// Normalize a raw `code_snippets` value.
    ///
    /// Accepts plain strings or objects using either `code`/`content`,
    /// `language`/`lang` and `title`/`name`. Anything else, and snippets
    /// whose code is empty, are dropped. A non-array value yields nothing.
    #[must_use]
    pub fn normalize_all(raw: &Value) -> Vec<Self> {
        let Some(items) = raw.as_array() else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| Self::normalize_one(index, item))
            .filter(|snippet| !snippet.code.is_empty())
            .collect()
    }

    fn normalize_one(index: usize, item: &Value) -> Option<Self> {
        let fallback_id = format!("snippet-{index}");
        let fallback_title = format!("Code Snippet {}", index + 1);

        match item {
            Value::String(code) => Some(Self {
                id: fallback_id,
                code: code.clone(),
                language: DEFAULT_SNIPPET_LANGUAGE.to_string(),
                title: fallback_title,
            }),
            Value::Object(map) => {
                let field = |keys: &[&str]| {
                    keys.iter()
                        .find_map(|key| map.get(*key).and_then(Value::as_str))
                        .map(str::to_string)
                };
                let id = match map.get("id") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => fallback_id,
                };
                Some(Self {
                    id,
                    code: field(&["code", "content"]).unwrap_or_default(),
                    language: field(&["language", "lang"])
                        .unwrap_or_else(|| DEFAULT_SNIPPET_LANGUAGE.to_string()),
                    title: field(&["title", "name"]).unwrap_or(fallback_title),
                })
            }
            _ => None,
        }
    }

    /// Render the snippet as a fenced markdown code block.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        format!("```{}\n{}\n```", self.language, self.code)
    }

    fn deserialize_lenient<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Self>, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::normalize_all(&raw))
    }
}

/// Full body for creating or saving a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPayload {
    pub title: String,
    pub content: String,
    pub featured_image: String,
    pub status: LessonStatus,
    pub category_id: Option<CategoryId>,
    pub excerpt: String,
    pub meta_description: String,
    pub code_snippets: Vec<CodeSnippet>,
}

/// Partial lesson update. Only fields that are `Some` are sent.
///
/// `category_id` is doubly optional so a patch can clear the category
/// (`Some(None)` serializes as `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LessonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LessonStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<CategoryId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views_count: Option<u64>,
}

impl LessonPatch {
    /// A patch that changes nothing but the status.
    #[must_use]
    pub fn status(status: LessonStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// A patch that sets the view counter.
    #[must_use]
    pub fn views(views_count: u64) -> Self {
        Self {
            views_count: Some(views_count),
            ..Self::default()
        }
    }
}

impl From<LessonPayload> for LessonPatch {
    /// Saving an existing lesson sends every editable field but leaves the
    /// stored code snippets alone, since the editor never changes them.
    fn from(payload: LessonPayload) -> Self {
        Self {
            title: Some(payload.title),
            content: Some(payload.content),
            featured_image: Some(payload.featured_image),
            status: Some(payload.status),
            category_id: Some(payload.category_id),
            excerpt: Some(payload.excerpt),
            meta_description: Some(payload.meta_description),
            views_count: None,
        }
    }
}

/// Deserialize `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize an optional string, treating blank strings as absent.
pub(crate) fn non_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Value {
        json!({
            "id": 3,
            "title": "Pointers",
            "content": "# Pointers\n\nAddresses all the way down.",
            "featured_image": "",
            "status": "published",
            "category_id": 1,
            "categories": { "name": "C", "difficulty": "intermediate" },
            "views_count": 12,
            "created_at": "2026-01-10T08:00:00Z",
            "updated_at": null,
            "excerpt": null,
            "code_snippets": ["int *p = &x;", { "lang": "c", "content": "", "name": "empty" }]
        })
    }

    #[test]
    fn test_lesson_row_is_normalized() {
        let lesson: Lesson = serde_json::from_value(row()).unwrap();

        assert_eq!(lesson.id, LessonId::new(3));
        assert_eq!(lesson.featured_image, None);
        assert_eq!(lesson.status, LessonStatus::Published);
        assert_eq!(lesson.category_name(), Some("C"));
        assert_eq!(lesson.views_count, 12);
        assert_eq!(lesson.last_activity(), lesson.created_at);
        assert_eq!(lesson.code_snippets.len(), 1);
        assert_eq!(lesson.code_snippets[0].language, "javascript");
    }

    #[test]
    fn test_lesson_row_with_nulls_uses_defaults() {
        let lesson: Lesson = serde_json::from_value(json!({
            "id": 9,
            "title": null,
            "content": null,
            "status": null,
            "views_count": null,
            "created_at": "2026-01-10T08:00:00Z"
        }))
        .unwrap();

        assert_eq!(lesson.title, "");
        assert_eq!(lesson.status, LessonStatus::Draft);
        assert_eq!(lesson.views_count, 0);
        assert!(lesson.code_snippets.is_empty());
        assert!(lesson.category.is_none());
    }

    #[test]
    fn test_code_snippet_alternate_keys() {
        let snippets = CodeSnippet::normalize_all(&json!([
            { "id": 5, "content": "print('hi')", "lang": "python", "name": "Hello" },
            42,
            "fn main() {}"
        ]));

        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].id, "5");
        assert_eq!(snippets[0].language, "python");
        assert_eq!(snippets[0].title, "Hello");
        assert_eq!(snippets[1].id, "snippet-2");
        assert_eq!(snippets[1].title, "Code Snippet 3");
    }

    #[test]
    fn test_code_snippet_non_array_is_empty() {
        assert!(CodeSnippet::normalize_all(&json!({"code": "x"})).is_empty());
        assert!(CodeSnippet::normalize_all(&Value::Null).is_empty());
    }

    #[test]
    fn test_status_patch_serializes_only_status() {
        let body = serde_json::to_value(LessonPatch::status(LessonStatus::Published)).unwrap();
        assert_eq!(body, json!({ "status": "published" }));
    }

    #[test]
    fn test_patch_from_payload_can_clear_category() {
        let payload = LessonPayload {
            title: "T".to_string(),
            content: "C".to_string(),
            featured_image: String::new(),
            status: LessonStatus::Draft,
            category_id: None,
            excerpt: "C".to_string(),
            meta_description: "C".to_string(),
            code_snippets: Vec::new(),
        };
        let body = serde_json::to_value(LessonPatch::from(payload)).unwrap();

        assert_eq!(body["category_id"], Value::Null);
        assert!(body.get("code_snippets").is_none());
        assert!(body.get("views_count").is_none());
    }
}
