//! Bulk lesson import from JSON.
//!
//! The document is either a single lesson object or an array of them. Only
//! the editable lesson fields are read; anything else is ignored.

use serde_json::{Map, Value};

use crate::text;
use crate::types::{CategoryId, LessonPayload, LessonStatus};

/// Title given to imported records without one.
pub const DEFAULT_TITLE: &str = "Imported Lesson";

/// Content given to imported records without any.
pub const DEFAULT_CONTENT: &str = "## Imported\n\nNo content provided.";

/// Why an import document was rejected.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("Invalid file format: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid file format: record {index} is not a lesson object")]
    NotAnObject { index: usize },
}

/// Parse an import document into one create payload per record.
///
/// # Errors
///
/// Returns an error if the input is not JSON, or if it (or any array
/// element) is not an object. Nothing is created in that case.
pub fn parse_import(input: &str) -> Result<Vec<LessonPayload>, ImportError> {
    let document: Value = serde_json::from_str(input)?;
    let records = match document {
        Value::Array(records) => records,
        other => vec![other],
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .as_object()
                .map(payload_from_record)
                .ok_or(ImportError::NotAnObject { index })
        })
        .collect()
}

fn payload_from_record(record: &Map<String, Value>) -> LessonPayload {
    let string = |key: &str| record.get(key).and_then(Value::as_str);
    let raw_content = string("content");
    let derived_excerpt = text::excerpt_from_content(raw_content.unwrap_or_default());

    LessonPayload {
        title: string("title").unwrap_or(DEFAULT_TITLE).to_string(),
        content: raw_content.unwrap_or(DEFAULT_CONTENT).to_string(),
        featured_image: string("featured_image").unwrap_or_default().to_string(),
        status: string("status").map_or(LessonStatus::Draft, LessonStatus::parse_lenient),
        category_id: record.get("category_id").and_then(category_id),
        excerpt: string("excerpt").map_or_else(|| derived_excerpt.clone(), str::to_string),
        meta_description: string("meta_description")
            .map_or_else(|| text::meta_from_excerpt(&derived_excerpt), str::to_string),
        code_snippets: Vec::new(),
    }
}

fn category_id(value: &Value) -> Option<CategoryId> {
    match value {
        Value::Number(n) => n.as_i64().map(CategoryId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_array_yields_one_payload_per_record() {
        let payloads = parse_import(
            r##"[
                {"title": "One", "content": "# One\n\nBody", "status": "published"},
                {"title": "Two", "status": "live", "views_count": 99},
                {"content": "text", "category_id": "4"}
            ]"##,
        )
        .unwrap();

        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[0].status, LessonStatus::Published);
        assert_eq!(payloads[0].excerpt, "One Body");
        assert_eq!(payloads[1].status, LessonStatus::Draft);
        assert_eq!(payloads[1].content, DEFAULT_CONTENT);
        assert_eq!(payloads[2].title, DEFAULT_TITLE);
        assert_eq!(payloads[2].status, LessonStatus::Draft);
        assert_eq!(payloads[2].category_id, Some(CategoryId::new(4)));
    }

    #[test]
    fn test_single_object() {
        let payloads = parse_import(r#"{"title": "Solo", "excerpt": "Mine"}"#).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].excerpt, "Mine");
        assert_eq!(payloads[0].featured_image, "");
        assert!(payloads[0].category_id.is_none());
    }

    #[test]
    fn test_rejects_non_json_and_non_objects() {
        assert!(matches!(
            parse_import("not json"),
            Err(ImportError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_import(r#"[{"title": "ok"}, 3]"#),
            Err(ImportError::NotAnObject { index: 1 })
        ));
        assert!(matches!(
            parse_import(r#""a string""#),
            Err(ImportError::NotAnObject { index: 0 })
        ));
    }

    #[test]
    fn test_empty_array_is_nothing_to_import() {
        assert!(parse_import("[]").unwrap().is_empty());
    }
}
