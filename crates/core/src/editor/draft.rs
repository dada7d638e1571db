//! The in-memory lesson draft behind the admin editor.

use serde::{Deserialize, Serialize};

use crate::text;
use crate::types::{CategoryId, Lesson, LessonPayload, LessonStatus};

use super::markdown::{Edit, MarkdownAction, TextSelection};

/// Content a fresh draft starts with.
pub const NEW_LESSON_CONTENT: &str = "## New Lesson\n\nStart writing your lesson content here.\n\n```c\n#include <stdio.h>\n\nint main() {\n  printf(\"Hello, ProgLearn!\\n\");\n  return 0;\n}\n```";

/// Suffix appended to the title of a duplicated lesson.
pub const COPY_SUFFIX: &str = " (Copy)";

/// Errors raised before a draft is sent to the backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Title and content are required.")]
    MissingTitleOrContent,
}

/// Editable fields of a lesson.
///
/// Empty strings mean "not set"; `excerpt` and `meta_description` fall back
/// to values derived from the content when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDraft {
    pub title: String,
    pub content: String,
    pub featured_image: String,
    pub category_id: Option<CategoryId>,
    pub status: LessonStatus,
    pub excerpt: String,
    pub meta_description: String,
}

impl Default for LessonDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: NEW_LESSON_CONTENT.to_string(),
            featured_image: String::new(),
            category_id: None,
            status: LessonStatus::Draft,
            excerpt: String::new(),
            meta_description: String::new(),
        }
    }
}

impl LessonDraft {
    /// Load an existing lesson into the editor.
    #[must_use]
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            title: lesson.title.clone(),
            content: lesson.content.clone(),
            featured_image: lesson.featured_image.clone().unwrap_or_default(),
            category_id: lesson.category_id,
            status: lesson.status,
            excerpt: lesson.excerpt.clone().unwrap_or_default(),
            meta_description: lesson.meta_description.clone().unwrap_or_default(),
        }
    }

    /// A draft copy of `lesson`, titled "<title> (Copy)".
    #[must_use]
    pub fn duplicate_of(lesson: &Lesson) -> Self {
        Self {
            title: format!("{}{COPY_SUFFIX}", lesson.title),
            status: LessonStatus::Draft,
            ..Self::from_lesson(lesson)
        }
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        text::word_count(&self.content)
    }

    #[must_use]
    pub fn reading_time_minutes(&self) -> u32 {
        text::reading_time_minutes(&self.content)
    }

    /// The manual excerpt, or one derived from the content.
    #[must_use]
    pub fn effective_excerpt(&self) -> String {
        if self.excerpt.is_empty() {
            text::excerpt_from_content(&self.content)
        } else {
            text::take_chars(&self.excerpt, text::EXCERPT_MAX_CHARS)
        }
    }

    /// The manual meta description, or the first 160 characters of the
    /// effective excerpt.
    #[must_use]
    pub fn effective_meta_description(&self) -> String {
        let meta = if self.meta_description.is_empty() {
            self.effective_excerpt()
        } else {
            self.meta_description.clone()
        };
        text::meta_from_excerpt(&meta)
    }

    /// Whether a save may be attempted at all.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MissingTitleOrContent`] if either is blank.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(DraftError::MissingTitleOrContent);
        }
        Ok(())
    }

    /// Whether the draft has a title, the precondition for autosave.
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Body to send when saving the draft with `status`.
    #[must_use]
    pub fn to_payload(&self, status: LessonStatus) -> LessonPayload {
        LessonPayload {
            title: self.title.clone(),
            content: self.content.clone(),
            featured_image: self.featured_image.clone(),
            status,
            category_id: self.category_id,
            excerpt: self.effective_excerpt(),
            meta_description: self.effective_meta_description(),
            code_snippets: Vec::new(),
        }
    }

    /// Apply a formatting action to the content at `selection`.
    pub fn format(&mut self, action: &MarkdownAction, selection: TextSelection) -> TextSelection {
        let Edit { content, selection } = action.apply(&self.content, selection);
        self.content = content;
        selection
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::LessonId;
    use chrono::Utc;

    fn lesson() -> Lesson {
        Lesson {
            id: LessonId::new(4),
            title: "Arrays".to_string(),
            content: "# Arrays\n\nContiguous memory.".to_string(),
            featured_image: Some("https://img.example/a.png".to_string()),
            status: LessonStatus::Published,
            category_id: Some(CategoryId::new(2)),
            category: None,
            views_count: 10,
            created_at: Utc::now(),
            updated_at: None,
            excerpt: None,
            meta_description: Some("Meta".to_string()),
            code_snippets: Vec::new(),
        }
    }

    #[test]
    fn test_default_is_new_lesson_template() {
        let draft = LessonDraft::default();
        assert!(draft.title.is_empty());
        assert!(draft.content.starts_with("## New Lesson"));
        assert!(draft.content.contains("printf(\"Hello, ProgLearn!\\n\");"));
        assert_eq!(draft.status, LessonStatus::Draft);
        assert!(!draft.has_title());
    }

    #[test]
    fn test_duplicate_is_untracked_draft_copy() {
        let draft = LessonDraft::duplicate_of(&lesson());
        assert_eq!(draft.title, "Arrays (Copy)");
        assert_eq!(draft.status, LessonStatus::Draft);
        assert_eq!(draft.category_id, Some(CategoryId::new(2)));
        assert_eq!(draft.featured_image, "https://img.example/a.png");
    }

    #[test]
    fn test_validate_requires_title_and_content() {
        let mut draft = LessonDraft::default();
        assert_eq!(draft.validate(), Err(DraftError::MissingTitleOrContent));

        draft.title = "Loops".to_string();
        assert!(draft.validate().is_ok());

        draft.content = "  \n ".to_string();
        assert_eq!(draft.validate(), Err(DraftError::MissingTitleOrContent));
    }

    #[test]
    fn test_payload_derives_excerpt_and_meta() {
        let mut draft = LessonDraft::from_lesson(&lesson());
        draft.meta_description.clear();
        let payload = draft.to_payload(LessonStatus::Published);

        assert_eq!(payload.excerpt, "Arrays Contiguous memory.");
        assert_eq!(payload.meta_description, payload.excerpt);
        assert_eq!(payload.status, LessonStatus::Published);
        assert!(payload.code_snippets.is_empty());
    }

    #[test]
    fn test_manual_meta_wins() {
        let draft = LessonDraft::from_lesson(&lesson());
        assert_eq!(draft.effective_meta_description(), "Meta");
    }

    #[test]
    fn test_reading_time_and_word_count() {
        let draft = LessonDraft {
            content: "word ".repeat(450),
            ..LessonDraft::default()
        };
        assert_eq!(draft.word_count(), 450);
        assert_eq!(draft.reading_time_minutes(), 3);
    }

    #[test]
    fn test_format_updates_content() {
        let mut draft = LessonDraft {
            content: "hello world".to_string(),
            ..LessonDraft::default()
        };
        let selection = draft.format(&MarkdownAction::Bold, TextSelection::new(0, 5));
        assert_eq!(draft.content, "**hello** world");
        assert_eq!(selection, TextSelection::new(2, 7));
    }
}
