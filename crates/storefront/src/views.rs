//! Display data for templates.

use chrono::{DateTime, Utc};
use proglearn_core::text::{excerpt_from_content, relative_time, truncate};
use proglearn_core::{Category, Lesson};

/// Longest title shown on a lesson card.
const CARD_TITLE_CHARS: usize = 80;

/// A lesson in a listing.
#[derive(Debug, Clone)]
pub struct LessonCard {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<&'static str>,
    pub views: u64,
    pub reading_minutes: u32,
    pub updated: String,
}

impl LessonCard {
    #[must_use]
    pub fn new(lesson: &Lesson, now: DateTime<Utc>) -> Self {
        Self {
            id: lesson.id.as_i64(),
            title: truncate(&lesson.title, CARD_TITLE_CHARS),
            excerpt: lesson
                .excerpt
                .clone()
                .unwrap_or_else(|| excerpt_from_content(&lesson.content)),
            featured_image: lesson.featured_image.clone(),
            category: lesson.category_name().map(str::to_string),
            difficulty: lesson.category.as_ref().map(|c| c.difficulty.label()),
            views: lesson.views_count,
            reading_minutes: lesson.reading_time_minutes(),
            updated: relative_time(lesson.last_activity(), now),
        }
    }

    /// Cards for a list of borrowed lessons.
    #[must_use]
    pub fn many<'a>(lessons: impl IntoIterator<Item = &'a Lesson>, now: DateTime<Utc>) -> Vec<Self> {
        lessons.into_iter().map(|l| Self::new(l, now)).collect()
    }
}

/// A category with its published lesson count.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub difficulty: &'static str,
    pub lesson_count: u64,
    /// "1 lesson", "4 lessons"
    pub count_label: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.as_i64(),
            name: category.name.clone(),
            difficulty: category.difficulty.label(),
            lesson_count: category.lesson_count,
            count_label: match category.lesson_count {
                1 => "1 lesson".to_string(),
                n => format!("{n} lessons"),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proglearn_core::{CategoryRef, Difficulty, LessonId, LessonStatus};

    fn lesson() -> Lesson {
        let created = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        Lesson {
            id: LessonId::new(7),
            title: "Pointers in C".to_string(),
            content: "## Pointers\n\nA pointer *stores* an address.".to_string(),
            featured_image: None,
            status: LessonStatus::Published,
            category_id: None,
            category: Some(CategoryRef {
                name: "C".to_string(),
                difficulty: Difficulty::Intermediate,
            }),
            views_count: 42,
            created_at: created,
            updated_at: Some(created + Duration::hours(2)),
            excerpt: None,
            meta_description: None,
            code_snippets: Vec::new(),
        }
    }

    #[test]
    fn test_card_derives_excerpt_and_age() {
        let lesson = lesson();
        let now = lesson.updated_at.unwrap() + Duration::hours(3);
        let card = LessonCard::new(&lesson, now);

        assert_eq!(card.id, 7);
        assert_eq!(card.excerpt, "Pointers A pointer stores an address.");
        assert_eq!(card.category.as_deref(), Some("C"));
        assert_eq!(card.difficulty, Some("Intermediate"));
        assert_eq!(card.updated, "3 hours ago");
        assert_eq!(card.reading_minutes, 1);
    }

    #[test]
    fn test_category_count_label() {
        let mut category = Category {
            id: proglearn_core::CategoryId::new(1),
            name: "Rust".to_string(),
            difficulty: Difficulty::Advanced,
            lesson_count: 1,
        };
        assert_eq!(CategoryView::from(&category).count_label, "1 lesson");
        category.lesson_count = 0;
        assert_eq!(CategoryView::from(&category).count_label, "0 lessons");
    }

    #[test]
    fn test_card_prefers_manual_excerpt() {
        let mut lesson = lesson();
        lesson.excerpt = Some("Hand written".to_string());
        let card = LessonCard::new(&lesson, Utc::now());
        assert_eq!(card.excerpt, "Hand written");
    }
}
