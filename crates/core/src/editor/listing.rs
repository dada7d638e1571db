//! Lesson list filtering, sorting and pagination.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Lesson, LessonId, LessonStatus};

/// Lessons per page in the admin table.
pub const PAGE_SIZE: usize = 20;

/// Number of related lessons shown under a lesson.
pub const RELATED_LIMIT: usize = 3;

/// Number of popular lessons shown on the home page.
pub const POPULAR_LIMIT: usize = 6;

/// Sort orders offered by the admin table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently updated (or created) first.
    #[default]
    Newest,
    /// Oldest creation date first.
    Oldest,
    /// Most views first.
    Views,
    /// Title A-Z.
    Title,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [Self::Newest, Self::Oldest, Self::Views, Self::Title];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Views => "views",
            Self::Title => "title",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::Oldest => "Oldest",
            Self::Views => "Most views",
            Self::Title => "Title A-Z",
        }
    }

    fn compare(self, a: &Lesson, b: &Lesson) -> Ordering {
        match self {
            Self::Newest => b.last_activity().cmp(&a.last_activity()),
            Self::Oldest => a.created_at.cmp(&b.created_at),
            Self::Views => b.views_count.cmp(&a.views_count),
            Self::Title => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| format!("invalid sort order: {s}"))
    }
}

/// Admin table filters. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonQuery {
    pub search: String,
    pub status: Option<LessonStatus>,
    pub category: Option<CategoryId>,
    pub sort: SortOrder,
    /// One-based page number; clamped when applied.
    pub page: usize,
}

impl LessonQuery {
    fn matches(&self, lesson: &Lesson, needle: &str) -> bool {
        let matches_search = needle.is_empty()
            || lesson.title.to_lowercase().contains(needle)
            || lesson.content.to_lowercase().contains(needle);
        let matches_status = self.status.is_none_or(|status| lesson.status == status);
        let matches_category = self
            .category
            .is_none_or(|category| lesson.category_id == Some(category));
        matches_search && matches_status && matches_category
    }

    /// All lessons matching the filters, sorted.
    #[must_use]
    pub fn filter<'a>(&self, lessons: &'a [Lesson]) -> Vec<&'a Lesson> {
        let needle = self.search.trim().to_lowercase();
        let mut matches: Vec<&Lesson> = lessons
            .iter()
            .filter(|lesson| self.matches(lesson, &needle))
            .collect();
        matches.sort_by(|a, b| self.sort.compare(a, b));
        matches
    }

    /// The requested page of matching lessons.
    #[must_use]
    pub fn page<'a>(&self, lessons: &'a [Lesson]) -> LessonPage<'a> {
        LessonPage::new(self.filter(lessons), self.page)
    }
}

/// One page of the admin table.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonPage<'a> {
    pub items: Vec<&'a Lesson>,
    /// One-based, always within `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
}

impl<'a> LessonPage<'a> {
    fn new(matches: Vec<&'a Lesson>, requested_page: usize) -> Self {
        let total_matches = matches.len();
        let total_pages = total_matches.div_ceil(PAGE_SIZE).max(1);
        let page = requested_page.clamp(1, total_pages);
        let items = matches
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect();

        Self {
            items,
            page,
            total_pages,
            total_matches,
        }
    }

    /// One-based index of the first row shown, 0 when the page is empty.
    #[must_use]
    pub fn first_index(&self) -> usize {
        let offset = (self.page - 1) * PAGE_SIZE;
        if self.items.is_empty() {
            offset
        } else {
            offset + 1
        }
    }

    /// One-based index of the last row shown.
    #[must_use]
    pub fn last_index(&self) -> usize {
        (self.page - 1) * PAGE_SIZE + self.items.len()
    }

    /// "Showing a-b of n lessons".
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Showing {}-{} of {} lessons",
            self.first_index(),
            self.last_index(),
            self.total_matches
        )
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Ids of every lesson on the page, for "select all".
    #[must_use]
    pub fn ids(&self) -> Vec<LessonId> {
        self.items.iter().map(|lesson| lesson.id).collect()
    }

    /// Restrict a requested selection to lessons visible on this page,
    /// dropping duplicates and keeping the requested order.
    #[must_use]
    pub fn visible_selection(&self, requested: &[LessonId]) -> Vec<LessonId> {
        let visible = self.ids();
        let mut selection = Vec::with_capacity(requested.len());
        for id in requested {
            if visible.contains(id) && !selection.contains(id) {
                selection.push(*id);
            }
        }
        selection
    }
}

/// Parse a comma-separated id list as posted by the bulk-action form.
/// Blank and unparsable entries are skipped.
#[must_use]
pub fn parse_id_list(raw: &str) -> Vec<LessonId> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

/// Public list filter: case-insensitive title search plus an optional
/// category name.
#[must_use]
pub fn public_filter<'a>(
    lessons: &'a [Lesson],
    search: &str,
    category: Option<&str>,
) -> Vec<&'a Lesson> {
    let needle = search.trim().to_lowercase();
    lessons
        .iter()
        .filter(|lesson| needle.is_empty() || lesson.title.to_lowercase().contains(&needle))
        .filter(|lesson| category.is_none_or(|name| lesson.category_name() == Some(name)))
        .collect()
}

/// Distinct category names of `lessons`, in first-seen order.
#[must_use]
pub fn category_names(lessons: &[Lesson]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in lessons.iter().filter_map(Lesson::category_name) {
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Up to three other lessons sharing `lesson`'s category.
#[must_use]
pub fn related_lessons<'a>(lesson: &Lesson, candidates: &'a [Lesson]) -> Vec<&'a Lesson> {
    candidates
        .iter()
        .filter(|other| other.id != lesson.id && other.category_name() == lesson.category_name())
        .take(RELATED_LIMIT)
        .collect()
}

/// The most viewed lessons, ties keeping their original order.
#[must_use]
pub fn popular_lessons(lessons: &[Lesson]) -> Vec<&Lesson> {
    let mut sorted: Vec<&Lesson> = lessons.iter().collect();
    sorted.sort_by(|a, b| b.views_count.cmp(&a.views_count));
    sorted.truncate(POPULAR_LIMIT);
    sorted
}
