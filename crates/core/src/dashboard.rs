//! Admin dashboard statistics.
//!
//! Everything here is derived from the full lesson and category collections
//! in one pass-friendly, side-effect-free computation. The caller supplies
//! `today` so the 30-day series is deterministic.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};

use crate::types::{Category, CategoryId, Lesson, LessonId, LessonStatus};

/// Palette for the category histogram, assigned in first-seen order.
pub const PIE_COLORS: [&str; 8] = [
    "#4f46e5", "#06b6d4", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#14b8a6", "#f97316",
];

/// Bucket name for lessons without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Number of points in the daily views series.
pub const SERIES_DAYS: usize = 30;

/// Number of lessons in the top-viewed chart.
pub const TOP_LESSONS: usize = 10;

/// Number of lessons in the recently published list.
pub const RECENT_PUBLISHED: usize = 5;

/// Smallest rendered width of a top-lesson bar, in percent.
pub const MIN_TOP_BAR_WIDTH: f64 = 5.0;

/// Smallest rendered width of a non-empty status bar, in percent.
pub const MIN_STATUS_BAR_WIDTH: u32 = 6;

const STATUS_BAR_ORDER: [LessonStatus; 3] = [
    LessonStatus::Published,
    LessonStatus::Draft,
    LessonStatus::Archived,
];

/// Lesson counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub published: usize,
    pub draft: usize,
    pub archived: usize,
}

impl StatusBreakdown {
    /// Count for a single status.
    #[must_use]
    pub const fn count(&self, status: LessonStatus) -> usize {
        match status {
            LessonStatus::Published => self.published,
            LessonStatus::Draft => self.draft,
            LessonStatus::Archived => self.archived,
        }
    }

    /// Sum over all statuses.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.published + self.draft + self.archived
    }

    fn record(&mut self, status: LessonStatus) {
        match status {
            LessonStatus::Published => self.published += 1,
            LessonStatus::Draft => self.draft += 1,
            LessonStatus::Archived => self.archived += 1,
        }
    }
}

/// One slice of the category histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBucket {
    pub name: String,
    pub count: usize,
    pub percent: u32,
    pub color: &'static str,
}

/// One row of the top-viewed chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLesson {
    pub id: LessonId,
    pub title: String,
    pub views: u64,
    /// Width relative to the most viewed lesson, 0-100.
    pub width: f64,
}

impl TopLesson {
    /// Width to render, clamped so small bars stay visible.
    #[must_use]
    pub fn display_width(&self) -> f64 {
        self.width.max(MIN_TOP_BAR_WIDTH)
    }
}

/// Views attributed to one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyViews {
    pub date: NaiveDate,
    pub views: u64,
}

/// One bar of the status chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBar {
    pub status: LessonStatus,
    pub count: usize,
    pub percent: u32,
    /// Rendered width in percent.
    pub width: u32,
}

/// Everything the dashboard page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub breakdown: StatusBreakdown,
    pub total_lessons: usize,
    pub total_categories: usize,
    pub total_views: u64,
    pub most_viewed: Option<Lesson>,
    pub categories: Vec<CategoryBucket>,
    pub top_lessons: Vec<TopLesson>,
    pub views_by_day: Vec<DailyViews>,
    pub recent_published: Vec<Lesson>,
    pub published_ratio: u32,
    pub draft_ratio: u32,
    pub status_bars: Vec<StatusBar>,
}

impl DashboardStats {
    /// Compute the dashboard from the current collections.
    #[must_use]
    pub fn compute(lessons: &[Lesson], categories: &[Category], today: NaiveDate) -> Self {
        let total_lessons = lessons.len();

        let mut breakdown = StatusBreakdown::default();
        for lesson in lessons {
            breakdown.record(lesson.status);
        }

        let status_bars = STATUS_BAR_ORDER
            .into_iter()
            .map(|status| {
                let count = breakdown.count(status);
                let percent = percent(count, total_lessons);
                let width = if count > 0 {
                    percent.max(MIN_STATUS_BAR_WIDTH)
                } else {
                    percent
                };
                StatusBar {
                    status,
                    count,
                    percent,
                    width,
                }
            })
            .collect();

        Self {
            breakdown,
            total_lessons,
            total_categories: categories.len(),
            total_views: lessons.iter().map(|l| l.views_count).sum(),
            most_viewed: most_viewed(lessons).cloned(),
            categories: category_buckets(lessons, categories),
            top_lessons: top_lessons(lessons),
            views_by_day: views_by_day(lessons, today),
            recent_published: recent_published(lessons),
            published_ratio: percent(breakdown.published, total_lessons),
            draft_ratio: percent(breakdown.draft, total_lessons),
            status_bars,
        }
    }

    /// True when there are no lessons at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_lessons == 0
    }

    /// Largest value in the daily series, never less than one.
    #[must_use]
    pub fn series_max(&self) -> u64 {
        self.views_by_day
            .iter()
            .map(|point| point.views)
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// SVG `points` attribute for the daily series in a `width` x `height`
    /// box, y growing downwards.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn series_polyline(&self, width: f64, height: f64) -> String {
        let max = self.series_max() as f64;
        let steps = self.views_by_day.len().saturating_sub(1).max(1) as f64;

        self.views_by_day
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let x = i as f64 / steps * width;
                let y = height - point.views as f64 / max * height;
                format!("{x:.1},{y:.1}")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Rounded percentage of `part` in `total`, 0 when `total` is 0.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

fn most_viewed(lessons: &[Lesson]) -> Option<&Lesson> {
    lessons.iter().fold(None, |best, lesson| match best {
        Some(current) if current.views_count >= lesson.views_count => Some(current),
        _ => Some(lesson),
    })
}

fn category_buckets(lessons: &[Lesson], categories: &[Category]) -> Vec<CategoryBucket> {
    let names: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for lesson in lessons {
        let name = lesson
            .category_name()
            .or_else(|| lesson.category_id.and_then(|id| names.get(&id).copied()))
            .unwrap_or(UNCATEGORIZED);
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    let mut buckets: Vec<CategoryBucket> = order
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let count = counts.get(name).copied().unwrap_or(0);
            CategoryBucket {
                name: name.to_string(),
                count,
                percent: percent(count, lessons.len()),
                color: PIE_COLORS[index % PIE_COLORS.len()],
            }
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

#[allow(clippy::cast_precision_loss)]
fn top_lessons(lessons: &[Lesson]) -> Vec<TopLesson> {
    let mut sorted: Vec<&Lesson> = lessons.iter().collect();
    sorted.sort_by(|a, b| b.views_count.cmp(&a.views_count));
    sorted.truncate(TOP_LESSONS);

    let max = sorted.first().map_or(0, |l| l.views_count);
    sorted
        .into_iter()
        .map(|lesson| TopLesson {
            id: lesson.id,
            title: lesson.title.clone(),
            views: lesson.views_count,
            width: if max == 0 {
                0.0
            } else {
                lesson.views_count as f64 / max as f64 * 100.0
            },
        })
        .collect()
}

fn views_by_day(lessons: &[Lesson], today: NaiveDate) -> Vec<DailyViews> {
    let start = today
        .checked_sub_days(Days::new(SERIES_DAYS as u64 - 1))
        .unwrap_or(today);

    let mut series: Vec<DailyViews> = start
        .iter_days()
        .take(SERIES_DAYS)
        .map(|date| DailyViews { date, views: 0 })
        .collect();

    for lesson in lessons {
        let date = lesson.last_activity().date_naive();
        if let Some(point) = series.iter_mut().find(|point| point.date == date) {
            point.views += lesson.views_count;
        }
    }
    series
}

fn recent_published(lessons: &[Lesson]) -> Vec<Lesson> {
    let mut published: Vec<&Lesson> = lessons.iter().filter(|l| l.is_published()).collect();
    published.sort_by_key(|l| std::cmp::Reverse(l.last_activity()));
    published
        .into_iter()
        .take(RECENT_PUBLISHED)
        .cloned()
        .collect()
}
