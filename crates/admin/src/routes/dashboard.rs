//! Dashboard route handler.

use askama::Template;
use axum::response::Response;
use chrono::Utc;
use proglearn_core::dashboard::DashboardStats;
use proglearn_core::text::{relative_time, truncate};
use tracing::instrument;

use super::{AdminUserView, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::Flash;
use crate::services::lessons;

/// Width and height of the daily views chart, in SVG units.
const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 160.0;

/// Recently published lesson row.
#[derive(Debug, Clone)]
pub struct RecentLessonView {
    pub id: i64,
    pub title: String,
    pub views: u64,
    pub published: String,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub stats: DashboardStats,
    pub most_viewed_title: Option<String>,
    pub recent: Vec<RecentLessonView>,
    pub series_points: String,
    pub chart_width: f64,
    pub chart_height: f64,
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip(admin))]
pub async fn dashboard(RequireAdminAuth(admin): RequireAdminAuth) -> Result<Response> {
    let (lessons, categories) = lessons::load(admin.client.as_ref()).await?;
    let now = Utc::now();
    let stats = DashboardStats::compute(&lessons, &categories, now.date_naive());

    let recent = stats
        .recent_published
        .iter()
        .map(|lesson| RecentLessonView {
            id: lesson.id.as_i64(),
            title: truncate(&lesson.title, 60),
            views: lesson.views_count,
            published: relative_time(lesson.last_activity(), now),
        })
        .collect();

    let template = DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash: take_flash(&admin.session).await,
        most_viewed_title: stats.most_viewed.as_ref().map(|l| truncate(&l.title, 60)),
        series_points: stats.series_polyline(CHART_WIDTH, CHART_HEIGHT),
        recent,
        stats,
        chart_width: CHART_WIDTH,
        chart_height: CHART_HEIGHT,
    };

    Ok(render(&template))
}
