//! Media library route handlers.

use askama::Template;
use axum::{
    Router,
    extract::{Multipart, Path, State},
    response::Response,
    routing::{get, post},
};
use chrono::Utc;
use proglearn_backend::Upload;
use proglearn_core::text::relative_time;
use proglearn_core::{MediaAsset, MediaId};
use tracing::instrument;

use super::{AdminUserView, redirect_with, render};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::Flash;
use crate::state::AppState;

const LIST_PATH: &str = "/media";

/// Media row.
#[derive(Debug, Clone)]
pub struct MediaView {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub is_image: bool,
    pub uploader: String,
    pub uploaded: String,
}

impl MediaView {
    fn new(asset: &MediaAsset, now: chrono::DateTime<Utc>) -> Self {
        Self {
            id: asset.id.as_i64(),
            filename: asset.filename.clone(),
            url: asset.url.clone(),
            is_image: asset.is_image(),
            uploader: asset.uploader_name().unwrap_or("Unknown").to_string(),
            uploaded: relative_time(asset.created_at, now),
        }
    }
}

/// Media library template.
#[derive(Template)]
#[template(path = "media/index.html")]
pub struct MediaTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub media: Vec<MediaView>,
    pub max_upload_mb: usize,
}

/// Build the media router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(index).post(upload))
        .route("/media/{id}/delete", post(delete))
}

/// Media library.
///
/// GET /media
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Response> {
    let media = admin.client.list_media().await?;
    let now = Utc::now();

    let template = MediaTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH.to_string(),
        flash: take_flash(&admin.session).await,
        media: media.iter().map(|asset| MediaView::new(asset, now)).collect(),
        max_upload_mb: state.config().max_upload_bytes / (1024 * 1024),
    };

    Ok(render(&template))
}

/// Upload a file.
///
/// POST /media
#[instrument(skip(admin, multipart))]
pub async fn upload(
    RequireAdminAuth(admin): RequireAdminAuth,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut received = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().trim().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        received = Some(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let Some(upload) = received.filter(|u| !u.file_name.is_empty() && !u.bytes.is_empty()) else {
        return Ok(redirect_with(&admin, LIST_PATH, Flash::error("Choose a file to upload.")).await);
    };

    let flash = match admin.client.upload_media(upload, Some(admin.user_id)).await {
        Ok(asset) => Flash::success(format!("Uploaded {}.", asset.filename)),
        Err(err) => Flash::error(err.message),
    };
    Ok(redirect_with(&admin, LIST_PATH, flash).await)
}

/// Delete a file and its record.
///
/// POST /media/{id}/delete
#[instrument(skip(admin))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<MediaId>,
) -> Result<Response> {
    let media = admin.client.list_media().await?;
    let Some(asset) = media.iter().find(|asset| asset.id == id) else {
        return Err(AppError::NotFound(format!("media {id}")));
    };

    let flash = match admin.client.delete_media(id, &asset.filename).await {
        Ok(()) => Flash::success(format!("Deleted {}.", asset.filename)),
        Err(err) => Flash::error(err.message),
    };
    Ok(redirect_with(&admin, LIST_PATH, flash).await)
}
