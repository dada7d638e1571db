//! Bulk lesson import from a JSON file.
//!
//! The file holds an array of lesson objects (or a single object). Missing
//! fields get the same defaults as a new lesson, and every entry is checked
//! before the first lesson is created.

use std::path::Path;

use proglearn_admin::services::lessons;
use proglearn_backend::LessonGateway;
use tracing::{info, warn};

/// Import every lesson in `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a valid import
/// document, or a create request fails part way. Lessons created before the
/// failure are kept.
pub async fn from_file<G>(gateway: &G, path: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    G: LessonGateway + ?Sized,
{
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading lessons from file");
    let document = tokio::fs::read_to_string(path).await?;

    let outcome = lessons::import(gateway, &document).await?;
    let summary = outcome.summary("Imported");
    match outcome.failed {
        None => {
            info!(created = outcome.applied, "{summary}");
            Ok(())
        }
        Some(err) => {
            warn!(created = outcome.applied, "Import stopped early");
            Err(err.into())
        }
    }
}
