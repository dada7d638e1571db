//! Seed the backend with sample content.

use proglearn_admin::services::lessons;
use proglearn_backend::LessonGateway;
use tracing::info;

/// Create the demo C lesson.
///
/// # Errors
///
/// Returns an error if the backend rejects the create.
pub async fn demo<G>(gateway: &G) -> Result<(), Box<dyn std::error::Error>>
where
    G: LessonGateway + ?Sized,
{
    let lesson = lessons::create_demo(gateway).await?;
    info!(id = %lesson.id, title = %lesson.title, "Demo lesson created");
    Ok(())
}
