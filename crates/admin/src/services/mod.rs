//! Business logic services for admin.
//!
//! # Services
//!
//! - `identity` - Sign-in state machine over the auth service
//! - `editor` - Per-admin lesson drafts with save, publish and autosave
//! - `lessons` - Toggle, delete, bulk actions, import and demo content

pub mod editor;
pub mod identity;
pub mod lessons;

pub use editor::{EditorError, EditorRegistry, EditorSession, EditorStatus};
pub use identity::{AuthEvent, Identity, IdentityState};
pub use lessons::{BatchOutcome, BulkAction};
