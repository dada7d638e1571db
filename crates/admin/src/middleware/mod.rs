//! HTTP middleware and extractors for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, request transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with an in-memory store)
//!
//! Admin-only routes take the [`RequireAdminAuth`] extractor, which resolves
//! the identity stored in the session and refreshes its token.

pub mod auth;
pub mod session;

pub use auth::{AdminContext, AdminAuthRejection, RequireAdminAuth};
pub use session::{SESSION_EXPIRY, create_session_layer, load_identity, set_flash, store_identity, take_flash};
