//! Types stored in the admin session.

pub mod session;

pub use session::{Flash, FlashLevel};
pub use session::keys as session_keys;
