//! Lesson editor logic that does not touch the network.
//!
//! The admin binary wraps these in a per-user session with save, publish
//! and autosave; everything here is plain data in, data out.

pub mod demo;
pub mod draft;
pub mod import;
pub mod listing;
pub mod markdown;

pub use demo::demo_lesson;
pub use draft::{DraftError, LessonDraft};
pub use import::{ImportError, parse_import};
pub use listing::{LessonPage, LessonQuery, PAGE_SIZE, SortOrder};
pub use markdown::{Edit, MarkdownAction, Shortcut, TextSelection};
