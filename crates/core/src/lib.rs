//! ProgLearn Core - Shared types and pure domain logic.
//!
//! This crate provides what every ProgLearn component agrees on:
//! - `storefront` - Public lesson browsing site
//! - `admin` - Lesson, category and media management panel
//! - `cli` - Bulk import and seeding tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. Anything time-dependent takes "now" or "today" as an
//! argument so it stays deterministic under test.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, statuses, and the lesson/category/media records
//! - [`dashboard`] - Statistics derived from an already-fetched lesson set
//! - [`editor`] - Lesson draft, markdown toolbar, list filtering, JSON import
//! - [`render`] - Markdown to HTML for lesson bodies and previews
//! - [`text`] - Word counts, reading time, excerpts, relative time

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod dashboard;
pub mod editor;
pub mod render;
pub mod text;
pub mod types;

pub use types::*;
