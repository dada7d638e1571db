//! Core types for ProgLearn.
//!
//! This module provides type-safe wrappers for domain concepts and the
//! records exchanged with the backend service.

pub mod category;
pub mod email;
pub mod id;
pub mod lesson;
pub mod media;
pub mod profile;
pub mod status;

pub use category::{Category, CategoryPayload};
pub use email::{Email, EmailError};
pub use id::*;
pub use lesson::{CategoryRef, CodeSnippet, Lesson, LessonPatch, LessonPayload};
pub use media::{MediaAsset, NewMedia, Uploader};
pub use profile::Profile;
pub use status::*;
