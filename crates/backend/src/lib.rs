//! ProgLearn Backend - Client for the hosted backend service.
//!
//! The backend exposes three surfaces that every ProgLearn binary talks to:
//! - a REST table API (`/rest/v1`) for lessons, categories, media, profiles
//! - object storage (`/storage/v1`) for uploaded media
//! - an auth service (`/auth/v1`) issuing access and refresh tokens
//!
//! # Modules
//!
//! - [`client`] - Shared HTTP plumbing and the [`BackendClient`] handle
//! - [`auth`] - Password sign-in, token refresh, profile lookup
//! - [`gateway`] - Traits the admin services are written against
//! - [`error`] - Classified backend errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
mod categories;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
mod lessons;
mod media;

pub use auth::{AuthSession, AuthUser};
pub use client::BackendClient;
pub use config::{BackendConfig, ConfigError};
pub use error::{BackendError, ErrorKind};
pub use gateway::{AuthGateway, LessonGateway};
pub use media::Upload;
