//! Application state shared across handlers.

use std::sync::Arc;

use proglearn_backend::{BackendClient, BackendError};

use crate::config::AdminConfig;
use crate::middleware::SESSION_EXPIRY;
use crate::services::EditorRegistry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: BackendClient,
    editors: Arc<EditorRegistry<BackendClient>>,
}

impl AppState {
    /// Build the state, creating the anonymous backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                editors: Arc::new(EditorRegistry::with_idle_timeout(SESSION_EXPIRY)),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Anonymous backend client; handlers act through an authorized clone.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Open lesson editors, one per signed-in admin.
    #[must_use]
    pub fn editors(&self) -> &Arc<EditorRegistry<BackendClient>> {
        &self.inner.editors
    }
}
