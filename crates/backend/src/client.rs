//! HTTP plumbing for the backend service.
//!
//! Every call carries the anonymous API key as `apikey`. The bearer token is
//! the signed-in user's access token when the client has been
//! [`authorized`](BackendClient::authorized), and the anonymous key
//! otherwise, so row-level policies see the right role.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendConfig;
use crate::error::BackendError;

/// Timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `Accept` value asking the table API for exactly one object.
pub(crate) const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Backend service client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
    access_token: Option<SecretString>,
}

struct BackendClientInner {
    http: Client,
    base_url: Url,
    anon_key: SecretString,
    media_bucket: String,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("media_bucket", &self.inner.media_bucket)
            .field("authorized", &self.access_token.is_some())
            .finish()
    }
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::transport(&e))?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                media_bucket: config.media_bucket.clone(),
            }),
            access_token: None,
        })
    }

    /// A clone of this client that acts as the user owning `access_token`.
    #[must_use]
    pub fn authorized(&self, access_token: SecretString) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            access_token: Some(access_token),
        }
    }

    /// A clone of this client that acts anonymously.
    #[must_use]
    pub fn anonymous(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            access_token: None,
        }
    }

    /// Whether requests are sent with a user token.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        self.access_token.is_some()
    }

    /// Storage bucket used for media uploads.
    #[must_use]
    pub fn media_bucket(&self) -> &str {
        &self.inner.media_bucket
    }

    /// Build a URL under the backend base from path segments.
    ///
    /// Segments are percent-encoded individually, so storage keys may
    /// contain any character.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// URL of a table endpoint with PostgREST query parameters.
    pub(crate) fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint(&["rest", "v1", table]);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    /// Start a request carrying the API key and the current bearer token.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_ref()
            .unwrap_or(&self.inner.anon_key)
            .expose_secret();

        self.inner
            .http
            .request(method, url)
            .header("apikey", self.inner.anon_key.expose_secret())
            .bearer_auth(bearer)
    }

    /// Start a request that always uses the anonymous key as bearer.
    pub(crate) fn anon_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.anonymous().request(method, url)
    }

    /// Send a request and turn non-success statuses into errors.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Backend request failed");
            BackendError::transport(&e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = BackendError::from_response(status, &body);
        debug!(
            status = status.as_u16(),
            code = ?error.code,
            kind = ?error.kind,
            "Backend returned an error"
        );
        Err(error)
    }

    /// Send a request and decode a JSON response body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(request.header(header::ACCEPT, "application/json")).await?;
        Self::decode(response).await
    }

    /// Send a request expecting exactly one JSON object back.
    pub(crate) async fn send_single<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(request.header(header::ACCEPT, SINGLE_OBJECT)).await?;
        Self::decode(response).await
    }

    /// Send a request and ignore any response body.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send(request).await.map(drop)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::transport(&e))?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::decode(status, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: Url::parse(base).unwrap(),
            anon_key: SecretString::from("anon"),
            media_bucket: "lesson-media".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let url = client("http://localhost:54321").table_url(
            "lessons",
            &[("select", "*,categories(name)"), ("id", "eq.4")],
        );
        assert_eq!(url.path(), "/rest/v1/lessons");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("select".to_string(), "*,categories(name)".to_string()));
        assert_eq!(pairs[1], ("id".to_string(), "eq.4".to_string()));
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_segments() {
        let url = client("https://example.test/proxy/").endpoint(&["storage", "v1", "a b.png"]);
        assert_eq!(url.as_str(), "https://example.test/proxy/storage/v1/a%20b.png");
    }

    #[test]
    fn test_authorized_clone_shares_config() {
        let anon = client("http://localhost:54321");
        let user = anon.authorized(SecretString::from("token"));
        assert!(!anon.is_authorized());
        assert!(user.is_authorized());
        assert!(!user.anonymous().is_authorized());
        assert_eq!(user.media_bucket(), "lesson-media");
        assert!(!format!("{user:?}").contains("token\""));
    }
}
