//! Shared HTTP plumbing for the hosted backend.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::RemoteError;
use super::auth::AccessToken;
use crate::config::SupabaseConfig;

/// Low-level client for the table and auth APIs.
///
/// Cheap to clone. Every request carries the project's public `apikey`;
/// the `Authorization` header carries the user's access token when one is
/// given, and the public key otherwise.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    http: reqwest::Client,
    rest_url: String,
    auth_url: String,
    anon_key: SecretString,
}

impl RestClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built
    /// (e.g., TLS backend initialization failure).
    pub fn new(config: &SupabaseConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shophub-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                http,
                rest_url: config.rest_url(),
                auth_url: config.auth_url(),
                anon_key: config.anon_key.clone(),
            }),
        })
    }

    /// Start a request against a table (`/rest/v1/{table}`).
    pub(crate) fn table(
        &self,
        method: Method,
        table: &str,
        token: Option<&AccessToken>,
    ) -> RequestBuilder {
        let url = format!("{}/{table}", self.inner.rest_url);
        self.authorized(self.inner.http.request(method, url), token)
    }

    /// Start a request against an auth endpoint (`/auth/v1/{path}`).
    pub(crate) fn auth(
        &self,
        method: Method,
        path: &str,
        token: Option<&AccessToken>,
    ) -> RequestBuilder {
        let url = format!("{}/{path}", self.inner.auth_url);
        self.authorized(self.inner.http.request(method, url), token)
    }

    fn authorized(&self, request: RequestBuilder, token: Option<&AccessToken>) -> RequestBuilder {
        let anon_key = self.inner.anon_key.expose_secret();
        let bearer = token.map_or(anon_key, AccessToken::expose);
        request
            .header("apikey", anon_key)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
    }

    /// Send a request and decode a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a body
    /// that does not decode as `T`.
    #[instrument(skip_all)]
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let body = self.execute_text(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            RemoteError::Parse(e)
        })
    }

    /// Send a request whose body is irrelevant.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub(crate) async fn execute_empty(&self, request: RequestBuilder) -> Result<(), RemoteError> {
        self.execute_text(request).await.map(|_| ())
    }

    async fn execute_text(&self, request: RequestBuilder) -> Result<String, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let err = RemoteError::from_response(status, &body);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    path = %url,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                tracing::warn!(status = %status, path = %url, error = %err, "Backend rejected request");
            }
            return Err(err);
        }

        debug!(status = %status, path = %url, bytes = body.len(), "Backend request succeeded");
        Ok(body)
    }

    /// Check that the table API answers at all.
    ///
    /// Used by the readiness probe; any HTTP response (even 4xx) counts as
    /// reachable, only transport failures do not.
    pub async fn ping(&self) -> bool {
        let request = self
            .authorized(self.inner.http.head(format!("{}/", self.inner.rest_url)), None);
        request.send().await.is_ok()
    }
}
