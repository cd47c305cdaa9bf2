//! Clients for the hosted backend (table API + auth API).
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against a PostgREST-style table API and a
//!   GoTrue-style auth API; one HTTP request per operation
//! - The backend is the source of truth - NO local persistence
//! - Row-level security on the backend scopes cart rows to the bearer token;
//!   cart requests also filter on `user_id` explicitly
//! - Catalog listings are cached in memory via `moka`
//!
//! # APIs
//!
//! ## Table API (`/rest/v1`)
//! - `cart_items` - select/upsert/update/delete of cart lines
//! - `products` - catalog listing and search
//!
//! ## Auth API (`/auth/v1`)
//! - Password sign-in and sign-up, anonymous sign-in, token refresh, logout
//!
//! # Example
//!
//! ```rust,ignore
//! use shophub_storefront::remote::{CartRemote, RestCartRemote, RestClient};
//!
//! let client = RestClient::new(&config.supabase)?;
//! let session = AuthClient::new(client.clone()).sign_in_anonymously().await?;
//! let cart = RestCartRemote::new(client, &session);
//!
//! cart.upsert_line(&ProductId::new("p-1"), 2).await?;
//! let lines = cart.select_lines().await?;
//! ```

mod auth;
mod cart;
mod catalog;
mod client;

pub use auth::{AccessToken, AuthClient, AuthSession, SignUp};
pub use cart::{CART_SELECT, CartRemote, RestCartRemote};
pub use catalog::CatalogClient;
pub use client::RestClient;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
///
/// The `Display` output is what the cart store surfaces to views, so every
/// variant renders as a complete human-readable sentence fragment.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("could not reach the store backend: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Backend error code (SQLSTATE or auth error code), if any.
        code: Option<String>,
        /// Human-readable message.
        message: String,
    },

    /// The session's token was rejected.
    #[error("your session has expired, please sign in again")]
    Unauthorized,

    /// The response body did not match the expected shape.
    #[error("unexpected response from the store backend: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RemoteError {
    /// Build an error from a non-success status and its raw body.
    pub(crate) fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Self::Unauthorized;
        }

        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let code = parsed.as_ref().and_then(ErrorBody::code);
        let message = parsed
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                let snippet: String = body.chars().take(200).collect();
                if snippet.trim().is_empty() {
                    format!("request failed with HTTP {status}")
                } else {
                    format!("request failed with HTTP {status}: {snippet}")
                }
            });

        Self::Api {
            status: status.as_u16(),
            code,
            message,
        }
    }
}

/// Union of the error body shapes the table and auth APIs return.
///
/// Table API: `{"code","message","details","hint"}`.
/// Auth API: `{"code","error_code","msg"}` or `{"error","error_description"}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    error_code: Option<String>,
    code: Option<serde_json::Value>,
}

impl ErrorBody {
    fn code(&self) -> Option<String> {
        self.error_code.clone().or_else(|| match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    fn into_message(self) -> Option<String> {
        let base = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)?;

        Some(match (self.details, self.hint) {
            (Some(details), _) if !details.is_empty() => format!("{base} ({details})"),
            (_, Some(hint)) if !hint.is_empty() => format!("{base} (hint: {hint})"),
            _ => base,
        })
    }
}
