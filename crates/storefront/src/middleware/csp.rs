//! Per-response script nonce.
//!
//! Only two inline scripts exist (carousel autoplay and the live cart
//! badge). [`security_headers_middleware`](super::security_headers_middleware)
//! mints the nonce, stores it on the request for handlers, and names it in
//! the `script-src` directive of the same response.

use axum::{extract::FromRequestParts, http::request::Parts};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Number of random bytes behind each nonce.
const NONCE_BYTES: usize = 16;

/// Base64 nonce shared by the CSP header and the page's `<script>` tags.
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut raw = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut raw);
        Self(STANDARD.encode(raw))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Reads the nonce left by the headers middleware.
///
/// Routers built without that middleware (handler tests) get a fresh nonce
/// stored back on the request, so every extraction in one request agrees.
impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(nonce) = parts.extensions.get::<Self>() {
            return Ok(nonce.clone());
        }
        tracing::debug!("No nonce on request; minting one for this handler");
        let nonce = Self::generate();
        parts.extensions.insert(nonce.clone());
        Ok(nonce)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique_and_sized() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(STANDARD.decode(a.value()).map(|v| v.len()).ok(), Some(NONCE_BYTES));
    }

    #[tokio::test]
    async fn test_extractor_reuses_nonce_within_request() {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();

        let first = CspNonce::from_request_parts(&mut parts, &()).await.unwrap();
        let second = CspNonce::from_request_parts(&mut parts, &()).await.unwrap();

        assert!(!first.value().is_empty());
        assert_eq!(first.value(), second.value());
    }
}
