//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (mints the script nonce; CSP, frame and referrer policy)
//! 5. Session layer (tower-sessions, in-memory store, signed cookie)
//! 6. Rate limiting on auth and cart mutation routes (governor)
//!
//! Extractors in [`auth`] run inside handlers and resolve the signed-in
//! user and their cart store.

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{CartContext, OptionalAuth, clear_auth_session, current_auth, set_auth_session};
pub use csp::CspNonce;
pub use rate_limit::{auth_rate_limiter, cart_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
