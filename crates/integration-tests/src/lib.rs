//! Integration tests for ShopHub.
//!
//! Every test runs against a [`wiremock`] server standing in for the hosted
//! backend, so no network access or credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shophub-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_cart_remote` - Cart query shapes and the cart store over HTTP
//! - `storefront_auth` - Auth API calls and error mapping
//! - `storefront_http` - Full router: guest carts, login, badge count

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::MockServer;

use shophub_core::UserId;
use shophub_storefront::config::{StorefrontConfig, SupabaseConfig};
use shophub_storefront::remote::{AccessToken, AuthSession};

/// Public key every mocked request must carry.
pub const ANON_KEY: &str = "anon-key-for-tests";

/// Backend configuration pointing at `server`.
#[must_use]
pub fn supabase_config(server: &MockServer) -> SupabaseConfig {
    SupabaseConfig {
        url: Url::parse(&server.uri()).unwrap(),
        anon_key: SecretString::from(ANON_KEY),
        timeout: Duration::from_secs(5),
    }
}

/// Full storefront configuration pointing at `server`.
#[must_use]
pub fn storefront_config(server: &MockServer) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("kT9#mQ2$vL7!pX4@wR8^zN3&bH6*cJ5%"),
        supabase: supabase_config(server),
        catalog_cache_ttl: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A session for `user_id` whose token is `"{user_id}-jwt"`.
#[must_use]
pub fn session_for(user_id: &str) -> AuthSession {
    AuthSession {
        user_id: UserId::new(user_id),
        email: None,
        access_token: AccessToken::new(format!("{user_id}-jwt")),
        refresh_token: AccessToken::new(format!("{user_id}-refresh")),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

/// Token grant body as returned by the auth API.
#[must_use]
pub fn token_grant(user_id: &str, email: Option<&str>) -> Value {
    json!({
        "access_token": format!("{user_id}-jwt"),
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": format!("{user_id}-refresh"),
        "user": {
            "id": user_id,
            "email": email.unwrap_or(""),
            "is_anonymous": email.is_none(),
        }
    })
}

/// One `cart_items` row joined with its product, as the table API returns it.
#[must_use]
pub fn cart_row(id: &str, product_id: &str, quantity: u32, name: &str, price: f64) -> Value {
    json!({
        "id": id,
        "product_id": product_id,
        "quantity": quantity,
        "product": {
            "name": name,
            "price": price,
            "image_urls": [format!("https://images.unsplash.com/{product_id}")],
        }
    })
}
