//! Session cookie setup.
//!
//! The session body (auth tokens, guest id) stays server-side in a
//! [`MemoryStore`]; the browser only holds a signed id, so a restart signs
//! everyone out and guests start a fresh cart.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

pub const SESSION_COOKIE_NAME: &str = "shophub_session";

/// Idle time after which a shopper's session (and guest cart) is forgotten.
const IDLE_TIMEOUT: Duration = Duration::days(7);

/// Stretch the configured secret to the 64 bytes `Key` wants.
fn signing_key(secret: &SecretString) -> Key {
    Key::from(Sha512::digest(secret.expose_secret().as_bytes()).as_slice())
}

/// Session layer shared by the binary and the router tests.
///
/// `SameSite=Lax` keeps the cookie on top-level navigations back from the
/// login form; the `Secure` flag follows the configured base URL scheme.
#[must_use]
pub fn create_session_layer(
    config: &StorefrontConfig,
) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_path("/")
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(config.is_secure())
        .with_expiry(Expiry::OnInactivity(IDLE_TIMEOUT))
        .with_signed(signing_key(&config.session_secret))
}
