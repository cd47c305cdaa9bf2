//! Session-related types.
//!
//! The signed-in user's [`AuthSession`](crate::remote::AuthSession) (tokens
//! included) lives in the server-side session store; the browser only holds
//! the opaque session cookie.

/// Session keys.
pub mod keys {
    /// Key for the current user's auth session (tokens + identity).
    pub const AUTH_SESSION: &str = "auth_session";
}
