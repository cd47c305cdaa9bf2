//! Types stored in the server-side session.

pub mod session;

pub use session::keys as session_keys;
