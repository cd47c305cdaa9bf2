//! Authentication extractors.
//!
//! The signed-in user (or guest) lives in the server-side session as an
//! [`AuthSession`]. Extractors here load it, refresh expiring tokens, and for
//! cart routes create a guest user on first use so every cart has an owner.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use tower_sessions::Session;

use crate::cart::CartStore;
use crate::error::{AppError, set_sentry_user};
use crate::models::session_keys;
use crate::remote::AuthSession;
use crate::state::AppState;

/// Extractor that optionally gets the current user (registered or guest).
///
/// Never rejects; a broken session reads as signed out.
pub struct OptionalAuth(pub Option<AuthSession>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self(None));
        };

        let auth = current_auth(&session, state).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read auth session");
            None
        });
        Ok(Self(auth))
    }
}

/// Everything a cart handler needs: the owner and their cart store.
///
/// Visitors without a session are signed in as guests first, so adding to
/// the cart works before registering.
pub struct CartContext {
    pub auth: AuthSession,
    pub store: Arc<CartStore>,
}

impl FromRequestParts<AppState> for CartContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let auth = match current_auth(&session, state).await? {
            Some(auth) => auth,
            None => {
                let guest = state.auth().sign_in_anonymously().await?;
                set_auth_session(&session, &guest).await?;
                guest
            }
        };

        let store = state.carts().store_for(&auth).await;
        Ok(Self { auth, store })
    }
}

/// Load the auth session, refreshing the access token when it is about to
/// expire.
///
/// A refreshed token means the user's cart store still holds the old one, so
/// the store is dropped and rebuilt on next use. A failed refresh signs the
/// user out locally.
///
/// # Errors
///
/// Returns an error if the session store cannot be read or written.
pub async fn current_auth(
    session: &Session,
    state: &AppState,
) -> Result<Option<AuthSession>, tower_sessions::session::Error> {
    let Some(auth) = session
        .get::<AuthSession>(session_keys::AUTH_SESSION)
        .await?
    else {
        return Ok(None);
    };

    if !auth.needs_refresh(Utc::now()) {
        return Ok(Some(auth));
    }

    match state.auth().refresh(&auth).await {
        Ok(refreshed) => {
            tracing::debug!(user_id = %refreshed.user_id, "Access token refreshed");
            state.carts().invalidate(&auth.user_id).await;
            set_auth_session(session, &refreshed).await?;
            Ok(Some(refreshed))
        }
        Err(e) => {
            tracing::warn!(user_id = %auth.user_id, error = %e, "Token refresh failed, signing out");
            state.carts().invalidate(&auth.user_id).await;
            clear_auth_session(session).await?;
            Ok(None)
        }
    }
}

/// Helper to store the signed-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    set_sentry_user(&auth.user_id);
    session.insert(session_keys::AUTH_SESSION, auth).await
}

/// Helper to clear the signed-in user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<AuthSession>(session_keys::AUTH_SESSION)
        .await?;
    Ok(())
}
