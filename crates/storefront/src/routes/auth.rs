//! Authentication route handlers.
//!
//! Password sign-in and registration against the hosted auth API. A guest
//! session (created when a visitor first touches the cart) is replaced on
//! sign-in; the guest's cart stays with the guest user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shophub_core::Email;

use super::views::HeaderView;
use crate::error::{Result, clear_sentry_user};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, set_auth_session};
use crate::remote::{AuthSession, SignUp};
use crate::state::AppState;

/// Shortest password the backend accepts by default.
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// User-facing text for an error code carried in the query string.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "invalid_email" => "Please enter a valid email address.",
        "password_mismatch" => "Passwords do not match.",
        "password_too_short" => "Password must be at least 6 characters.",
        "email_taken" => "An account with this email already exists.",
        "session" => "We could not start your session. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub header: HeaderView,
    pub nonce: String,
    pub error: Option<&'static str>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub header: HeaderView,
    pub nonce: String,
    pub error: Option<&'static str>,
}

/// Shown when the backend requires email confirmation before sign-in.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_success.html")]
pub struct RegisterSuccessTemplate {
    pub header: HeaderView,
    pub nonce: String,
    pub email: String,
}

/// Replace whatever session was active with `auth`.
///
/// The session ID is rotated to prevent fixation, and the previous user's
/// cart store (usually a guest's) is dropped.
async fn start_session(
    state: &AppState,
    session: &Session,
    previous: Option<&AuthSession>,
    auth: &AuthSession,
) -> std::result::Result<(), tower_sessions::session::Error> {
    if let Some(previous) = previous {
        state.carts().invalidate(&previous.user_id).await;
    }
    session.cycle_id().await?;
    set_auth_session(session, auth).await
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        header: HeaderView::load(&state, auth.as_ref()).await,
        nonce,
        error: query.error.as_deref().map(error_message),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    OptionalAuth(previous): OptionalAuth,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return Redirect::to("/auth/login?error=invalid_email").into_response();
    };

    match state.auth().sign_in_with_password(&email, &form.password).await {
        Ok(auth) => {
            if let Err(e) = start_session(&state, &session, previous.as_ref(), &auth).await {
                tracing::error!("Failed to set session: {e}");
                return Redirect::to("/auth/login?error=session").into_response();
            }
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            Redirect::to("/auth/login?error=credentials").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        header: HeaderView::load(&state, auth.as_ref()).await,
        nonce,
        error: query.error.as_deref().map(error_message),
    }
}

/// Check the registration form before calling the backend.
fn validate_registration(form: &RegisterForm) -> std::result::Result<Email, &'static str> {
    let email = Email::parse(&form.email).map_err(|_| "invalid_email")?;
    if form.password != form.password_confirm {
        return Err("password_mismatch");
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err("password_too_short");
    }
    Ok(email)
}

/// Handle registration form submission.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    OptionalAuth(previous): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<RegisterForm>,
) -> Response {
    let email = match validate_registration(&form) {
        Ok(email) => email,
        Err(code) => return Redirect::to(&format!("/auth/register?error={code}")).into_response(),
    };

    match state.auth().sign_up(&email, &form.password).await {
        Ok(SignUp::SignedIn(auth)) => {
            if let Err(e) = start_session(&state, &session, previous.as_ref(), &auth).await {
                tracing::error!("Failed to set session after registration: {e}");
                return Redirect::to("/auth/login?error=session").into_response();
            }
            Redirect::to("/").into_response()
        }
        Ok(SignUp::ConfirmationRequired { email }) => RegisterSuccessTemplate {
            header: HeaderView::load(&state, previous.as_ref()).await,
            nonce,
            email,
        }
        .into_response(),
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            let message = e.to_string().to_lowercase();
            if message.contains("already") || message.contains("exists") {
                Redirect::to("/auth/register?error=email_taken").into_response()
            } else {
                Redirect::to("/auth/register?error=failed").into_response()
            }
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Drops the user's cart store and revokes the token on a best-effort basis;
/// the local session is cleared even if the backend call fails.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    session: Session,
) -> Result<Redirect> {
    if let Some(auth) = auth {
        state.carts().invalidate(&auth.user_id).await;
        if let Err(e) = state.auth().sign_out(&auth).await {
            tracing::warn!(user_id = %auth.user_id, "Remote sign-out failed: {e}");
        }
    }

    session.flush().await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
