//! Auth API client: sign-in, sign-up, anonymous sessions, refresh.

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use shophub_core::{Email, UserId};

use super::RemoteError;
use super::client::RestClient;

/// Refresh this long before the backend would reject the token.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// A bearer token issued by the auth API.
///
/// Implements `Debug` manually to redact the value. Serializable because it
/// lives in the server-side session store, never in a cookie.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for request headers only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// A signed-in (possibly anonymous) user and their tokens.
///
/// This is the "session" cart rows are scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: UserId,
    /// `None` for anonymous users.
    pub email: Option<Email>,
    pub access_token: AccessToken,
    pub refresh_token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether this session belongs to an anonymous (guest) user.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.email.is_none()
    }

    /// Whether the access token should be refreshed before use.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_LEEWAY_SECS) >= self.expires_at
    }

    /// Short name for the header greeting.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.email
            .as_ref()
            .map_or_else(|| "Guest".to_string(), |e| e.local_part().to_string())
    }
}

/// Outcome of a password sign-up.
#[derive(Debug, Clone)]
pub enum SignUp {
    /// The account is usable immediately.
    SignedIn(AuthSession),
    /// The backend sent a confirmation email; no session yet.
    ConfirmationRequired { email: String },
}

/// Token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    is_anonymous: bool,
}

/// Sign-up returns either a full token grant or just the pending user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Pending(UserPayload),
}

impl TokenResponse {
    fn into_session(self, issued_at: DateTime<Utc>) -> AuthSession {
        let email = if self.user.is_anonymous {
            None
        } else {
            self.user.email.as_deref().and_then(|e| Email::parse(e).ok())
        };

        AuthSession {
            user_id: self.user.id,
            email,
            access_token: AccessToken(self.access_token),
            refresh_token: AccessToken(self.refresh_token),
            expires_at: issued_at + Duration::seconds(self.expires_in),
        }
    }
}

/// Client for the auth API.
#[derive(Clone)]
pub struct AuthClient {
    client: RestClient,
}

impl AuthClient {
    #[must_use]
    pub const fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, RemoteError> {
        let request = self
            .client
            .auth(Method::POST, "token", None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email.as_str(), "password": password }));

        let token: TokenResponse = self.client.execute_json(request).await?;
        tracing::info!(user_id = %token.user.id, "User signed in");
        Ok(token.into_session(Utc::now()))
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is taken, the password is rejected, or
    /// the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(&self, email: &Email, password: &str) -> Result<SignUp, RemoteError> {
        let request = self
            .client
            .auth(Method::POST, "signup", None)
            .json(&json!({ "email": email.as_str(), "password": password }));

        let response: SignUpResponse = self.client.execute_json(request).await?;
        Ok(match response {
            SignUpResponse::Session(token) => SignUp::SignedIn(token.into_session(Utc::now())),
            SignUpResponse::Pending(user) => {
                tracing::info!(user_id = %user.id, "Sign-up awaiting email confirmation");
                SignUp::ConfirmationRequired {
                    email: user.email.unwrap_or_else(|| email.to_string()),
                }
            }
        })
    }

    /// Create a guest user so a visitor can hold a cart before registering.
    ///
    /// # Errors
    ///
    /// Returns an error if anonymous sign-ins are disabled on the backend or
    /// the request fails.
    #[instrument(skip(self))]
    pub async fn sign_in_anonymously(&self) -> Result<AuthSession, RemoteError> {
        let request = self
            .client
            .auth(Method::POST, "signup", None)
            .json(&json!({ "data": {} }));

        let token: TokenResponse = self.client.execute_json(request).await?;
        tracing::info!(user_id = %token.user.id, "Guest session created");
        Ok(token.into_session(Utc::now()))
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token was revoked or the request fails.
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, RemoteError> {
        let request = self
            .client
            .auth(Method::POST, "token", None)
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": session.refresh_token.expose() }));

        let token: TokenResponse = self.client.execute_json(request).await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Revoke the session on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. Callers treat this as best
    /// effort and clear the local session regardless.
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn sign_out(&self, session: &AuthSession) -> Result<(), RemoteError> {
        let request = self
            .client
            .auth(Method::POST, "logout", Some(&session.access_token));
        self.client.execute_empty(request).await
    }
}
