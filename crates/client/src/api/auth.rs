//! Authentication endpoints and the login/logout flows.
//!
//! Credential login and the OAuth callback converge on the same install
//! path: extract the token and user from the envelope, persist the session,
//! and invalidate `Tag::CurrentUser` so any profile view refreshes.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use parcelflow_core::{Address, ApiEnvelope, Role, User};

use crate::client::ApiClient;
use crate::endpoint::{MutationEndpoint, Tag, Verb};
use crate::error::{AuthError, ClientError, Result};
use crate::session::Session;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Identity asserted by the OAuth provider; the backend issues its own
/// token for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleLoginPayload {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: Address,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordPayload {
    /// One-time token from the reset email.
    pub token: String,
    pub password: String,
}

/// `POST /login`.
pub struct Login;

impl MutationEndpoint for Login {
    type Args = LoginPayload;
    type Data = User;
    const NAME: &'static str = "login";
    const VERB: Verb = Verb::Post;
    const INVALIDATES: &'static [Tag] = &[Tag::CurrentUser];

    fn path(_: &Self::Args) -> String {
        "/login".to_string()
    }

    fn body(args: &Self::Args) -> Option<Value> {
        serde_json::to_value(args).ok()
    }
}

/// `POST /google-login`.
pub struct GoogleLogin;

impl MutationEndpoint for GoogleLogin {
    type Args = GoogleLoginPayload;
    type Data = User;
    const NAME: &'static str = "googleLogin";
    const VERB: Verb = Verb::Post;
    const INVALIDATES: &'static [Tag] = &[Tag::CurrentUser];

    fn path(_: &Self::Args) -> String {
        "/google-login".to_string()
    }

    fn body(args: &Self::Args) -> Option<Value> {
        serde_json::to_value(args).ok()
    }
}

/// `POST /register`.
pub struct Register;

impl MutationEndpoint for Register {
    type Args = RegisterPayload;
    type Data = User;
    const NAME: &'static str = "register";
    const VERB: Verb = Verb::Post;
    const INVALIDATES: &'static [Tag] = &[];

    fn path(_: &Self::Args) -> String {
        "/register".to_string()
    }

    fn body(args: &Self::Args) -> Option<Value> {
        serde_json::to_value(args).ok()
    }
}

/// `POST /forgot-password`.
pub struct ForgotPassword;

impl MutationEndpoint for ForgotPassword {
    type Args = String;
    type Data = Value;
    const NAME: &'static str = "forgotPassword";
    const VERB: Verb = Verb::Post;
    const INVALIDATES: &'static [Tag] = &[];

    fn path(_: &Self::Args) -> String {
        "/forgot-password".to_string()
    }

    fn body(args: &Self::Args) -> Option<Value> {
        Some(serde_json::json!({ "email": args }))
    }
}

/// `POST /reset-password`.
pub struct ResetPassword;

impl MutationEndpoint for ResetPassword {
    type Args = ResetPasswordPayload;
    type Data = Value;
    const NAME: &'static str = "resetPassword";
    const VERB: Verb = Verb::Post;
    const INVALIDATES: &'static [Tag] = &[];

    fn path(_: &Self::Args) -> String {
        "/reset-password".to_string()
    }

    fn body(args: &Self::Args) -> Option<Value> {
        serde_json::to_value(args).ok()
    }
}

impl ApiClient {
    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidCredentials` when the backend rejects the login,
    /// `AuthError::MalformedLogin` when the response lacks a token or user,
    /// plus the usual transport classification. On any failure the session
    /// returns to anonymous.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let payload = LoginPayload {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.session().begin_login();
        match self.run_mutation::<Login>(&payload).await {
            Ok(envelope) => self.install_session(envelope),
            Err(e) => {
                self.session().fail_login();
                Err(rejected_login(e))
            }
        }
    }

    /// Complete an OAuth login. Populates the session identically to
    /// credential login.
    ///
    /// # Errors
    ///
    /// Same classification as [`ApiClient::login`].
    #[instrument(skip_all)]
    pub async fn login_with_google(&self, payload: &GoogleLoginPayload) -> Result<User> {
        self.session().begin_login();
        match self.run_mutation::<GoogleLogin>(payload).await {
            Ok(envelope) => self.install_session(envelope),
            Err(e) => {
                self.session().fail_login();
                Err(rejected_login(e))
            }
        }
    }

    /// Register a new account. A successful registration logs the user in.
    ///
    /// # Errors
    ///
    /// Same classification as [`ApiClient::login`].
    #[instrument(skip_all)]
    pub async fn register(&self, payload: &RegisterPayload) -> Result<User> {
        self.session().begin_login();
        match self.run_mutation::<Register>(payload).await {
            Ok(envelope) => self.install_session(envelope),
            Err(e) => {
                self.session().fail_login();
                Err(e)
            }
        }
    }

    /// Request a password-reset email.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>> {
        let envelope = self
            .run_mutation::<ForgotPassword>(&email.to_string())
            .await?;
        Ok(envelope.message)
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn reset_password(&self, payload: &ResetPasswordPayload) -> Result<()> {
        self.run_mutation::<ResetPassword>(payload).await.map(|_| ())
    }

    /// Tear down the session and drop all cached data.
    pub fn logout(&self) {
        info!("logging out");
        self.session().logout();
        self.cache().clear();
    }

    /// Install a session from a successful auth envelope.
    fn install_session(&self, envelope: ApiEnvelope<User>) -> Result<User> {
        let Some(token) = envelope.token else {
            self.session().fail_login();
            return Err(ClientError::Auth(AuthError::MalformedLogin(
                "response missing token".to_string(),
            )));
        };
        let Some(user) = envelope.data else {
            self.session().fail_login();
            return Err(ClientError::Auth(AuthError::MalformedLogin(
                "response missing user".to_string(),
            )));
        };

        let session = Session::new(
            user.clone(),
            SecretString::from(token),
            envelope.refresh_token.map(SecretString::from),
        );
        info!(email = %user.email, role = %user.role, "session established");
        self.session().complete_login(session)?;
        Ok(user)
    }
}

/// A backend rejection during login means bad credentials, not a stale
/// token; everything else passes through unchanged.
fn rejected_login(e: ClientError) -> ClientError {
    match e {
        ClientError::Api {
            status: 400 | 401 | 403,
            ..
        } => ClientError::Auth(AuthError::InvalidCredentials),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_body_carries_credentials() {
        let payload = LoginPayload {
            email: "jane@example.com".to_string(),
            password: "hunter22!".to_string(),
        };
        assert_eq!(Login::path(&payload), "/login");
        assert_eq!(
            Login::body(&payload),
            Some(json!({ "email": "jane@example.com", "password": "hunter22!" }))
        );
    }

    #[test]
    fn test_google_login_omits_missing_image() {
        let payload = GoogleLoginPayload {
            email: "jane@example.com".to_string(),
            name: "Jane".to_string(),
            image: None,
        };
        let body = GoogleLogin::body(&payload).expect("body");
        assert!(body.get("image").is_none());
    }

    #[test]
    fn test_forgot_password_body() {
        assert_eq!(
            ForgotPassword::body(&"jane@example.com".to_string()),
            Some(json!({ "email": "jane@example.com" }))
        );
    }

    #[test]
    fn test_rejected_login_maps_client_errors_only() {
        let unauthorized = ClientError::Api {
            status: 401,
            message: "wrong password".to_string(),
        };
        assert!(matches!(
            rejected_login(unauthorized),
            ClientError::Auth(AuthError::InvalidCredentials)
        ));

        let server_error = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(matches!(
            rejected_login(server_error),
            ClientError::Api { status: 500, .. }
        ));
    }
}
