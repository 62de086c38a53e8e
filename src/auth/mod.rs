//! Authentication collaborator.
//!
//! Record-management screens sit behind a [`SessionContext`], which follows
//! the provider's session stream from init to teardown. The provider itself
//! is injected, so tests and the CLI can swap the local credential store for
//! anything implementing [`AuthProvider`].

mod local;

pub use local::LocalAuthProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// A signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Authentication failures, keyed by the provider's `auth/*` codes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,

    #[error("no account for this email")]
    UserNotFound,

    #[error("password does not match")]
    WrongPassword,

    #[error("malformed email address")]
    InvalidEmail,

    #[error("too many failed attempts")]
    TooManyRequests,

    #[error("authentication backend is not configured")]
    ConfigurationNotFound,

    #[error("authentication backend rejected its credentials")]
    InvalidApiKey,

    #[error("an account already exists for this email")]
    EmailAlreadyInUse,

    #[error("password is too weak")]
    WeakPassword,

    #[error("no signed-in session")]
    Unauthenticated,

    #[error("{code}: {message}")]
    Other { code: String, message: String },
}

impl AuthError {
    pub fn other(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::MissingCredentials => "auth/missing-credentials",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidEmail => "auth/invalid-email",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::ConfigurationNotFound => "auth/configuration-not-found",
            Self::InvalidApiKey => "auth/invalid-api-key",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::Unauthenticated => "auth/unauthenticated",
            Self::Other { code, .. } => code,
        }
    }

    /// Map a provider error code back to a typed error
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "auth/missing-credentials" => Self::MissingCredentials,
            "auth/user-not-found" => Self::UserNotFound,
            "auth/wrong-password" => Self::WrongPassword,
            "auth/invalid-email" => Self::InvalidEmail,
            "auth/too-many-requests" => Self::TooManyRequests,
            "auth/configuration-not-found" => Self::ConfigurationNotFound,
            "auth/invalid-api-key" => Self::InvalidApiKey,
            "auth/email-already-in-use" => Self::EmailAlreadyInUse,
            "auth/weak-password" => Self::WeakPassword,
            "auth/unauthenticated" => Self::Unauthenticated,
            other => Self::other(other, message),
        }
    }

    /// Message shown on the login screen
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "Please fill in all fields",
            Self::UserNotFound => "User not found",
            Self::WrongPassword => "Incorrect password",
            Self::InvalidEmail => "Invalid email",
            Self::TooManyRequests => "Too many attempts. Please try again later",
            Self::ConfigurationNotFound => {
                "Authentication is not configured. Check the project settings."
            }
            Self::InvalidApiKey => "Invalid authentication API key. Check the settings.",
            Self::EmailAlreadyInUse => "This email is already registered",
            Self::WeakPassword => "Password is too weak",
            Self::Unauthenticated => "Please sign in to continue",
            Self::Other { .. } => "Could not sign in. Please try again",
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Create an account and sign it in
    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    fn current_user(&self) -> Option<User>;

    /// Session stream; the receiver sees every sign-in and sign-out
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

/// Session state for the lifetime of the UI.
///
/// Holds the latest user observed on the provider's stream. Views call
/// [`SessionContext::require_session`] before showing record data.
pub struct SessionContext {
    provider: Arc<dyn AuthProvider>,
    session: watch::Receiver<Option<User>>,
    current: Option<User>,
}

impl SessionContext {
    /// Subscribe to the provider and take the current session
    pub fn init(provider: Arc<dyn AuthProvider>) -> Self {
        let mut session = provider.subscribe();
        let current = session.borrow_and_update().clone();
        tracing::debug!(signed_in = current.is_some(), "session context initialised");
        Self {
            provider,
            session,
            current,
        }
    }

    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Pick up a pending session change without waiting.
    /// Returns true when the session changed since the last call.
    pub fn refresh(&mut self) -> bool {
        match self.session.has_changed() {
            Ok(true) => {
                self.current = self.session.borrow_and_update().clone();
                tracing::info!(
                    user = self.current.as_ref().map(|u| u.email.as_str()),
                    "session changed"
                );
                true
            }
            Ok(false) => false,
            Err(_) => {
                // Provider dropped: nobody can be signed in any more
                let changed = self.current.is_some();
                self.current = None;
                changed
            }
        }
    }

    /// Gate for protected views
    pub fn require_session(&self) -> Result<&User, AuthError> {
        self.current.as_ref().ok_or(AuthError::Unauthenticated)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        self.provider.sign_in(email, password).await?;
        self.refresh();
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        self.refresh();
        Ok(())
    }

    /// Stop following the session stream
    pub fn teardown(self) {
        tracing::debug!("session context torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use tempfile::TempDir;

    #[test]
    fn test_codes_round_trip() {
        let errors = [
            AuthError::UserNotFound,
            AuthError::WrongPassword,
            AuthError::InvalidEmail,
            AuthError::TooManyRequests,
            AuthError::ConfigurationNotFound,
            AuthError::InvalidApiKey,
            AuthError::EmailAlreadyInUse,
            AuthError::WeakPassword,
        ];
        for err in errors {
            assert_eq!(AuthError::from_code(err.code(), ""), err);
        }
    }

    #[test]
    fn test_unknown_code_gets_generic_message() {
        let err = AuthError::from_code("auth/network-request-failed", "offline");
        assert_eq!(err.code(), "auth/network-request-failed");
        assert_eq!(err.user_message(), "Could not sign in. Please try again");
    }

    #[test]
    fn test_specific_messages() {
        assert_eq!(AuthError::UserNotFound.user_message(), "User not found");
        assert_eq!(AuthError::WrongPassword.user_message(), "Incorrect password");
        assert_eq!(
            AuthError::TooManyRequests.user_message(),
            "Too many attempts. Please try again later"
        );
    }

    fn provider(temp_dir: &TempDir) -> Arc<dyn AuthProvider> {
        Arc::new(LocalAuthProvider::new(
            temp_dir.path().join("users.json"),
            AuthConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_session_gates_until_sign_in() {
        let temp_dir = TempDir::new().unwrap();
        let provider = provider(&temp_dir);
        provider.register("ana@corp.com", "secret1").await.unwrap();
        provider.sign_out().await.unwrap();

        let mut session = SessionContext::init(Arc::clone(&provider));
        assert!(!session.is_authenticated());
        assert_eq!(session.require_session(), Err(AuthError::Unauthenticated));

        session.sign_in("ana@corp.com", "secret1").await.unwrap();
        assert_eq!(session.require_session().unwrap().email, "ana@corp.com");

        session.sign_out().await.unwrap();
        assert!(!session.is_authenticated());
        session.teardown();
    }

    #[tokio::test]
    async fn test_session_follows_provider_changes() {
        let temp_dir = TempDir::new().unwrap();
        let provider = provider(&temp_dir);
        let mut session = SessionContext::init(Arc::clone(&provider));
        assert!(!session.refresh());

        provider.register("bia@corp.com", "secret1").await.unwrap();
        assert!(session.refresh());
        assert!(session.is_authenticated());
        assert!(!session.refresh());
    }

    #[tokio::test]
    async fn test_empty_credentials_never_reach_provider() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = SessionContext::init(provider(&temp_dir));
        let err = session.sign_in("  ", "x").await.unwrap_err();
        assert_eq!(err, AuthError::MissingCredentials);
        assert_eq!(err.user_message(), "Please fill in all fields");
    }
}
