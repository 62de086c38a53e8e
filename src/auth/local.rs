//! File-backed credential store.
//!
//! Accounts live in one JSON file with salted SHA-256 password hashes.
//! Failed sign-ins are counted per email; after `max_failed_attempts` in a
//! row the email is locked out for `lockout_secs`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{watch, Mutex};

use super::{AuthError, AuthProvider, User};
use crate::config::AuthConfig;
use crate::form::validation::is_valid_email;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    uid: String,
    email: String,
    salt: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl StoredUser {
    fn to_user(&self) -> User {
        User {
            uid: self.uid.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserFile {
    #[serde(default)]
    users: Vec<StoredUser>,
}

#[derive(Debug, Default)]
struct Failures {
    count: u32,
    locked_until: Option<Instant>,
}

pub struct LocalAuthProvider {
    path: PathBuf,
    policy: AuthConfig,
    failures: Mutex<HashMap<String, Failures>>,
    /// Serialises read-modify-write cycles on the credential file
    file_lock: Mutex<()>,
    session: watch::Sender<Option<User>>,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn io_error(err: impl std::fmt::Display) -> AuthError {
    tracing::error!(error = %err, "credential store I/O failed");
    AuthError::other("auth/internal-error", err.to_string())
}

impl LocalAuthProvider {
    pub fn new(path: impl Into<PathBuf>, policy: AuthConfig) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            path: path.into(),
            policy,
            failures: Mutex::new(HashMap::new()),
            file_lock: Mutex::new(()),
            session,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_users(&self) -> Result<UserFile, AuthError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                tracing::error!(path = %self.path.display(), error = %e, "credential file is corrupt");
                AuthError::ConfigurationNotFound
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UserFile::default()),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn write_users(&self, file: &UserFile) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let content = serde_json::to_string_pretty(file).map_err(io_error)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(io_error)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_error)
    }

    async fn check_lockout(&self, email: &str) -> Result<(), AuthError> {
        let mut failures = self.failures.lock().await;
        if let Some(entry) = failures.get_mut(email) {
            match entry.locked_until {
                Some(until) if Instant::now() < until => return Err(AuthError::TooManyRequests),
                Some(_) => *entry = Failures::default(),
                None => {}
            }
        }
        Ok(())
    }

    async fn record_failure(&self, email: &str) {
        let mut failures = self.failures.lock().await;
        let entry = failures.entry(email.to_string()).or_default();
        entry.count += 1;
        if entry.count >= self.policy.max_failed_attempts {
            entry.locked_until = Some(Instant::now() + Duration::from_secs(self.policy.lockout_secs));
            tracing::warn!(email, attempts = entry.count, "sign-in locked out");
        }
    }

    fn publish(&self, user: Option<User>) {
        self.session.send_replace(user);
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        let email = normalize_email(email);
        self.check_lockout(&email).await?;

        let file = self.read_users().await?;
        let Some(stored) = file.users.iter().find(|u| u.email == email) else {
            self.record_failure(&email).await;
            return Err(AuthError::UserNotFound);
        };
        if hash_password(&stored.salt, password) != stored.password_hash {
            self.record_failure(&email).await;
            return Err(AuthError::WrongPassword);
        }

        self.failures.lock().await.remove(&email);
        let user = stored.to_user();
        tracing::info!(uid = %user.uid, "signed in");
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < self.policy.min_password_length {
            return Err(AuthError::WeakPassword);
        }
        let email = normalize_email(email);

        let _guard = self.file_lock.lock().await;
        let mut file = self.read_users().await?;
        if file.users.iter().any(|u| u.email == email) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let salt = uuid::Uuid::new_v4().simple().to_string();
        let stored = StoredUser {
            uid: uuid::Uuid::new_v4().to_string(),
            password_hash: hash_password(&salt, password),
            salt,
            email,
            created_at: Utc::now(),
        };
        let user = stored.to_user();
        file.users.push(stored);
        self.write_users(&file).await?;

        tracing::info!(uid = %user.uid, "account registered");
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(user) = self.session.borrow().as_ref() {
            tracing::info!(uid = %user.uid, "signed out");
        }
        self.publish(None);
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }
}
