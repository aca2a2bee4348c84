//! User directory and the account flows built on it (register, login, admin).

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use taskgate_auth::{
    hash_password, normalize_subject, CredentialStore, CredentialValidator, Role, StoreError,
    StoredCredential, Token, TokenCodec,
};

use crate::app::dto::{CreateUserRequest, RegisterRequest};
use crate::app::errors::ApiError;
use crate::config::BootstrapAdmin;

/// A registered account. `email` is the normalized token subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("Login is already taken")]
    DuplicateLogin,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// In-memory user directory for tests/dev.
#[derive(Debug, Default)]
pub struct UserDirectory {
    inner: RwLock<HashMap<String, UserRecord>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new account; email and login must both be unused.
    pub fn insert(&self, record: UserRecord) -> Result<(), DirectoryError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;

        if map.contains_key(&record.email) {
            return Err(DirectoryError::DuplicateEmail);
        }
        if map.values().any(|u| u.login == record.login) {
            return Err(DirectoryError::DuplicateLogin);
        }

        map.insert(record.email.clone(), record);
        Ok(())
    }

    pub fn get(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&normalize_subject(email)).cloned())
    }

    /// All accounts, ordered by email.
    pub fn list(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut users: Vec<UserRecord> = map.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    pub fn set_blocked(&self, email: &str, blocked: bool) -> Result<(), DirectoryError> {
        self.update(email, |u| u.blocked = blocked)
    }

    pub fn set_role(&self, email: &str, role: Role) -> Result<(), DirectoryError> {
        self.update(email, |u| u.role = role)
    }

    /// Delete an account. Tokens already issued to it stop resolving.
    pub fn remove(&self, email: &str) -> Result<UserRecord, DirectoryError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(&normalize_subject(email))
            .ok_or(DirectoryError::NotFound)
    }

    fn update(&self, email: &str, f: impl FnOnce(&mut UserRecord)) -> Result<(), DirectoryError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let user = map
            .get_mut(&normalize_subject(email))
            .ok_or(DirectoryError::NotFound)?;
        f(user);
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("user directory lock poisoned".to_string())
}

#[async_trait]
impl CredentialStore for UserDirectory {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<StoredCredential>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(subject).map(|u| StoredCredential {
            password_hash: u.password_hash.clone(),
            role: u.role,
            blocked: u.blocked,
        }))
    }
}

/// Shared state behind every handler.
pub struct AppServices {
    pub directory: Arc<UserDirectory>,
    pub codec: Arc<TokenCodec>,
    pub validator: CredentialValidator,
}

impl AppServices {
    pub fn new(directory: Arc<UserDirectory>, codec: Arc<TokenCodec>) -> Self {
        let validator = CredentialValidator::new(directory.clone());
        Self {
            directory,
            codec,
            validator,
        }
    }

    /// Create a USER account and issue its first token.
    pub async fn register(&self, req: RegisterRequest) -> Result<Token, ApiError> {
        let user = self
            .create_account(req.login, req.email, req.password, Role::User)
            .await?;
        tracing::info!(subject = %user.email, "user registered");
        Ok(self.codec.issue(&user.email, user.blocked)?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Token, ApiError> {
        let subject = normalize_subject(email);
        if subject.is_empty() || password.is_empty() {
            return Err(ApiError::validation("email and password are required"));
        }

        let principal = self
            .validator
            .login(&subject, password)
            .await
            .inspect_err(|failure| {
                tracing::warn!(subject = %subject, failure = failure.kind(), "login failed");
            })?;
        tracing::info!(subject = %principal.subject(), role = %principal.role, "login succeeded");
        Ok(self.codec.issue(principal.subject(), principal.blocked)?)
    }

    /// Admin-created account with an explicit role (defaults to USER).
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<UserRecord, ApiError> {
        let role = match req.role.as_deref() {
            Some(raw) => raw.parse::<Role>().map_err(|e| ApiError::validation(e.to_string()))?,
            None => Role::User,
        };
        self.create_account(req.login, req.email, req.password, role).await
    }

    /// Ensure the configured admin account exists. Existing accounts are left untouched.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), ApiError> {
        if self.directory.get(&admin.email)?.is_some() {
            tracing::debug!(subject = %normalize_subject(&admin.email), "bootstrap admin already present");
            return Ok(());
        }

        let login = admin
            .email
            .split('@')
            .next()
            .unwrap_or("admin")
            .to_string();
        let user = self
            .create_account(login, admin.email.clone(), admin.password.clone(), Role::Admin)
            .await?;
        tracing::info!(subject = %user.email, "bootstrap admin created");
        Ok(())
    }

    async fn create_account(
        &self,
        login: String,
        email: String,
        password: String,
        role: Role,
    ) -> Result<UserRecord, ApiError> {
        let login = login.trim().to_string();
        let email = normalize_subject(&email);

        if login.is_empty() {
            return Err(ApiError::validation("login must not be blank"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::validation("email must be a valid address"));
        }
        if password.is_empty() {
            return Err(ApiError::validation("password must not be blank"));
        }

        // Argon2 is CPU-bound; keep it off the async workers.
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApiError::internal(format!("password hashing task failed: {e}")))??;

        let record = UserRecord {
            login,
            email,
            password_hash,
            role,
            blocked: false,
            created_at: Utc::now(),
        };
        if let Err(e) = self.directory.insert(record.clone()) {
            tracing::warn!(subject = %record.email, error = %e, "account creation rejected");
            return Err(e.into());
        }
        Ok(record)
    }
}
