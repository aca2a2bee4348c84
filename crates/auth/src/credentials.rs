//! Credential Store contract and the validator built on top of it.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{password::verify_password, AuthFailure, Principal, Role};

/// What the Credential Store knows about one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub password_hash: String,
    pub role: Role,
    pub blocked: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthFailure {
    fn from(_: StoreError) -> Self {
        AuthFailure::StoreUnavailable
    }
}

/// Lookup of principals by subject (email).
///
/// Called concurrently from many requests; implementations must not hold a
/// lock across the returned future's await points.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<StoredCredential>, StoreError>;
}

/// Verifies login attempts and re-resolves principals per request.
#[derive(Clone)]
pub struct CredentialValidator {
    store: Arc<dyn CredentialStore>,
}

impl CredentialValidator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Authenticate a subject/password pair.
    ///
    /// The lock check precedes the password comparison, so a locked account
    /// reports `AccountLocked` whether or not the password was right.
    ///
    /// The Argon2 comparison runs inline on the calling task; this crate does
    /// not depend on an async runtime, so unlike registration hashing it is
    /// not moved to a blocking pool.
    pub async fn login(&self, subject: &str, password: &str) -> Result<Principal, AuthFailure> {
        let stored = self.lookup(subject).await?;

        if stored.blocked {
            return Err(AuthFailure::AccountLocked);
        }

        if !verify_password(password, &stored.password_hash) {
            return Err(AuthFailure::BadCredentials);
        }

        Ok(Principal::new(subject, stored.role, false))
    }

    /// Fetch the current role/blocked state of an already-authenticated subject.
    pub async fn resolve(&self, subject: &str) -> Result<Principal, AuthFailure> {
        let stored = self.lookup(subject).await?;

        if stored.blocked {
            return Err(AuthFailure::AccountLocked);
        }

        Ok(Principal::new(subject, stored.role, false))
    }

    async fn lookup(&self, subject: &str) -> Result<StoredCredential, AuthFailure> {
        match self.store.find_by_subject(subject).await {
            Ok(Some(stored)) => Ok(stored),
            Ok(None) => Err(AuthFailure::UnknownPrincipal),
            Err(e) => {
                tracing::error!(error = %e, "credential store lookup failed");
                Err(e.into())
            }
        }
    }
}
