//! Closed failure taxonomy of the gateway.
//!
//! Every component reports failures as one of these values; only the
//! authentication gate (or the login endpoint) turns them into a response.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    /// No Authorization header, or not a `Bearer` credential.
    #[error("missing credential")]
    MissingCredential,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    ExpiredToken,

    #[error("account locked")]
    AccountLocked,

    /// Login-time password mismatch.
    #[error("bad credentials")]
    BadCredentials,

    #[error("insufficient role")]
    InsufficientRole,

    #[error("unknown principal")]
    UnknownPrincipal,

    /// The Credential Store could not answer.
    #[error("credential store unavailable")]
    StoreUnavailable,
}

impl AuthFailure {
    pub const ALL: [AuthFailure; 9] = [
        AuthFailure::MissingCredential,
        AuthFailure::MalformedToken,
        AuthFailure::InvalidSignature,
        AuthFailure::ExpiredToken,
        AuthFailure::AccountLocked,
        AuthFailure::BadCredentials,
        AuthFailure::InsufficientRole,
        AuthFailure::UnknownPrincipal,
        AuthFailure::StoreUnavailable,
    ];

    /// Stable identifier for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthFailure::MissingCredential => "missing_credential",
            AuthFailure::MalformedToken => "malformed_token",
            AuthFailure::InvalidSignature => "invalid_signature",
            AuthFailure::ExpiredToken => "expired_token",
            AuthFailure::AccountLocked => "account_locked",
            AuthFailure::BadCredentials => "bad_credentials",
            AuthFailure::InsufficientRole => "insufficient_role",
            AuthFailure::UnknownPrincipal => "unknown_principal",
            AuthFailure::StoreUnavailable => "store_unavailable",
        }
    }
}
