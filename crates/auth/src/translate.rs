//! Deterministic mapping from [`AuthFailure`] to a wire-level error.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AuthFailure;

/// Canonical (status, message, detail policy) triple for one failure kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Translation {
    pub status: u16,
    pub message: &'static str,
    /// Whether the error body should carry request context.
    pub include_details: bool,
}

impl Translation {
    /// Render the error body for a request to `uri`.
    pub fn to_body(&self, now: DateTime<Utc>, uri: Option<&str>) -> ErrorBody {
        ErrorBody {
            timestamp: now,
            status: self.status,
            message: self.message.to_string(),
            details: if self.include_details {
                uri.map(|u| format!("uri={u}"))
            } else {
                None
            },
        }
    }
}

/// Structured error response body shared by every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub message: String,
    pub details: Option<String>,
}

/// Translate a failure into its response triple.
///
/// No wildcard arm: a new failure kind does not compile until it has a row here.
pub fn translate(failure: AuthFailure) -> Translation {
    let (status, message) = match failure {
        AuthFailure::MissingCredential => (
            401,
            "Authentication failed: Missing or invalid Authorization header",
        ),
        AuthFailure::MalformedToken => (401, "Invalid token format"),
        AuthFailure::InvalidSignature => (401, "Invalid token signature"),
        AuthFailure::ExpiredToken => (401, "Token expired"),
        AuthFailure::AccountLocked => (403, "Access Denied: account is locked"),
        AuthFailure::BadCredentials => (401, "Unauthorized: invalid credentials"),
        AuthFailure::UnknownPrincipal => (401, "Authentication failed: unknown principal"),
        AuthFailure::InsufficientRole => (403, "Access Denied: insufficient role"),
        AuthFailure::StoreUnavailable => (503, "Credential store unavailable"),
    };

    Translation {
        status,
        message,
        include_details: status == 401,
    }
}
