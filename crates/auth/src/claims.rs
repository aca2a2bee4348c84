use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthFailure;

/// Claims carried by a bearer token.
///
/// `iat`/`exp` are Unix seconds on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (normalized email).
    pub sub: String,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,

    /// Blocked flag at issuance. Informational only; the live store value wins.
    #[serde(default)]
    pub blocked: bool,
}

/// Validate the time window of already signature-checked claims.
///
/// Expiry is inclusive: a token is expired at `now == exp`.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), AuthFailure> {
    if claims.sub.trim().is_empty() || claims.exp <= claims.iat {
        return Err(AuthFailure::MalformedToken);
    }
    if now >= claims.exp {
        return Err(AuthFailure::ExpiredToken);
    }
    Ok(())
}
