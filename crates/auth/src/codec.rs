//! Issuing and verifying compact signed bearer tokens (HS512 JWS).

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{claims::validate_claims, AuthFailure, TokenClaims};

const ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("token lifetime overflows the representable time range")]
    LifetimeOverflow,
}

/// A signed token together with the claims it carries.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    encoded: String,
    claims: TokenClaims,
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn into_string(self) -> String {
        self.encoded
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.claims.iat
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.exp
    }

    pub fn blocked_at_issuance(&self) -> bool {
        self.claims.blocked
    }
}

impl core::fmt::Debug for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Token")
            .field("claims", &self.claims)
            .field("encoded", &"<redacted>")
            .finish()
    }
}

/// Token issuer/verifier bound to the process-wide signing secret.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked by `validate_claims` against an explicit clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &str, blocked: bool) -> Result<Token, TokenError> {
        self.issue_at(subject, blocked, Utc::now())
    }

    /// Issue a token with `iat = now` (truncated to whole seconds) and `exp = iat + ttl`.
    pub fn issue_at(
        &self,
        subject: &str,
        blocked: bool,
        now: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        let iat = now.trunc_subsecs(0);
        let exp = iat
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::LifetimeOverflow)?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat,
            exp,
            blocked,
        };

        let encoded = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        Ok(Token { encoded, claims })
    }

    pub fn decode(&self, raw: &str) -> Result<Token, AuthFailure> {
        self.decode_at(raw, Utc::now())
    }

    /// Verify structure, then signature, then expiry.
    pub fn decode_at(&self, raw: &str, now: DateTime<Utc>) -> Result<Token, AuthFailure> {
        check_structure(raw)?;

        let data = jsonwebtoken::decode::<TokenClaims>(raw, &self.decoding, &self.validation)
            .map_err(|e| classify_jwt_error(e.kind()))?;

        validate_claims(&data.claims, now)?;

        Ok(Token {
            encoded: raw.to_string(),
            claims: data.claims,
        })
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Cheap shape check so garbage never reaches the HMAC.
fn check_structure(raw: &str) -> Result<(), AuthFailure> {
    let mut segments = 0;
    for segment in raw.split('.') {
        segments += 1;
        let well_formed = !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !well_formed {
            return Err(AuthFailure::MalformedToken);
        }
    }

    if segments == 3 {
        Ok(())
    } else {
        Err(AuthFailure::MalformedToken)
    }
}

fn classify_jwt_error(kind: &ErrorKind) -> AuthFailure {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthFailure::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthFailure::ExpiredToken,
        _ => AuthFailure::MalformedToken,
    }
}
