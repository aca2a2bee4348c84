//! Per-request authentication pass.
//!
//! ```text
//! Start -> PathClassified -(public)-> Dispatch
//!                         -> CredentialExtracted -> TokenDecoded
//!                         -> PrincipalResolved -> Authorized -> Dispatch
//! ```
//!
//! Any failing transition ends in a terminal [`Rejection`]; no later stage runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    authorize, AccessLevel, AccessPolicy, AuthFailure, CredentialValidator, Principal, TokenCodec,
};

const BEARER_SCHEME: &str = "Bearer ";

/// States of the authentication pass, in order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStage {
    Start,
    PathClassified,
    CredentialExtracted,
    TokenDecoded,
    PrincipalResolved,
    Authorized,
    Dispatch,
}

/// Transport-independent view of the inbound request.
#[derive(Debug, Copy, Clone)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub method: &'a str,
    /// Raw `Authorization` header value, if present and valid text.
    pub authorization: Option<&'a str>,
}

/// Request admitted to the business handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub level: AccessLevel,
    /// `None` only for public routes.
    pub principal: Option<Principal>,
}

/// Request halted by the gate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Last state reached before the failing transition.
    pub stage: GateStage,
    pub failure: AuthFailure,
}

pub type GateOutcome = Result<Admission, Rejection>;

/// Strip the `Bearer ` scheme from an Authorization header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthFailure> {
    let token = header
        .ok_or(AuthFailure::MissingCredential)?
        .strip_prefix(BEARER_SCHEME)
        .ok_or(AuthFailure::MissingCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthFailure::MissingCredential);
    }

    Ok(token)
}

/// Orchestrates codec, validator and policy for one request at a time.
///
/// Holds only immutable, shared state; many passes may run concurrently.
#[derive(Clone)]
pub struct AuthenticationGate {
    codec: Arc<TokenCodec>,
    validator: CredentialValidator,
    policy: Arc<AccessPolicy>,
}

impl AuthenticationGate {
    pub fn new(codec: Arc<TokenCodec>, validator: CredentialValidator, policy: Arc<AccessPolicy>) -> Self {
        Self {
            codec,
            validator,
            policy,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub async fn admit(&self, request: GateRequest<'_>) -> GateOutcome {
        self.admit_at(request, Utc::now()).await
    }

    pub async fn admit_at(&self, request: GateRequest<'_>, now: DateTime<Utc>) -> GateOutcome {
        let level = self.policy.classify(request.path, request.method);

        if level == AccessLevel::Public {
            return Ok(Admission {
                level,
                principal: None,
            });
        }

        let raw = extract_bearer(request.authorization)
            .map_err(|failure| reject(GateStage::PathClassified, failure))?;

        let token = self
            .codec
            .decode_at(raw, now)
            .map_err(|failure| reject(GateStage::CredentialExtracted, failure))?;

        let principal = self
            .validator
            .resolve(token.subject())
            .await
            .map_err(|failure| reject(GateStage::TokenDecoded, failure))?;

        if token.blocked_at_issuance() != principal.blocked {
            tracing::debug!(
                subject = principal.subject(),
                "blocked flag in token differs from store; using store value"
            );
        }

        authorize(Some(&principal), level)
            .into_result()
            .map_err(|failure| reject(GateStage::PrincipalResolved, failure))?;

        Ok(Admission {
            level,
            principal: Some(principal),
        })
    }
}

fn reject(stage: GateStage, failure: AuthFailure) -> Rejection {
    Rejection { stage, failure }
}
