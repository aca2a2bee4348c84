//! `taskgate-auth`: stateless authentication and authorization gateway.
//!
//! This crate is intentionally decoupled from HTTP and storage: the transport
//! hands the gate a [`GateRequest`], the storage layer implements
//! [`CredentialStore`].

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod credentials;
pub mod failure;
pub mod gate;
pub mod password;
pub mod principal;
pub mod roles;
pub mod translate;

pub use authorize::{authorize, AccessDecision, AccessLevel, AccessPolicy, AccessRule};
pub use claims::{validate_claims, TokenClaims};
pub use codec::{Token, TokenCodec, TokenError};
pub use credentials::{CredentialStore, CredentialValidator, StoreError, StoredCredential};
pub use failure::AuthFailure;
pub use gate::{
    extract_bearer, Admission, AuthenticationGate, GateOutcome, GateRequest, GateStage, Rejection,
};
pub use password::{hash_password, verify_password, PasswordError};
pub use principal::{normalize_subject, Principal};
pub use roles::{Role, UnknownRole};
pub use translate::{translate, ErrorBody, Translation};
