use taskgate_auth::{AccessLevel, Principal, Role};
use uuid::Uuid;

/// Per-request metadata attached by the gate for every admitted request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Uuid,
    access_level: AccessLevel,
}

impl RequestContext {
    pub fn new(request_id: Uuid, access_level: AccessLevel) -> Self {
        Self {
            request_id,
            access_level,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }
}

/// Principal context for a request (authenticated identity + live role).
///
/// Only present on non-public routes; handlers take it as an extension
/// instead of reading any ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn subject(&self) -> &str {
        self.principal.subject()
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
