use serde::{Deserialize, Serialize};

use crate::Role;

/// Verified identity of the caller for the current request.
///
/// Built from a live Credential Store record on every request and never cached
/// across requests; the role and blocked flag here are always current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Normalized email address.
    pub subject: String,
    pub role: Role,
    pub blocked: bool,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role, blocked: bool) -> Self {
        Self {
            subject: subject.into(),
            role,
            blocked,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Canonical form of a subject (email) used as the Credential Store key.
pub fn normalize_subject(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_subject("  Alice@Example.COM "), "alice@example.com");
    }
}
