use serde::Serialize;

use crate::{AuthFailure, Principal};

/// Access level a route requires.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Public,
    Authenticated,
    AdminOnly,
}

/// One entry of the route table: requests under `prefix` (optionally only for
/// `method`) require `level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    prefix: String,
    method: Option<String>,
    level: AccessLevel,
}

impl AccessRule {
    pub fn new(prefix: &str, level: AccessLevel) -> Self {
        Self {
            prefix: canonical_prefix(prefix),
            method: None,
            level,
        }
    }

    /// Restrict the rule to a single HTTP method.
    pub fn for_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_ascii_uppercase());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn level(&self) -> AccessLevel {
        self.level
    }

    fn matches(&self, path: &str, method: &str) -> bool {
        let method_ok = self
            .method
            .as_deref()
            .is_none_or(|m| m.eq_ignore_ascii_case(method));
        method_ok && prefix_matches(&self.prefix, path)
    }

    /// Longer prefixes win; on equal length a method-specific rule wins.
    fn specificity(&self) -> (usize, bool) {
        (self.prefix.len(), self.method.is_some())
    }
}

/// Immutable route-to-access-level table.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    fallback: AccessLevel,
}

impl AccessPolicy {
    /// Paths matching no rule require [`AccessLevel::Authenticated`].
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self {
            rules,
            fallback: AccessLevel::Authenticated,
        }
    }

    /// Policy from public and admin prefix sets.
    pub fn from_prefixes<P, A>(public: P, admin: A) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        let rules = public
            .into_iter()
            .map(|p| AccessRule::new(p.as_ref(), AccessLevel::Public))
            .chain(
                admin
                    .into_iter()
                    .map(|p| AccessRule::new(p.as_ref(), AccessLevel::AdminOnly)),
            )
            .collect();
        Self::new(rules)
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// Longest-prefix match of `path` (segment-aligned) against the table.
    pub fn classify(&self, path: &str, method: &str) -> AccessLevel {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path, method))
            .max_by_key(|rule| rule.specificity())
            .map(|rule| rule.level)
            .unwrap_or(self.fallback)
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(AuthFailure),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    pub fn into_result(self) -> Result<(), AuthFailure> {
        match self {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => Err(reason),
        }
    }
}

/// Decide whether `principal` may access a route requiring `required`.
///
/// - No IO
/// - No panics
/// - A blocked principal is never allowed past a non-public route
pub fn authorize(principal: Option<&Principal>, required: AccessLevel) -> AccessDecision {
    if required == AccessLevel::Public {
        return AccessDecision::Allow;
    }

    let Some(principal) = principal else {
        return AccessDecision::Deny(AuthFailure::MissingCredential);
    };

    if principal.blocked {
        return AccessDecision::Deny(AuthFailure::AccountLocked);
    }

    match required {
        AccessLevel::Public | AccessLevel::Authenticated => AccessDecision::Allow,
        AccessLevel::AdminOnly if principal.is_admin() => AccessDecision::Allow,
        AccessLevel::AdminOnly => AccessDecision::Deny(AuthFailure::InsufficientRole),
    }
}

fn canonical_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `/api/admin` matches `/api/admin` and `/api/admin/...` but not `/api/administrator`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn policy() -> AccessPolicy {
        AccessPolicy::from_prefixes(["/api/auth", "/health"], ["/api/admin"])
    }

    #[test]
    fn classify_uses_prefix_table() {
        let p = policy();
        assert_eq!(p.classify("/api/auth/login", "POST"), AccessLevel::Public);
        assert_eq!(p.classify("/api/auth", "POST"), AccessLevel::Public);
        assert_eq!(p.classify("/health", "GET"), AccessLevel::Public);
        assert_eq!(p.classify("/api/admin/users", "GET"), AccessLevel::AdminOnly);
        assert_eq!(p.classify("/api/tasks", "GET"), AccessLevel::Authenticated);
        assert_eq!(p.classify("/", "GET"), AccessLevel::Authenticated);
    }

    #[test]
    fn prefix_match_is_segment_aligned() {
        let p = policy();
        assert_eq!(p.classify("/api/administrator", "GET"), AccessLevel::Authenticated);
        assert_eq!(p.classify("/api/authority", "GET"), AccessLevel::Authenticated);
    }

    #[test]
    fn longest_prefix_wins() {
        let p = AccessPolicy::new(vec![
            AccessRule::new("/api/admin", AccessLevel::AdminOnly),
            AccessRule::new("/api/admin/status/", AccessLevel::Public),
            AccessRule::new("/", AccessLevel::Authenticated),
        ]);
        assert_eq!(p.classify("/api/admin/status", "GET"), AccessLevel::Public);
        assert_eq!(p.classify("/api/admin/statusx", "GET"), AccessLevel::AdminOnly);
        assert_eq!(p.classify("/anything", "GET"), AccessLevel::Authenticated);
    }

    #[test]
    fn method_specific_rule() {
        let p = AccessPolicy::new(vec![
            AccessRule::new("/api/tasks", AccessLevel::Authenticated),
            AccessRule::new("/api/tasks", AccessLevel::AdminOnly).for_method("delete"),
        ]);
        assert_eq!(p.classify("/api/tasks/7", "GET"), AccessLevel::Authenticated);
        assert_eq!(p.classify("/api/tasks/7", "DELETE"), AccessLevel::AdminOnly);
    }

    #[test]
    fn public_allows_without_principal() {
        assert_eq!(authorize(None, AccessLevel::Public), AccessDecision::Allow);
    }

    #[test]
    fn authenticated_requires_principal() {
        assert_eq!(
            authorize(None, AccessLevel::Authenticated),
            AccessDecision::Deny(AuthFailure::MissingCredential)
        );
        let user = Principal::new("u@example.com", Role::User, false);
        assert!(authorize(Some(&user), AccessLevel::Authenticated).is_allowed());
    }

    #[test]
    fn admin_only_requires_admin_role() {
        let user = Principal::new("u@example.com", Role::User, false);
        let admin = Principal::new("a@example.com", Role::Admin, false);
        assert_eq!(
            authorize(Some(&user), AccessLevel::AdminOnly),
            AccessDecision::Deny(AuthFailure::InsufficientRole)
        );
        assert!(authorize(Some(&admin), AccessLevel::AdminOnly).is_allowed());
    }

    #[test]
    fn blocked_is_denied_regardless_of_role() {
        for role in [Role::User, Role::Admin] {
            let blocked = Principal::new("b@example.com", role, true);
            for level in [AccessLevel::Authenticated, AccessLevel::AdminOnly] {
                assert_eq!(
                    authorize(Some(&blocked), level).into_result(),
                    Err(AuthFailure::AccountLocked)
                );
            }
        }
    }
}
