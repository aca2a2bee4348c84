//! Gateway configuration (environment-driven, immutable after startup).

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_TTL_SECS: i64 = 3600;
/// One year.
pub const MAX_TTL_SECS: i64 = 365 * 24 * 3600;
pub const DEFAULT_PUBLIC_PREFIXES: &[&str] = &["/api/auth", "/health"];
pub const DEFAULT_ADMIN_PREFIXES: &[&str] = &["/api/admin"];
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// HS512 keys shorter than this are accepted but logged.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Admin account created at startup when the directory has no such user.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct GatewayConfig {
    pub jwt_secret: Vec<u8>,
    pub token_ttl: Duration,
    pub public_prefixes: Vec<String>,
    pub admin_prefixes: Vec<String>,
    pub bind_addr: SocketAddr,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl core::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("jwt_secret", &format_args!("<{} bytes>", self.jwt_secret.len()))
            .field("token_ttl", &self.token_ttl)
            .field("public_prefixes", &self.public_prefixes)
            .field("admin_prefixes", &self.admin_prefixes)
            .field("bind_addr", &self.bind_addr)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl GatewayConfig {
    /// Defaults for everything except the secret.
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::seconds(DEFAULT_TTL_SECS),
            public_prefixes: DEFAULT_PUBLIC_PREFIXES.iter().map(|p| p.to_string()).collect(),
            admin_prefixes: DEFAULT_ADMIN_PREFIXES.iter().map(|p| p.to_string()).collect(),
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080))),
            bootstrap_admin: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let mut config = Self::new(secret.into_bytes());

        if let Some(raw) = lookup("JWT_TTL_SECS") {
            let secs: i64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("JWT_TTL_SECS", format!("'{raw}' is not an integer")))?;
            if !(1..=MAX_TTL_SECS).contains(&secs) {
                return Err(ConfigError::invalid(
                    "JWT_TTL_SECS",
                    format!("must be between 1 and {MAX_TTL_SECS}"),
                ));
            }
            config.token_ttl = Duration::try_seconds(secs)
                .ok_or_else(|| ConfigError::invalid("JWT_TTL_SECS", "out of range"))?;
        }

        if let Some(raw) = lookup("PUBLIC_ROUTE_PREFIXES") {
            config.public_prefixes = parse_prefixes("PUBLIC_ROUTE_PREFIXES", &raw)?;
        }

        if let Some(raw) = lookup("ADMIN_ROUTE_PREFIXES") {
            config.admin_prefixes = parse_prefixes("ADMIN_ROUTE_PREFIXES", &raw)?;
        }

        if let Some(raw) = lookup("BIND_ADDR") {
            config.bind_addr = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("BIND_ADDR", format!("'{raw}' is not a socket address")))?;
        }

        config.bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_EMAIL"),
            lookup("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            (None, None) => None,
            _ => {
                return Err(ConfigError::invalid(
                    "BOOTSTRAP_ADMIN_EMAIL/BOOTSTRAP_ADMIN_PASSWORD",
                    "both must be set and non-empty",
                ));
            }
        };

        Ok(config)
    }

    pub fn has_weak_secret(&self) -> bool {
        self.jwt_secret.len() < RECOMMENDED_SECRET_LEN
    }
}

fn parse_prefixes(name: &'static str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let prefixes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(bad) = prefixes.iter().find(|p| !p.starts_with('/')) {
        return Err(ConfigError::invalid(name, format!("prefix '{bad}' must start with '/'")));
    }

    Ok(prefixes)
}
