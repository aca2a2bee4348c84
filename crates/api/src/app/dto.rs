use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskgate_auth::{Role, Token};

use crate::app::services::UserRecord;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub login: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub login: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        let expires_at = token.expires_at();
        Self {
            token: token.into_string(),
            token_type: "Bearer",
            expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub login: String,
    pub email: String,
    pub role: Role,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            login: user.login.clone(),
            email: user.email.clone(),
            role: user.role,
            blocked: user.blocked,
            created_at: user.created_at,
        }
    }
}
