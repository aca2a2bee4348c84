use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use thiserror::Error;

use taskgate_auth::{translate, AuthFailure, ErrorBody, PasswordError, StoreError, TokenError};

use crate::app::services::DirectoryError;

/// Failures surfaced by handlers.
///
/// Authentication failures keep their own kind so they render exactly as
/// they would from the gate.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("User not found")]
    UserNotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Render with request context for the failure classes that carry it.
    pub fn into_response_for(self, uri: Option<&str>) -> Response {
        let now = Utc::now();
        let body = match self {
            ApiError::Auth(failure) => translate(failure).to_body(now, uri),
            ApiError::Validation(_) => ErrorBody {
                timestamp: now,
                status: StatusCode::BAD_REQUEST.as_u16(),
                message: self.to_string(),
                details: uri.map(|u| format!("uri={u}")),
            },
            ApiError::Conflict(msg) => ErrorBody {
                timestamp: now,
                status: StatusCode::CONFLICT.as_u16(),
                message: msg,
                details: None,
            },
            ApiError::UserNotFound => ErrorBody {
                timestamp: now,
                status: StatusCode::NOT_FOUND.as_u16(),
                message: self.to_string(),
                details: None,
            },
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                ErrorBody {
                    timestamp: now,
                    status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    message: "An unexpected error occurred".to_string(),
                    details: None,
                }
            }
        };
        body_response(body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_for(None)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "user directory unavailable");
        ApiError::Auth(err.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::DuplicateEmail | DirectoryError::DuplicateLogin => {
                ApiError::Conflict(err.to_string())
            }
            DirectoryError::NotFound => ApiError::UserNotFound,
            DirectoryError::Store(e) => e.into(),
        }
    }
}

/// Response for a request halted by the authentication gate.
pub fn auth_failure_response(failure: AuthFailure, uri: Option<&str>) -> Response {
    body_response(translate(failure).to_body(Utc::now(), uri))
}

fn body_response(body: ErrorBody) -> Response {
    let status = StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}
