use axum::{
    extract::rejection::JsonRejection,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use taskgate_auth::AccessPolicy;

use crate::app::errors::ApiError;
use crate::config::GatewayConfig;

pub mod admin;
pub mod auth;
pub mod system;
pub mod users;

/// Every route the gateway serves. Access levels come from [`access_policy`],
/// not from the router shape.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/users/me", get(users::me))
        .nest("/api/admin", admin::router())
}

/// Route-to-access-level table consulted by the gate.
pub fn access_policy(config: &GatewayConfig) -> AccessPolicy {
    AccessPolicy::from_prefixes(&config.public_prefixes, &config.admin_prefixes)
}

/// Unwrap a JSON body, turning extractor rejections into validation failures.
pub(crate) fn read_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// Render a handler result, attaching the request path to error bodies.
pub(crate) fn respond<T: Serialize>(
    result: Result<T, ApiError>,
    status: StatusCode,
    uri: &Uri,
) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => e.into_response_for(Some(uri.path())),
    }
}
