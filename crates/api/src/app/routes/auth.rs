//! Public account routes: registration and login.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, OriginalUri},
    http::StatusCode,
    response::Response,
    Json,
};

use crate::app::dto::{LoginRequest, RegisterRequest, TokenResponse};
use crate::app::routes::{read_json, respond};
use crate::app::services::AppServices;

/// POST /api/auth/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let result = match read_json(payload) {
        Ok(req) => services.register(req).await.map(TokenResponse::from),
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK, &uri)
}

/// POST /api/auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let result = match read_json(payload) {
        Ok(req) => services
            .login(&req.email, &req.password)
            .await
            .map(TokenResponse::from),
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK, &uri)
}
