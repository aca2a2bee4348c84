use std::sync::Arc;

use axum::{
    extract::{Extension, OriginalUri},
    http::StatusCode,
    response::Response,
};

use crate::app::dto::UserView;
use crate::app::errors::ApiError;
use crate::app::routes::respond;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// GET /api/users/me
///
/// Reads the live record; the role shown is the one the gate just checked.
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let result = services
        .directory
        .get(principal.subject())
        .map_err(ApiError::from)
        .and_then(|user| user.as_ref().map(UserView::from).ok_or(ApiError::UserNotFound));
    respond(result, StatusCode::OK, &uri)
}
