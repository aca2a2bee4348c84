//! Admin routes for account management.
//!
//! Every change lands on the live record, so it takes effect on the affected
//! user's next request without touching tokens already issued.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, OriginalUri, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

use taskgate_auth::Role;

use crate::app::dto::{CreateUserRequest, UserView};
use crate::app::errors::ApiError;
use crate::app::routes::{read_json, respond};
use crate::app::services::{AppServices, DirectoryError};
use crate::context::PrincipalContext;

// -------------------------
// Router
// -------------------------

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:email", delete(delete_user))
        .route("/users/:email/block", post(block_user))
        .route("/users/:email/unblock", post(unblock_user))
        .route("/users/:email/make-admin", post(make_admin))
        .route("/users/:email/make-user", post(make_user))
}

// -------------------------
// Handlers
// -------------------------

/// GET /api/admin/users
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let result = services
        .directory
        .list()
        .map(|users| users.iter().map(UserView::from).collect::<Vec<_>>())
        .map_err(ApiError::from);
    respond(result, StatusCode::OK, &uri)
}

/// POST /api/admin/users
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<PrincipalContext>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    let result = match read_json(payload) {
        Ok(req) => services.create_user(req).await.map(|user| {
            tracing::info!(actor = actor.subject(), subject = %user.email, role = %user.role, "user created");
            UserView::from(&user)
        }),
        Err(e) => Err(e),
    };
    respond(result, StatusCode::CREATED, &uri)
}

/// DELETE /api/admin/users/:email
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<PrincipalContext>,
    OriginalUri(uri): OriginalUri,
    Path(email): Path<String>,
) -> Response {
    apply(&actor, &email, "delete", &uri, || services.directory.remove(&email).map(|_| ()))
}

/// POST /api/admin/users/:email/block
pub async fn block_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<PrincipalContext>,
    OriginalUri(uri): OriginalUri,
    Path(email): Path<String>,
) -> Response {
    apply(&actor, &email, "block", &uri, || services.directory.set_blocked(&email, true))
}

/// POST /api/admin/users/:email/unblock
pub async fn unblock_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<PrincipalContext>,
    OriginalUri(uri): OriginalUri,
    Path(email): Path<String>,
) -> Response {
    apply(&actor, &email, "unblock", &uri, || services.directory.set_blocked(&email, false))
}

/// POST /api/admin/users/:email/make-admin
pub async fn make_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<PrincipalContext>,
    OriginalUri(uri): OriginalUri,
    Path(email): Path<String>,
) -> Response {
    apply(&actor, &email, "make-admin", &uri, || services.directory.set_role(&email, Role::Admin))
}

/// POST /api/admin/users/:email/make-user
pub async fn make_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<PrincipalContext>,
    OriginalUri(uri): OriginalUri,
    Path(email): Path<String>,
) -> Response {
    apply(&actor, &email, "make-user", &uri, || services.directory.set_role(&email, Role::User))
}

fn apply(
    actor: &PrincipalContext,
    email: &str,
    action: &'static str,
    uri: &axum::http::Uri,
    change: impl FnOnce() -> Result<(), DirectoryError>,
) -> Response {
    match change() {
        Ok(()) => {
            tracing::info!(actor = actor.subject(), subject = email, action, "user updated");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => ApiError::from(e).into_response_for(Some(uri.path())),
    }
}
