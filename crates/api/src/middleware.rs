use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use taskgate_auth::{AuthenticationGate, GateRequest};

use crate::app::errors;
use crate::context::{PrincipalContext, RequestContext};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<AuthenticationGate>,
}

/// Runs the authentication gate in front of every route.
///
/// Admitted requests continue with [`RequestContext`] (and, off public routes,
/// [`PrincipalContext`]) attached; rejected ones are answered here and never
/// reach a handler.
pub async fn auth_middleware(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let request_id = Uuid::now_v7();

    // Owned copies: the request body is not `Sync`, so no borrow of `req`
    // may live across the gate's await.
    let path = req.uri().path().to_string();
    let method = req.method().as_str().to_string();
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let span = tracing::info_span!("request", %request_id, %method, %path);

    async move {
        let outcome = state
            .gate
            .admit(GateRequest {
                path: &path,
                method: &method,
                authorization: authorization.as_deref(),
            })
            .await;

        let mut response = match outcome {
            Ok(admission) => {
                tracing::debug!(
                    access_level = ?admission.level,
                    subject = admission.principal.as_ref().map(|p| p.subject()),
                    "request admitted"
                );

                req.extensions_mut()
                    .insert(RequestContext::new(request_id, admission.level));
                if let Some(principal) = admission.principal {
                    req.extensions_mut().insert(PrincipalContext::new(principal));
                }

                next.run(req).await
            }
            Err(rejection) => {
                tracing::warn!(
                    stage = ?rejection.stage,
                    failure = rejection.failure.kind(),
                    "request rejected"
                );
                errors::auth_failure_response(rejection.failure, Some(&path))
            }
        };

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        response
    }
    .instrument(span)
    .await
}
