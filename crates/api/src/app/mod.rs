//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: user directory and account flows
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router};

use taskgate_auth::{AuthenticationGate, TokenCodec};

use crate::config::GatewayConfig;
use crate::middleware::{self, GateState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{AppServices, UserDirectory};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &GatewayConfig) -> anyhow::Result<Router> {
    build_app_with_directory(config, Arc::new(UserDirectory::new())).await
}

/// Same as [`build_app`], over a caller-supplied directory.
pub async fn build_app_with_directory(
    config: &GatewayConfig,
    directory: Arc<UserDirectory>,
) -> anyhow::Result<Router> {
    let codec = Arc::new(TokenCodec::new(&config.jwt_secret, config.token_ttl));
    let services = Arc::new(AppServices::new(directory, codec.clone()));

    if let Some(admin) = &config.bootstrap_admin {
        services
            .bootstrap_admin(admin)
            .await
            .context("failed to seed bootstrap admin")?;
    }

    let policy = Arc::new(routes::access_policy(config));
    let gate = Arc::new(AuthenticationGate::new(
        codec,
        services.validator.clone(),
        policy,
    ));

    // The gate wraps every route, including the fallback; public paths are
    // let through by the policy, not by routing.
    Ok(routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            GateState { gate },
            middleware::auth_middleware,
        )))
}
