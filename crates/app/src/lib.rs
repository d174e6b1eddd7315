//! Crux application composition root
//!
//! Builds the collaborators from configuration and composes the domain
//! routers into a single application.

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use crux_common::Config;
use crux_kratos::{KratosConfig, KratosServiceFactory};
use crux_recovery::{RecoveryOrchestrator, RecoveryState, TracingDiagnostics};
use crux_teams::{TeamServiceFactory, TeamsConfig};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

/// Maximum accepted request body size
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main application router with all routes
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    let kratos_config = KratosConfig::from_env()?;
    let session_cookie = kratos_config.session_cookie.clone();
    let kratos = KratosServiceFactory::create(kratos_config)?;

    let teams = TeamServiceFactory::create(TeamsConfig::from_env()?)?;

    let orchestrator = RecoveryOrchestrator::new(
        Arc::from(kratos),
        Arc::from(teams),
        Arc::new(TracingDiagnostics),
        session_cookie,
    );

    let recovery_state = RecoveryState {
        orchestrator: Arc::new(orchestrator),
        require_team: config.recovery_require_team,
    };

    Ok(build_router(recovery_state))
}

/// Compose domain routers with shared infrastructure routes
pub fn build_router(recovery_state: RecoveryState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Crux API v0.0.1-SNAPSHOT" }),
        )
        .merge(crux_recovery::routes().with_state(recovery_state))
}

/// CORS layer for a comma separated list of allowed origins
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .expose_headers([header::LOCATION])
        .allow_credentials(true)
}

/// Reject oversized request bodies
pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
