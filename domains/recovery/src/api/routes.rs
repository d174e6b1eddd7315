//! Route definitions for Recovery domain API

use axum::{routing::post, Router};

use super::handlers::recovery;
use super::middleware::RecoveryState;

/// Create all Recovery domain API routes
pub fn routes() -> Router<RecoveryState> {
    Router::new().route("/api/auth/create-account", post(recovery::create_account))
}
