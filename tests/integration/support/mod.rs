//! Shared fixtures for the recovery integration tests
//!
//! Stands up wiremock servers in place of Kratos and the Crux team API,
//! and wires the real HTTP clients into the application router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::Router;
use crux_kratos::client::KratosClient;
use crux_kratos::{KratosConfig, DEFAULT_SESSION_COOKIE};
use crux_recovery::{RecordingDiagnostics, RecoveryOrchestrator, RecoveryState};
use crux_teams::client::CruxTeamClient;
use crux_teams::TeamsConfig;
use serde_json::json;
use uuid::Uuid;
use wiremock::MockServer;

pub const SETTINGS_URL: &str = "https://app/settings?flow=s1";

/// Application wired against mock upstreams
pub struct TestApp {
    pub kratos: MockServer,
    pub teams: MockServer,
    pub diagnostics: RecordingDiagnostics,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let kratos = MockServer::start().await;
        let teams = MockServer::start().await;
        let diagnostics = RecordingDiagnostics::new();

        let kratos_client = KratosClient::new(KratosConfig {
            provider: "kratos".to_string(),
            public_url: kratos.uri(),
            admin_url: kratos.uri(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
        })
        .expect("valid Kratos config");

        let team_client = CruxTeamClient::new(TeamsConfig {
            provider: "crux".to_string(),
            api_url: teams.uri(),
        });

        let orchestrator = RecoveryOrchestrator::new(
            Arc::new(kratos_client),
            Arc::new(team_client),
            Arc::new(diagnostics.clone()),
            DEFAULT_SESSION_COOKIE,
        );

        let router = crux_app::build_router(RecoveryState {
            orchestrator: Arc::new(orchestrator),
            require_team: true,
        });

        Self {
            kratos,
            teams,
            diagnostics,
            router,
        }
    }
}

/// POST /api/auth/create-account with a browser cookie
pub fn create_account_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/create-account")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "csrf_token_abc=token")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Kratos' 422 answer for an accepted recovery code
pub fn redirect_signal_body() -> serde_json::Value {
    json!({
        "error": {
            "id": "browser_location_change_required",
            "code": 422,
            "status": "Unprocessable Entity",
            "reason": "In order to complete this flow please redirect the browser to: https://app/settings?flow=s1",
            "message": "browser location change required"
        },
        "redirect_browser_to": SETTINGS_URL
    })
}

/// Session JSON for `/sessions/whoami`
pub fn session_body(identity_id: Uuid) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "active": true,
        "authenticated_at": "2024-05-01T10:00:00Z",
        "identity": {
            "id": identity_id,
            "schema_id": "default",
            "traits": {"email": "invitee@example.com"},
            "metadata_public": null
        }
    })
}
