//! Account recovery API handler
//!
//! Implements:
//! - POST /api/auth/create-account — Submit a recovery code and finish recovery

use axum::{
    extract::State,
    http::{header::COOKIE, HeaderMap},
    response::{IntoResponse, Response},
};
use crux_common::{Error, ValidatedJson};
use serde::Deserialize;
use validator::Validate;

use crate::api::middleware::RecoveryState;
use crate::domain::orchestrator::{RecoveryCompletion, RecoverySubmission};

/// Request body for `POST /api/auth/create-account`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Recovery flow id
    #[validate(length(min = 1))]
    pub flow: String,
    /// Recovery code sent to the user
    #[validate(length(min = 1))]
    pub code: String,
    /// Team the user was invited to
    #[serde(default)]
    #[validate(length(min = 1))]
    pub team: Option<String>,
}

/// `Cookie` header of the request, multiple headers joined.
fn cookie_of(headers: &HeaderMap) -> Option<String> {
    let cookies: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

/// POST /api/auth/create-account — Submit a recovery code and finish recovery
pub async fn create_account(
    State(state): State<RecoveryState>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<CreateAccountRequest>,
) -> Result<RecoveryCompletion, Response> {
    if state.require_team && request.team.is_none() {
        return Err(Error::missing_parameter("team").into_response());
    }

    let submission = RecoverySubmission {
        flow_id: request.flow,
        recovery_code: request.code,
        team_id: request.team,
        client_cookie: cookie_of(&headers),
    };

    state
        .orchestrator
        .complete(&submission)
        .await
        .map_err(IntoResponse::into_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes;
    use crate::domain::diagnostics::RecordingDiagnostics;
    use crate::domain::orchestrator::RecoveryOrchestrator;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use crux_kratos::mock::{redirect_signal, KratosCall, MockKratosService};
    use crux_kratos::{CookieHeader, DEFAULT_SESSION_COOKIE};
    use crux_teams::mock::MockTeamService;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(kratos: &MockKratosService, teams: &MockTeamService, require_team: bool) -> Router {
        let orchestrator = RecoveryOrchestrator::new(
            Arc::new(kratos.clone()),
            Arc::new(teams.clone()),
            Arc::new(RecordingDiagnostics::new()),
            DEFAULT_SESSION_COOKIE,
        );
        routes().with_state(RecoveryState {
            orchestrator: Arc::new(orchestrator),
            require_team,
        })
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/create-account")
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, "csrf_token=abc")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_cookie_of_joins_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, "a=1".parse().unwrap());
        headers.append(COOKIE, "b=2".parse().unwrap());
        assert_eq!(cookie_of(&headers).as_deref(), Some("a=1; b=2"));
        assert!(cookie_of(&HeaderMap::new()).is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_create_account_redirects() {
        let kratos = MockKratosService::new().with_recovery_error(redirect_signal(
            "https://app/settings?flow=s1",
            Some(CookieHeader::List(vec![
                "ory_kratos_session=xyz; Path=/".to_string(),
            ])),
        ));
        let teams = MockTeamService::new();

        let response = app(&kratos, &teams, true)
            .oneshot(post(r#"{"flow": "f1", "code": "123456", "team": "t1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://app/settings?flow=s1"
        );
        assert_eq!(
            response.headers().get(SET_COOKIE).unwrap(),
            "ory_kratos_session=xyz; Path=/"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());

        assert_eq!(
            kratos.calls()[0],
            KratosCall::UpdateRecoveryFlow {
                flow_id: "f1".to_string(),
                code: "123456".to_string(),
                cookie: Some("csrf_token=abc".to_string()),
            }
        );
        assert_eq!(teams.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_team_rejected_when_required() {
        let kratos = MockKratosService::new();
        let teams = MockTeamService::new();

        let response = app(&kratos, &teams, true)
            .oneshot(post(r#"{"flow": "f1", "code": "123456"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(kratos.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_team_allowed_when_relaxed() {
        let kratos = MockKratosService::new()
            .with_recovery_response(200, serde_json::json!({"state": "passed_challenge"}));
        let teams = MockTeamService::new();

        let response = app(&kratos, &teams, false)
            .oneshot(post(r#"{"flow": "f1", "code": "123456"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(kratos.calls().len(), 1);
        assert!(teams.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_code_rejected() {
        let kratos = MockKratosService::new();
        let teams = MockTeamService::new();

        let response = app(&kratos, &teams, true)
            .oneshot(post(r#"{"flow": "f1", "code": "", "team": "t1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(kratos.calls().is_empty());
    }
}
