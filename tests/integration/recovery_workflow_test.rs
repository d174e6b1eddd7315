//! Recovery Workflow Integration Tests
//!
//! Drives `POST /api/auth/create-account` through the composed router with
//! the real Kratos and team API clients pointed at wiremock servers.

mod support;

use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::StatusCode;
use crux_recovery::DiagnosticEvent;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use support::{
    create_account_request, redirect_signal_body, session_body, TestApp, SETTINGS_URL,
};

// ============================================================================
// Upstream stubs
// ============================================================================

async fn stub_redirect_signal(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path("/self-service/recovery"))
        .and(query_param("flow", "f1"))
        .and(header("cookie", "csrf_token_abc=token"))
        .and(body_json(json!({"method": "code", "code": "123456"})))
        .respond_with(
            ResponseTemplate::new(422)
                .append_header("set-cookie", "csrf_token_abc=rotated; Path=/; HttpOnly")
                .append_header("set-cookie", "ory_kratos_session=xyz; Path=/; HttpOnly")
                .set_body_json(redirect_signal_body()),
        )
        .expect(1)
        .mount(&app.kratos)
        .await;
}

async fn stub_session(app: &TestApp, identity_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/sessions/whoami"))
        .and(header(
            "cookie",
            "csrf_token_abc=rotated; ory_kratos_session=xyz",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(identity_id)))
        .expect(1)
        .mount(&app.kratos)
        .await;
}

async fn stub_identity_recovered(app: &TestApp, identity_id: Uuid) {
    Mock::given(method("PATCH"))
        .and(path(format!("/admin/identities/{}", identity_id)))
        .and(body_json(json!([{
            "op": "replace",
            "path": "/metadata_public",
            "value": {"recovered": "s1"}
        }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": identity_id})))
        .expect(1)
        .mount(&app.kratos)
        .await;
}

async fn stub_invitation(app: &TestApp, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/users/me/invitations/t1"))
        .and(header("cookie", "ory_kratos_session=xyz"))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(&app.teams)
        .await;
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Redirect signal path
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_redirect_signal_completes_recovery_and_accepts_invitation() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();
    stub_redirect_signal(&app).await;
    stub_session(&app, identity_id).await;
    stub_identity_recovered(&app, identity_id).await;
    stub_invitation(&app, 204, 1).await;

    let response = app
        .router
        .clone()
        .oneshot(create_account_request(
            json!({"flow": "f1", "code": "123456", "team": "t1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get(LOCATION).unwrap(), SETTINGS_URL);
    assert_eq!(
        set_cookies(&response),
        vec![
            "csrf_token_abc=rotated; Path=/; HttpOnly".to_string(),
            "ory_kratos_session=xyz; Path=/; HttpOnly".to_string(),
        ]
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
    assert!(app.diagnostics.events().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_invitation_failure_leaves_response_unchanged() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();
    stub_redirect_signal(&app).await;
    stub_session(&app, identity_id).await;
    stub_identity_recovered(&app, identity_id).await;
    stub_invitation(&app, 500, 1).await;

    let response = app
        .router
        .clone()
        .oneshot(create_account_request(
            json!({"flow": "f1", "code": "123456", "team": "t1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get(LOCATION).unwrap(), SETTINGS_URL);
    assert_eq!(set_cookies(&response).len(), 2);

    let events = app.diagnostics.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        DiagnosticEvent::InvitationAcceptanceFailed { team_id, .. } if team_id == "t1"
    ));
}

#[tokio::test]
async fn test_session_lookup_failure_is_relayed_with_cookies() {
    let app = TestApp::new().await;
    stub_redirect_signal(&app).await;
    Mock::given(method("GET"))
        .and(path("/sessions/whoami"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"id": "session_inactive", "code": 401}})),
        )
        .mount(&app.kratos)
        .await;
    stub_invitation(&app, 204, 0).await;

    let response = app
        .router
        .clone()
        .oneshot(create_account_request(
            json!({"flow": "f1", "code": "123456", "team": "t1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(LOCATION).is_none());
    assert_eq!(set_cookies(&response).len(), 2);
}

// ============================================================================
// Terminal answers from the recovery submission
// ============================================================================

#[tokio::test]
async fn test_invalid_code_is_relayed_without_side_effects() {
    let app = TestApp::new().await;
    let payload = json!({
        "id": "f1",
        "state": "sent_email",
        "ui": {"messages": [{"id": 4060006, "type": "error", "text": "The recovery code is invalid or has already been used. Please try again."}]}
    });
    Mock::given(method("POST"))
        .and(path("/self-service/recovery"))
        .respond_with(ResponseTemplate::new(400).set_body_json(payload.clone()))
        .expect(1)
        .mount(&app.kratos)
        .await;
    Mock::given(method("GET"))
        .and(path("/sessions/whoami"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.kratos)
        .await;
    stub_invitation(&app, 204, 0).await;

    let response = app
        .router
        .clone()
        .oneshot(create_account_request(
            json!({"flow": "f1", "code": "000000", "team": "t1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(LOCATION).is_none());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, payload);
}

#[tokio::test]
async fn test_direct_success_is_relayed_verbatim() {
    let app = TestApp::new().await;
    let flow = json!({"id": "f1", "state": "passed_challenge"});
    Mock::given(method("POST"))
        .and(path("/self-service/recovery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flow.clone()))
        .expect(1)
        .mount(&app.kratos)
        .await;
    stub_invitation(&app, 204, 0).await;

    let response = app
        .router
        .clone()
        .oneshot(create_account_request(
            json!({"flow": "f1", "code": "123456", "team": "t1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, flow);
}

#[tokio::test]
async fn test_missing_team_is_rejected_before_kratos() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/self-service/recovery"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.kratos)
        .await;

    let response = app
        .router
        .clone()
        .oneshot(create_account_request(json!({"flow": "f1", "code": "123456"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
