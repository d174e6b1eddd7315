//! Mock Kratos Service Implementation
//!
//! Scriptable in-memory stand-in for Kratos. Records every call for test
//! assertions. Thread-safe via `Arc<Mutex<>>`.

use std::sync::{Arc, Mutex};

use serde_json::json;
use uuid::Uuid;

use crate::{
    CookieHeader, Identity, KratosError, KratosService, RecoveryFlowResponse, Session,
    BROWSER_LOCATION_CHANGE_REQUIRED,
};

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum KratosCall {
    UpdateRecoveryFlow {
        flow_id: String,
        code: String,
        cookie: Option<String>,
    },
    ToSession {
        cookie: String,
    },
    IdentityRecovered {
        identity_id: Uuid,
        settings_flow: String,
    },
}

#[derive(Debug)]
struct MockState {
    recovery: Result<RecoveryFlowResponse, KratosError>,
    session: Result<Session, KratosError>,
    identity_recovered: Result<(), KratosError>,
    calls: Vec<KratosCall>,
}

/// Mock Kratos service with scripted answers.
#[derive(Debug, Clone)]
pub struct MockKratosService {
    state: Arc<Mutex<MockState>>,
}

/// The error Kratos raises when a recovery code was accepted and the
/// browser has to continue at `redirect_to`.
pub fn redirect_signal(redirect_to: &str, set_cookie: Option<CookieHeader>) -> KratosError {
    let reason = format!(
        "In order to complete this flow please redirect the browser to: {}",
        redirect_to
    );
    KratosError::Api {
        status: 422,
        payload: json!({
            "error": {
                "id": BROWSER_LOCATION_CHANGE_REQUIRED,
                "code": 422,
                "status": "Unprocessable Entity",
                "reason": reason,
                "message": "browser location change required"
            },
            "redirect_browser_to": redirect_to
        }),
        set_cookie,
    }
}

/// A plausible session for a freshly generated identity.
pub fn sample_session() -> Session {
    Session {
        id: Uuid::new_v4(),
        active: Some(true),
        authenticated_at: Some(chrono::Utc::now()),
        identity: Identity {
            id: Uuid::new_v4(),
            traits: json!({"email": "user@example.com"}),
            metadata_public: None,
        },
    }
}

impl MockKratosService {
    /// Create a mock that accepts every recovery code directly.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                recovery: Ok(RecoveryFlowResponse {
                    status: 200,
                    body: json!({"state": "passed_challenge"}),
                }),
                session: Ok(sample_session()),
                identity_recovered: Ok(()),
                calls: Vec::new(),
            })),
        }
    }

    fn with_state(self, f: impl FnOnce(&mut MockState)) -> Self {
        {
            let mut state = self
                .state
                .lock()
                .expect("kratos mock lock poisoned — prior test panicked");
            f(&mut *state);
        }
        self
    }

    /// Answer recovery submissions with a direct success.
    pub fn with_recovery_response(self, status: u16, body: serde_json::Value) -> Self {
        self.with_state(|s| s.recovery = Ok(RecoveryFlowResponse { status, body }))
    }

    /// Answer recovery submissions with an error.
    pub fn with_recovery_error(self, error: KratosError) -> Self {
        self.with_state(|s| s.recovery = Err(error))
    }

    /// Answer session lookups with `session`.
    pub fn with_session(self, session: Session) -> Self {
        self.with_state(|s| s.session = Ok(session))
    }

    /// Fail session lookups.
    pub fn with_session_error(self, error: KratosError) -> Self {
        self.with_state(|s| s.session = Err(error))
    }

    /// Fail identity-recovered notifications.
    pub fn with_identity_recovered_error(self, error: KratosError) -> Self {
        self.with_state(|s| s.identity_recovered = Err(error))
    }

    /// Return all recorded calls.
    pub fn calls(&self) -> Vec<KratosCall> {
        self.state
            .lock()
            .expect("kratos mock lock poisoned — prior test panicked")
            .calls
            .clone()
    }

    fn record(&self, call: KratosCall) -> Result<std::sync::MutexGuard<'_, MockState>, KratosError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| KratosError::Request(format!("kratos mock lock poisoned: {e}")))?;
        state.calls.push(call);
        Ok(state)
    }
}

impl Default for MockKratosService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KratosService for MockKratosService {
    async fn update_recovery_flow(
        &self,
        flow_id: &str,
        code: &str,
        cookie: Option<&str>,
    ) -> Result<RecoveryFlowResponse, KratosError> {
        tracing::debug!(flow_id = %flow_id, "Mock Kratos: recovery flow submitted");
        let state = self.record(KratosCall::UpdateRecoveryFlow {
            flow_id: flow_id.to_string(),
            code: code.to_string(),
            cookie: cookie.map(str::to_string),
        })?;
        state.recovery.clone()
    }

    async fn to_session(&self, cookie: &str) -> Result<Session, KratosError> {
        tracing::debug!("Mock Kratos: session lookup");
        let state = self.record(KratosCall::ToSession {
            cookie: cookie.to_string(),
        })?;
        state.session.clone()
    }

    async fn identity_recovered(
        &self,
        session: &Session,
        settings_flow: &str,
    ) -> Result<(), KratosError> {
        tracing::debug!(identity_id = %session.identity.id, "Mock Kratos: identity recovered");
        let state = self.record(KratosCall::IdentityRecovered {
            identity_id: session.identity.id,
            settings_flow: settings_flow.to_string(),
        })?;
        state.identity_recovered.clone()
    }
}
