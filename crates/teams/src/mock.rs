//! Mock Team Service Implementation
//!
//! Records invitation acceptances for test assertions and can be
//! scripted to fail. Thread-safe via `Arc<Mutex<>>`.

use std::sync::{Arc, Mutex};

use crux_kratos::SessionCookie;

use crate::{TeamError, TeamService};

/// An invitation acceptance received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedInvitation {
    /// Raw session cookie the call was authenticated with
    pub cookie: String,
    pub team_id: String,
}

#[derive(Debug, Default)]
struct MockState {
    failure: Option<TeamError>,
    calls: Vec<AcceptedInvitation>,
}

/// Mock team service that records invitation acceptances.
#[derive(Debug, Clone, Default)]
pub struct MockTeamService {
    state: Arc<Mutex<MockState>>,
}

impl MockTeamService {
    /// Create a mock that accepts every invitation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails every invitation with `error`.
    pub fn failing(error: TeamError) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                failure: Some(error),
                calls: Vec::new(),
            })),
        }
    }

    /// Return all recorded calls.
    pub fn calls(&self) -> Vec<AcceptedInvitation> {
        self.state
            .lock()
            .expect("team mock lock poisoned — prior test panicked")
            .calls
            .clone()
    }
}

#[async_trait::async_trait]
impl TeamService for MockTeamService {
    async fn accept_invitation(
        &self,
        cookie: &SessionCookie,
        team_id: &str,
    ) -> Result<(), TeamError> {
        tracing::debug!(team_id = %team_id, "Mock team service: accepting invitation");
        let mut state = self
            .state
            .lock()
            .map_err(|e| TeamError::Request(format!("team mock lock poisoned: {e}")))?;
        state.calls.push(AcceptedInvitation {
            cookie: cookie.as_str().to_string(),
            team_id: team_id.to_string(),
        });
        match &state.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
