//! State machine for a single recovery completion run
//!
//! A run starts in `Submitting`. The provider's answer moves it to one of
//! `Succeeded`, `Failed` or `RedirectPending`; the redirect path then walks
//! `CookieRecovered → SessionResolved → IdentityMarked →
//! InvitationAttempted → Completed`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during stage transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StageError {
    #[error("Invalid transition: cannot leave {from} via {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    Submitting,
    Succeeded,
    Failed,
    RedirectPending,
    CookieRecovered,
    SessionResolved,
    IdentityMarked,
    InvitationAttempted,
    Completed,
}

impl RecoveryStage {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Completed)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [RecoveryStage] {
        match self {
            Self::Submitting => &[Self::Succeeded, Self::Failed, Self::RedirectPending],
            Self::RedirectPending => &[Self::CookieRecovered],
            Self::CookieRecovered => &[Self::SessionResolved],
            Self::SessionResolved => &[Self::IdentityMarked],
            Self::IdentityMarked => &[Self::InvitationAttempted],
            Self::InvitationAttempted => &[Self::Completed],
            Self::Succeeded | Self::Failed | Self::Completed => &[],
        }
    }
}

impl std::fmt::Display for RecoveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitting => write!(f, "submitting"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::RedirectPending => write!(f, "redirect_pending"),
            Self::CookieRecovered => write!(f, "cookie_recovered"),
            Self::SessionResolved => write!(f, "session_resolved"),
            Self::IdentityMarked => write!(f, "identity_marked"),
            Self::InvitationAttempted => write!(f, "invitation_attempted"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Events that move a run forward
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryEvent {
    /// Provider accepted the code and answered directly
    ProviderAccepted,
    /// Provider rejected the submission
    ProviderRejected,
    /// Provider asked for a browser redirect
    RedirectSignalled,
    /// Session cookie isolated from the redirect response
    CookieExtracted,
    /// Session looked up with the redirect response's cookies
    SessionFound,
    /// Identity marked as recovered
    IdentityMarked,
    /// Invitation acceptance attempted or skipped
    InvitationHandled,
    /// Redirect response built
    Responded,
}

impl std::fmt::Display for RecoveryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderAccepted => write!(f, "provider_accepted"),
            Self::ProviderRejected => write!(f, "provider_rejected"),
            Self::RedirectSignalled => write!(f, "redirect_signalled"),
            Self::CookieExtracted => write!(f, "cookie_extracted"),
            Self::SessionFound => write!(f, "session_found"),
            Self::IdentityMarked => write!(f, "identity_marked"),
            Self::InvitationHandled => write!(f, "invitation_handled"),
            Self::Responded => write!(f, "responded"),
        }
    }
}

pub struct RecoveryStageMachine;

impl RecoveryStageMachine {
    /// Attempt to transition from current stage via event
    pub fn transition(
        current: RecoveryStage,
        event: RecoveryEvent,
    ) -> Result<RecoveryStage, StageError> {
        if current.is_terminal() {
            return Err(StageError::TerminalState(current.to_string()));
        }

        let next = match (current, event) {
            (RecoveryStage::Submitting, RecoveryEvent::ProviderAccepted) => RecoveryStage::Succeeded,
            (RecoveryStage::Submitting, RecoveryEvent::ProviderRejected) => RecoveryStage::Failed,
            (RecoveryStage::Submitting, RecoveryEvent::RedirectSignalled) => {
                RecoveryStage::RedirectPending
            }
            (RecoveryStage::RedirectPending, RecoveryEvent::CookieExtracted) => {
                RecoveryStage::CookieRecovered
            }
            (RecoveryStage::CookieRecovered, RecoveryEvent::SessionFound) => {
                RecoveryStage::SessionResolved
            }
            (RecoveryStage::SessionResolved, RecoveryEvent::IdentityMarked) => {
                RecoveryStage::IdentityMarked
            }
            (RecoveryStage::IdentityMarked, RecoveryEvent::InvitationHandled) => {
                RecoveryStage::InvitationAttempted
            }
            (RecoveryStage::InvitationAttempted, RecoveryEvent::Responded) => {
                RecoveryStage::Completed
            }
            _ => {
                return Err(StageError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}

/// Stage tracker for one orchestration run.
#[derive(Debug)]
pub struct RecoveryRun {
    flow_id: String,
    stage: RecoveryStage,
}

impl RecoveryRun {
    pub fn new(flow_id: &str) -> Self {
        Self {
            flow_id: flow_id.to_string(),
            stage: RecoveryStage::Submitting,
        }
    }

    pub fn stage(&self) -> RecoveryStage {
        self.stage
    }

    pub fn advance(&mut self, event: RecoveryEvent) -> Result<RecoveryStage, StageError> {
        let next = RecoveryStageMachine::transition(self.stage, event)?;
        tracing::debug!(
            flow_id = %self.flow_id,
            from = %self.stage,
            to = %next,
            "Recovery stage transition"
        );
        self.stage = next;
        Ok(next)
    }
}
