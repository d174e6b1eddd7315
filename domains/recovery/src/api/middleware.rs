//! Recovery domain state

use crate::domain::orchestrator::RecoveryOrchestrator;
use std::sync::Arc;

/// Application state for the Recovery domain
#[derive(Clone)]
pub struct RecoveryState {
    pub orchestrator: Arc<RecoveryOrchestrator>,
    /// Reject submissions without a team before running the orchestrator
    pub require_team: bool,
}
