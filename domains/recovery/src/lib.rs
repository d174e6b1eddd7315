//! Recovery domain: account recovery completion against Kratos

pub mod api;
pub mod domain;

// Re-export domain types at the crate root for convenience
pub use domain::diagnostics::{
    DiagnosticEvent, RecordingDiagnostics, RecoveryDiagnostics, TracingDiagnostics,
};
pub use domain::error::{RecoveryError, RecoveryFailure};
pub use domain::invitation::InvitationOutcome;
pub use domain::orchestrator::{RecoveryCompletion, RecoveryOrchestrator, RecoverySubmission};
pub use domain::outcome::{classify, flow_of_url, ProviderOutcome, RedirectSignal};
pub use domain::stage::{RecoveryEvent, RecoveryStage, RecoveryStageMachine, StageError};

// Re-export API types
pub use api::routes;
pub use api::RecoveryState;
