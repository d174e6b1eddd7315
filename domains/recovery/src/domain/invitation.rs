//! Best-effort invitation acceptance

use crux_kratos::SessionCookie;
use crux_teams::TeamService;

use crate::domain::diagnostics::{DiagnosticEvent, RecoveryDiagnostics};

/// What happened to the invitation. Never an error for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationOutcome {
    Accepted,
    Failed,
    Skipped,
}

/// Accept the invitation to `team_id` with the recovered session cookie.
///
/// Failures are reported to `diagnostics` and otherwise dropped.
pub async fn accept_invitation(
    teams: &dyn TeamService,
    diagnostics: &dyn RecoveryDiagnostics,
    cookie: &SessionCookie,
    team_id: &str,
) -> InvitationOutcome {
    match teams.accept_invitation(cookie, team_id).await {
        Ok(()) => InvitationOutcome::Accepted,
        Err(e) => {
            diagnostics.record(DiagnosticEvent::InvitationAcceptanceFailed {
                team_id: team_id.to_string(),
                error: e.to_string(),
            });
            InvitationOutcome::Failed
        }
    }
}
