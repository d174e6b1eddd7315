//! Recovery completion orchestrator
//!
//! Submits the recovery code to Kratos and, when Kratos answers with a
//! redirect signal, hands the new session over to the settings flow:
//! forward cookies, resolve the session, mark the identity as recovered,
//! try to accept the pending team invitation, answer 201 with `Location`.

use std::sync::Arc;

use axum::{
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use crux_kratos::{
    extract_named_cookie, forward_cookie, KratosService, RecoveryFlowResponse, SessionCookie,
};
use crux_teams::TeamService;

use crate::domain::diagnostics::RecoveryDiagnostics;
use crate::domain::error::{RecoveryError, RecoveryFailure};
use crate::domain::invitation::{accept_invitation, InvitationOutcome};
use crate::domain::outcome::{classify, ProviderOutcome, RedirectSignal};
use crate::domain::session::{mark_recovered, resolve_session};
use crate::domain::stage::{RecoveryEvent, RecoveryRun};

/// A recovery code submission.
#[derive(Debug, Clone)]
pub struct RecoverySubmission {
    pub flow_id: String,
    pub recovery_code: String,
    /// Team whose pending invitation should be accepted once recovered
    pub team_id: Option<String>,
    /// `Cookie` header of the inbound request
    pub client_cookie: Option<String>,
}

/// What the client receives when a run completes.
#[derive(Debug)]
pub enum RecoveryCompletion {
    /// Kratos answered directly; status and body are relayed as-is.
    Relayed(RecoveryFlowResponse),
    /// Recovery accepted; the browser continues at `location`.
    Redirect {
        location: HeaderValue,
        cookies: HeaderMap,
    },
}

impl IntoResponse for RecoveryCompletion {
    fn into_response(self) -> Response {
        match self {
            RecoveryCompletion::Relayed(RecoveryFlowResponse { status, body }) => {
                let Ok(status) = StatusCode::from_u16(status) else {
                    tracing::error!(status, "Kratos returned an invalid status code");
                    return StatusCode::BAD_GATEWAY.into_response();
                };
                if body.is_null() {
                    status.into_response()
                } else {
                    (status, Json(body)).into_response()
                }
            }
            RecoveryCompletion::Redirect {
                location,
                mut cookies,
            } => {
                cookies.insert(LOCATION, location);
                (StatusCode::CREATED, cookies).into_response()
            }
        }
    }
}

/// Drives one recovery submission to completion.
///
/// Stateless apart from its collaborators, which are shared between runs.
#[derive(Clone)]
pub struct RecoveryOrchestrator {
    kratos: Arc<dyn KratosService>,
    teams: Arc<dyn TeamService>,
    diagnostics: Arc<dyn RecoveryDiagnostics>,
    session_cookie: String,
}

impl RecoveryOrchestrator {
    pub fn new(
        kratos: Arc<dyn KratosService>,
        teams: Arc<dyn TeamService>,
        diagnostics: Arc<dyn RecoveryDiagnostics>,
        session_cookie: impl Into<String>,
    ) -> Self {
        Self {
            kratos,
            teams,
            diagnostics,
            session_cookie: session_cookie.into(),
        }
    }

    pub async fn complete(
        &self,
        submission: &RecoverySubmission,
    ) -> Result<RecoveryCompletion, RecoveryFailure> {
        let mut run = RecoveryRun::new(&submission.flow_id);

        let result = self
            .kratos
            .update_recovery_flow(
                &submission.flow_id,
                &submission.recovery_code,
                submission.client_cookie.as_deref(),
            )
            .await;

        let signal = match classify(result) {
            ProviderOutcome::Success(response) => {
                run.advance(RecoveryEvent::ProviderAccepted)?;
                tracing::info!(flow_id = %submission.flow_id, status = response.status, "Recovery flow answered directly");
                return Ok(RecoveryCompletion::Relayed(response));
            }
            ProviderOutcome::Failure(error) => {
                run.advance(RecoveryEvent::ProviderRejected)?;
                tracing::warn!(flow_id = %submission.flow_id, error = %error, "Recovery submission rejected");
                return Err(RecoveryError::Provider(error).into());
            }
            ProviderOutcome::RedirectRequired(signal) => {
                run.advance(RecoveryEvent::RedirectSignalled)?;
                signal
            }
        };

        let mut cookies = HeaderMap::new();
        forward_cookie(signal.set_cookie.as_ref(), &mut cookies);

        match self.hand_over(&mut run, submission, &signal).await {
            Ok(location) => {
                tracing::info!(
                    flow_id = %submission.flow_id,
                    location = %signal.redirect_url,
                    "Recovery completed, redirecting to settings"
                );
                Ok(RecoveryCompletion::Redirect { location, cookies })
            }
            Err(error) => {
                tracing::error!(
                    flow_id = %submission.flow_id,
                    stage = %run.stage(),
                    error = %error,
                    "Recovery hand-over failed"
                );
                Err(RecoveryFailure {
                    error,
                    forwarded_cookies: cookies,
                })
            }
        }
    }

    /// Redirect path after cookies were forwarded. Returns the `Location` value.
    async fn hand_over(
        &self,
        run: &mut RecoveryRun,
        submission: &RecoverySubmission,
        signal: &RedirectSignal,
    ) -> Result<HeaderValue, RecoveryError> {
        let settings_flow = signal.settings_flow()?;
        let location =
            HeaderValue::from_str(&signal.redirect_url).map_err(|e| RecoveryError::InvalidRedirect {
                url: signal.redirect_url.clone(),
                reason: e.to_string(),
            })?;

        let session_cookie = self.session_cookie_of(signal)?;
        run.advance(RecoveryEvent::CookieExtracted)?;

        let session = resolve_session(self.kratos.as_ref(), signal, &self.session_cookie).await?;
        run.advance(RecoveryEvent::SessionFound)?;

        mark_recovered(self.kratos.as_ref(), &session, &settings_flow).await?;
        run.advance(RecoveryEvent::IdentityMarked)?;

        let invitation = match &submission.team_id {
            Some(team_id) => {
                accept_invitation(
                    self.teams.as_ref(),
                    self.diagnostics.as_ref(),
                    &session_cookie,
                    team_id,
                )
                .await
            }
            None => InvitationOutcome::Skipped,
        };
        tracing::debug!(flow_id = %submission.flow_id, ?invitation, "Invitation step finished");
        run.advance(RecoveryEvent::InvitationHandled)?;

        run.advance(RecoveryEvent::Responded)?;
        Ok(location)
    }

    fn session_cookie_of(&self, signal: &RedirectSignal) -> Result<SessionCookie, RecoveryError> {
        let header = signal
            .set_cookie
            .as_ref()
            .ok_or_else(|| RecoveryError::MissingSessionCookie {
                name: self.session_cookie.clone(),
            })?;
        Ok(extract_named_cookie(header, &self.session_cookie)?)
    }
}
