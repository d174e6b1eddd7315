//! Session hand-off after a redirect signal
//!
//! Both steps are prerequisites of a usable recovered session, so their
//! failures are fatal to the run.

use crux_kratos::{KratosService, Session};

use crate::domain::error::RecoveryError;
use crate::domain::outcome::RedirectSignal;

/// Look up the session Kratos established together with the redirect signal.
pub async fn resolve_session(
    kratos: &dyn KratosService,
    signal: &RedirectSignal,
    session_cookie: &str,
) -> Result<Session, RecoveryError> {
    let cookie = signal
        .set_cookie
        .as_ref()
        .and_then(|header| header.request_cookie())
        .ok_or_else(|| RecoveryError::MissingSessionCookie {
            name: session_cookie.to_string(),
        })?;

    kratos
        .to_session(&cookie)
        .await
        .map_err(RecoveryError::Session)
}

/// Mark the session's identity as recovered into `settings_flow`.
pub async fn mark_recovered(
    kratos: &dyn KratosService,
    session: &Session,
    settings_flow: &str,
) -> Result<(), RecoveryError> {
    kratos
        .identity_recovered(session, settings_flow)
        .await
        .map_err(RecoveryError::IdentityRecovered)
}
