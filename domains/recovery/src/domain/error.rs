//! Recovery errors and their HTTP translation

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use crux_common::Error;
use crux_kratos::{CookieNotFound, KratosError};
use thiserror::Error;

use crate::domain::stage::StageError;

#[derive(Debug, Error)]
pub enum RecoveryError {
    /// Kratos rejected the submission; carried unchanged.
    #[error("Recovery submission failed: {0}")]
    Provider(KratosError),

    #[error("Invalid redirect target {url}: {reason}")]
    InvalidRedirect { url: String, reason: String },

    #[error("Session cookie {name} missing from redirect response")]
    MissingSessionCookie { name: String },

    #[error("Session resolution failed: {0}")]
    Session(KratosError),

    #[error("Marking identity as recovered failed: {0}")]
    IdentityRecovered(KratosError),

    #[error(transparent)]
    Stage(#[from] StageError),
}

impl From<CookieNotFound> for RecoveryError {
    fn from(err: CookieNotFound) -> Self {
        RecoveryError::MissingSessionCookie { name: err.0 }
    }
}

impl IntoResponse for RecoveryError {
    fn into_response(self) -> Response {
        // Public API answers are relayed with Kratos' own status and payload
        if let RecoveryError::Provider(KratosError::Api {
            status, payload, ..
        })
        | RecoveryError::Session(KratosError::Api {
            status, payload, ..
        }) = &self
        {
            if let Ok(status) = StatusCode::from_u16(*status) {
                tracing::warn!(error = %self, status = %status, "Relaying Kratos error");
                return (status, Json(payload.clone())).into_response();
            }
        }

        let error = match &self {
            RecoveryError::Stage(_) => Error::Internal(self.to_string()),
            RecoveryError::Provider(KratosError::Configuration(_)) => {
                Error::Internal(self.to_string())
            }
            _ => Error::Upstream(self.to_string()),
        };
        error.into_response()
    }
}

/// Failure of a run, together with the cookies already forwarded to the
/// client before the failing step.
#[derive(Debug)]
pub struct RecoveryFailure {
    pub error: RecoveryError,
    pub forwarded_cookies: HeaderMap,
}

impl From<RecoveryError> for RecoveryFailure {
    fn from(error: RecoveryError) -> Self {
        Self {
            error,
            forwarded_cookies: HeaderMap::new(),
        }
    }
}

impl From<StageError> for RecoveryFailure {
    fn from(error: StageError) -> Self {
        RecoveryError::from(error).into()
    }
}

impl IntoResponse for RecoveryFailure {
    fn into_response(self) -> Response {
        let mut response = self.error.into_response();
        response.headers_mut().extend(self.forwarded_cookies);
        response
    }
}
