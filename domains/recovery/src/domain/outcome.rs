//! Classification of Kratos' answer to a recovery code submission
//!
//! Kratos reports an accepted code on a browser flow as a 422 error whose
//! payload asks the browser to move on. That shape is turned into
//! `ProviderOutcome::RedirectRequired` here so callers branch on data.

use crux_kratos::{
    CookieHeader, KratosError, RecoveryFlowResponse, BROWSER_LOCATION_CHANGE_REQUIRED,
};
use reqwest::Url;

use crate::domain::error::RecoveryError;

/// Redirect-required answer: where to send the browser, and the cookies
/// Kratos set alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectSignal {
    pub redirect_url: String,
    pub set_cookie: Option<CookieHeader>,
}

impl RedirectSignal {
    /// Id of the settings flow the redirect URL points at.
    pub fn settings_flow(&self) -> Result<String, RecoveryError> {
        flow_of_url(&self.redirect_url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    Success(RecoveryFlowResponse),
    RedirectRequired(RedirectSignal),
    Failure(KratosError),
}

/// Classify the result of a recovery submission.
pub fn classify(result: Result<RecoveryFlowResponse, KratosError>) -> ProviderOutcome {
    match result {
        Ok(response) => ProviderOutcome::Success(response),
        Err(error) => match redirect_signal_of(&error) {
            Some(signal) => ProviderOutcome::RedirectRequired(signal),
            None => ProviderOutcome::Failure(error),
        },
    }
}

fn redirect_signal_of(error: &KratosError) -> Option<RedirectSignal> {
    let KratosError::Api {
        status: 422,
        payload,
        set_cookie,
    } = error
    else {
        return None;
    };

    if payload["error"]["id"].as_str() != Some(BROWSER_LOCATION_CHANGE_REQUIRED) {
        return None;
    }

    let redirect_url = payload["redirect_browser_to"].as_str()?;

    Some(RedirectSignal {
        redirect_url: redirect_url.to_string(),
        set_cookie: set_cookie.clone(),
    })
}

/// Value of the `flow` query parameter of `url`.
pub fn flow_of_url(url: &str) -> Result<String, RecoveryError> {
    let parsed = Url::parse(url).map_err(|e| RecoveryError::InvalidRedirect {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == "flow")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RecoveryError::InvalidRedirect {
            url: url.to_string(),
            reason: "missing flow parameter".to_string(),
        })
}
