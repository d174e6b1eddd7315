//! Crux Team API HTTP Client Implementation
//!
//! POSTs to `{api_url}/api/users/me/invitations/{team_id}` with the
//! user's session cookie.

use crux_kratos::SessionCookie;
use reqwest::{header, Url};

use crate::{TeamError, TeamService, TeamsConfig};

/// Real HTTP client for the Crux team API.
pub struct CruxTeamClient {
    http: reqwest::Client,
    api_url: String,
}

impl CruxTeamClient {
    /// Create a new team API client from configuration.
    pub fn new(config: TeamsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    /// `team_id` is pushed as a single percent-encoded path segment.
    fn invitation_url(&self, team_id: &str) -> Result<Url, TeamError> {
        let mut url = Url::parse(&self.api_url).map_err(|e| {
            TeamError::Configuration(format!("CRUX_API_URL is not a valid URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                TeamError::Configuration("CRUX_API_URL cannot be a base URL".to_string())
            })?
            .pop_if_empty()
            .extend(["api", "users", "me", "invitations"])
            .push(team_id);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl TeamService for CruxTeamClient {
    async fn accept_invitation(
        &self,
        cookie: &SessionCookie,
        team_id: &str,
    ) -> Result<(), TeamError> {
        let response = self
            .http
            .post(self.invitation_url(team_id)?)
            .header(header::COOKIE, cookie.pair())
            .send()
            .await
            .map_err(|e| TeamError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(TeamError::Response { status, body });
        }

        tracing::debug!(team_id = %team_id, "Invitation accepted");
        Ok(())
    }
}
