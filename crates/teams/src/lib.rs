//! Crux Team Service
//!
//! Acts on the Crux team API on behalf of a user session:
//! - Invitation acceptance over authenticated HTTP
//! - Mock team service for testing and development

pub mod client;
pub mod mock;

use crux_kratos::SessionCookie;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TeamError {
    #[error("Team service configuration error: {0}")]
    Configuration(String),

    #[error("Team service request error: {0}")]
    Request(String),

    #[error("Team service returned {status}: {body}")]
    Response { status: u16, body: String },
}

/// Team service configuration.
#[derive(Debug, Clone)]
pub struct TeamsConfig {
    /// Team service provider (crux, mock)
    pub provider: String,
    /// Base URL of the Crux API
    pub api_url: String,
}

impl TeamsConfig {
    /// Create team service config from environment variables.
    pub fn from_env() -> Result<Self, TeamError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("TEAMS_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let api_url = std::env::var("CRUX_API_URL").unwrap_or_default();

        if provider != "mock" && api_url.is_empty() {
            return Err(TeamError::Configuration(
                "CRUX_API_URL is required for crux provider".to_string(),
            ));
        }

        Ok(Self { provider, api_url })
    }
}

/// Team service trait for different implementations.
#[async_trait::async_trait]
pub trait TeamService: Send + Sync {
    /// Accept the pending invitation to `team_id` for the session owner.
    async fn accept_invitation(
        &self,
        cookie: &SessionCookie,
        team_id: &str,
    ) -> Result<(), TeamError>;
}

/// Factory for creating TeamService implementations.
pub struct TeamServiceFactory;

impl TeamServiceFactory {
    /// Create a TeamService based on configuration.
    pub fn create(config: TeamsConfig) -> Result<Box<dyn TeamService>, TeamError> {
        match config.provider.as_str() {
            "crux" => {
                tracing::info!(api_url = %config.api_url, "Creating Crux team service");
                if config.api_url.is_empty() {
                    return Err(TeamError::Configuration(
                        "CRUX_API_URL is required for crux provider".to_string(),
                    ));
                }
                Ok(Box::new(client::CruxTeamClient::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock team service");
                Ok(Box::new(mock::MockTeamService::new()))
            }
            provider => Err(TeamError::Configuration(format!(
                "Unknown team service provider: {}. Supported providers: crux, mock",
                provider
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_rejects_crux_without_url() {
        let config = TeamsConfig {
            provider: "crux".to_string(),
            api_url: String::new(),
        };
        assert!(TeamServiceFactory::create(config).is_err());
    }

    #[test]
    fn test_factory_crux_succeeds() {
        let config = TeamsConfig {
            provider: "crux".to_string(),
            api_url: "http://localhost:1848".to_string(),
        };
        assert!(TeamServiceFactory::create(config).is_ok());
    }

    #[test]
    fn test_factory_mock_succeeds() {
        let config = TeamsConfig {
            provider: "mock".to_string(),
            api_url: String::new(),
        };
        assert!(TeamServiceFactory::create(config).is_ok());
    }

    #[test]
    fn test_factory_unknown_provider() {
        let config = TeamsConfig {
            provider: "ldap".to_string(),
            api_url: String::new(),
        };
        let err = match TeamServiceFactory::create(config) {
            Err(e) => e,
            Ok(_) => panic!("Expected error for unknown provider"),
        };
        assert!(err
            .to_string()
            .contains("Unknown team service provider: ldap"));
    }

    #[test]
    fn test_error_display() {
        let err = TeamError::Response {
            status: 404,
            body: "invitation not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Team service returned 404: invitation not found"
        );
    }
}
