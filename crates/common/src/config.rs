//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Reject recovery submissions that carry no team identifier
    pub recovery_require_team: bool,

    /// Port of the local development server
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let recovery_require_team = match env::var("RECOVERY_REQUIRE_TEAM") {
            Ok(value) => value.parse().map_err(|_| {
                anyhow::anyhow!("RECOVERY_REQUIRE_TEAM must be true or false, got {}", value)
            })?,
            Err(_) => true,
        };

        let config = Self {
            recovery_require_team,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}
