//! Crux Kratos Service
//!
//! Client side of the Ory Kratos identity provider:
//! - Recovery flow submission, session lookup, identity metadata updates
//! - Cookie utilities for the `Set-Cookie` headers Kratos returns
//! - Mock Kratos service for testing and development

pub mod client;
pub mod cookie;
pub mod mock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use cookie::{
    extract_named_cookie, forward_cookie, CookieHeader, CookieNotFound, SessionCookie,
};

/// Name of the cookie Kratos stores the session in.
pub const DEFAULT_SESSION_COOKIE: &str = "ory_kratos_session";

/// Error id Kratos uses when a browser flow finished and must continue elsewhere.
pub const BROWSER_LOCATION_CHANGE_REQUIRED: &str = "browser_location_change_required";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KratosError {
    #[error("Kratos configuration error: {0}")]
    Configuration(String),

    #[error("Kratos request error: {0}")]
    Request(String),

    #[error("Kratos response error: {0}")]
    Response(String),

    /// Non-2xx answer from Kratos, kept intact for classification and relay.
    #[error("Kratos API returned {status}")]
    Api {
        status: u16,
        payload: serde_json::Value,
        set_cookie: Option<CookieHeader>,
    },
}

/// Successful answer to a recovery flow submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryFlowResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Kratos identity, as embedded in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub traits: serde_json::Value,
    #[serde(default)]
    pub metadata_public: Option<serde_json::Value>,
}

/// Authenticated Kratos session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub authenticated_at: Option<DateTime<Utc>>,
    pub identity: Identity,
}

/// Kratos service configuration.
#[derive(Debug, Clone)]
pub struct KratosConfig {
    /// Kratos provider (kratos, mock)
    pub provider: String,
    /// Public API base URL
    pub public_url: String,
    /// Admin API base URL
    pub admin_url: String,
    /// Session cookie name
    pub session_cookie: String,
}

impl KratosConfig {
    /// Create Kratos config from environment variables.
    pub fn from_env() -> Result<Self, KratosError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("KRATOS_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let public_url = std::env::var("KRATOS_PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:4433".to_string());
        let admin_url = std::env::var("KRATOS_ADMIN_URL")
            .unwrap_or_else(|_| "http://localhost:4434".to_string());

        let session_cookie = std::env::var("KRATOS_SESSION_COOKIE")
            .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string());

        if session_cookie.is_empty() {
            return Err(KratosError::Configuration(
                "KRATOS_SESSION_COOKIE must not be empty".to_string(),
            ));
        }

        Ok(Self {
            provider,
            public_url,
            admin_url,
            session_cookie,
        })
    }
}

/// Kratos service trait for different implementations.
#[async_trait::async_trait]
pub trait KratosService: Send + Sync {
    /// Submit a recovery code for the given recovery flow.
    async fn update_recovery_flow(
        &self,
        flow_id: &str,
        code: &str,
        cookie: Option<&str>,
    ) -> Result<RecoveryFlowResponse, KratosError>;

    /// Look up the session authenticated by the given `Cookie` header.
    async fn to_session(&self, cookie: &str) -> Result<Session, KratosError>;

    /// Record on the identity that it was recovered into `settings_flow`.
    async fn identity_recovered(
        &self,
        session: &Session,
        settings_flow: &str,
    ) -> Result<(), KratosError>;
}

/// Public metadata of `identity` with the recovery marker applied.
///
/// Applying it twice with the same flow yields the same document.
pub fn recovered_metadata(identity: &Identity, settings_flow: &str) -> serde_json::Value {
    let mut metadata = match &identity.metadata_public {
        Some(serde_json::Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };
    metadata.insert(
        "recovered".to_string(),
        serde_json::Value::String(settings_flow.to_string()),
    );
    serde_json::Value::Object(metadata)
}

/// Factory for creating KratosService implementations.
pub struct KratosServiceFactory;

impl KratosServiceFactory {
    /// Create a KratosService based on configuration.
    pub fn create(config: KratosConfig) -> Result<Box<dyn KratosService>, KratosError> {
        match config.provider.as_str() {
            "kratos" => {
                tracing::info!(public_url = %config.public_url, "Creating Kratos client service");
                Ok(Box::new(client::KratosClient::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock Kratos service");
                Ok(Box::new(mock::MockKratosService::new()))
            }
            provider => Err(KratosError::Configuration(format!(
                "Unknown Kratos provider: {}. Supported providers: kratos, mock",
                provider
            ))),
        }
    }
}
