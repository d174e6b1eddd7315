//! Kratos HTTP Client Implementation
//!
//! Talks to the Kratos public API for recovery flows and sessions, and to
//! the admin API for identity updates.

use reqwest::{header, Response, Url};
use serde_json::json;

use crate::{
    recovered_metadata, CookieHeader, KratosConfig, KratosError, KratosService,
    RecoveryFlowResponse, Session,
};

/// Real Kratos HTTP client.
pub struct KratosClient {
    http: reqwest::Client,
    public_url: Url,
    admin_url: Url,
}

impl KratosClient {
    /// Create a new Kratos client from configuration.
    pub fn new(config: KratosConfig) -> Result<Self, KratosError> {
        Ok(Self {
            http: reqwest::Client::new(),
            public_url: parse_base_url("KRATOS_PUBLIC_URL", &config.public_url)?,
            admin_url: parse_base_url("KRATOS_ADMIN_URL", &config.admin_url)?,
        })
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url, KratosError> {
        base.join(path)
            .map_err(|e| KratosError::Configuration(format!("Invalid Kratos path {}: {}", path, e)))
    }
}

fn parse_base_url(name: &str, raw: &str) -> Result<Url, KratosError> {
    // Url::join drops the last path segment unless the base ends with '/'
    let normalized = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|e| KratosError::Configuration(format!("{} is not a valid URL: {}", name, e)))
}

/// Turn a non-2xx response into `KratosError::Api`, keeping its cookies.
async fn api_error(response: Response) -> KratosError {
    let status = response.status().as_u16();
    let set_cookie = CookieHeader::from_headers(response.headers());
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read response body".to_string());
    let payload = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

    KratosError::Api {
        status,
        payload,
        set_cookie,
    }
}

#[async_trait::async_trait]
impl KratosService for KratosClient {
    async fn update_recovery_flow(
        &self,
        flow_id: &str,
        code: &str,
        cookie: Option<&str>,
    ) -> Result<RecoveryFlowResponse, KratosError> {
        let url = Self::endpoint(&self.public_url, "self-service/recovery")?;

        let mut request = self
            .http
            .post(url)
            .query(&[("flow", flow_id)])
            .header(header::ACCEPT, "application/json")
            .json(&json!({ "method": "code", "code": code }));
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| KratosError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| KratosError::Response(e.to_string()))?;
        let body = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| KratosError::Response(format!("Invalid recovery flow body: {}", e)))?
        };

        tracing::debug!(flow_id = %flow_id, status, "Recovery flow updated");
        Ok(RecoveryFlowResponse { status, body })
    }

    async fn to_session(&self, cookie: &str) -> Result<Session, KratosError> {
        let url = Self::endpoint(&self.public_url, "sessions/whoami")?;

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::COOKIE, cookie)
            .send()
            .await
            .map_err(|e| KratosError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .json::<Session>()
            .await
            .map_err(|e| KratosError::Response(format!("Failed to parse session: {}", e)))
    }

    async fn identity_recovered(
        &self,
        session: &Session,
        settings_flow: &str,
    ) -> Result<(), KratosError> {
        let identity = &session.identity;
        let url = Self::endpoint(
            &self.admin_url,
            &format!("admin/identities/{}", identity.id),
        )?;

        let patch = json!([{
            "op": "replace",
            "path": "/metadata_public",
            "value": recovered_metadata(identity, settings_flow),
        }]);

        let response = self
            .http
            .patch(url)
            .header(header::ACCEPT, "application/json")
            .json(&patch)
            .send()
            .await
            .map_err(|e| KratosError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        tracing::debug!(identity_id = %identity.id, settings_flow = %settings_flow, "Identity marked as recovered");
        Ok(())
    }
}
