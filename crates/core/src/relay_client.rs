//! Fetches per-call session credentials from the token relay.

use crate::credentials::{RegisterCallRequest, SessionCredentials};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{debug, error};

#[cfg(test)]
use mockall::automock;

/// Anything that can exchange an agent identifier for session credentials.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Registers a new call for `agent_id` and returns its credentials.
    async fn register_call(&self, agent_id: &str) -> Result<SessionCredentials>;
}

/// A `CredentialSource` backed by the relay's `POST /api/register-call` endpoint.
pub struct RelayCredentialSource {
    client: reqwest::Client,
    endpoint: String,
}

impl RelayCredentialSource {
    /// Creates a source pointing at the relay served from `base_url`
    /// (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/register-call", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CredentialSource for RelayCredentialSource {
    async fn register_call(&self, agent_id: &str) -> Result<SessionCredentials> {
        debug!(endpoint = %self.endpoint, "Registering call with relay");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RegisterCallRequest {
                agent_id: agent_id.to_string(),
            })
            .send()
            .await
            .context("Failed to reach the token relay")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "Error registering call");
            bail!("Error: {} {}", status.as_u16(), body);
        }

        response
            .json::<SessionCredentials>()
            .await
            .context("Relay returned malformed credentials")
    }
}
