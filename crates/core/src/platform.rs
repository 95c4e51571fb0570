//! Server-side client for the voice platform's call registration API.

use crate::credentials::WebCallRequest;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{error, info};

/// Default base URL of the Retell REST API.
pub const RETELL_BASE_URL: &str = "https://api.retellai.com";

/// Defines the contract for registering web calls with a voice platform.
///
/// The relay only depends on this trait, so a different platform (or a stub
/// in tests) can be swapped in without touching the HTTP layer.
#[async_trait]
pub trait VoicePlatform: Send + Sync {
    /// Registers a web call and returns the platform's response body untouched.
    async fn create_web_call(&self, request: &WebCallRequest) -> Result<Value>;
}

/// A `VoicePlatform` implementation for the Retell API.
pub struct RetellPlatform {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl RetellPlatform {
    /// Creates a new Retell client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, normally [`RETELL_BASE_URL`].
    /// * `api_key` - The secret key. A missing key is reported on the first
    ///   registration attempt rather than here.
    pub fn new(base_url: &str, api_key: Option<SecretString>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn create_web_call_url(&self) -> String {
        format!("{}/v2/create-web-call", self.base_url)
    }
}

#[async_trait]
impl VoicePlatform for RetellPlatform {
    async fn create_web_call(&self, request: &WebCallRequest) -> Result<Value> {
        let api_key = self
            .api_key
            .as_ref()
            .context("Retell API key is not configured")?;

        let response = self
            .client
            .post(self.create_web_call_url())
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await
            .context("Failed to reach the voice platform")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "Voice platform rejected call registration");
            bail!("Voice platform returned {}: {}", status, body);
        }

        let body = response
            .json::<Value>()
            .await
            .context("Voice platform returned a non-JSON body")?;
        info!(agent_id = %request.agent_id, sample_rate = request.sample_rate, "Web call registered");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_web_call_url() {
        let platform = RetellPlatform::new("https://api.retellai.com/", None);
        assert_eq!(
            platform.create_web_call_url(),
            "https://api.retellai.com/v2/create-web-call"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        // Port 9 (discard) is never contacted: the key check comes first.
        let platform = RetellPlatform::new("http://127.0.0.1:9", None);
        let err = platform
            .create_web_call(&WebCallRequest::new("agent_1", 48000))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
