use secrecy::SecretString;
use std::net::SocketAddr;
use tracing::Level;
use voicecall_core::{DEFAULT_SAMPLE_RATE, platform::RETELL_BASE_URL};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
///
/// The API key and agent id are optional here. When they are missing the
/// relay still starts, and every registration attempt fails with a 500.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub api_key: Option<SecretString>,
    pub agent_id: Option<String>,
    pub sample_rate: u32,
    pub platform_base_url: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let api_key = non_empty_var("RETELL_API_KEY").map(SecretString::from);
        let agent_id = non_empty_var("RETELL_AGENT_ID");

        let sample_rate = match non_empty_var("RETELL_SAMPLE_RATE") {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue(
                    "RETELL_SAMPLE_RATE".to_string(),
                    format!("'{}' is not a valid sample rate", raw),
                )
            })?,
            None => DEFAULT_SAMPLE_RATE,
        };

        let platform_base_url =
            non_empty_var("RETELL_BASE_URL").unwrap_or_else(|| RETELL_BASE_URL.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            api_key,
            agent_id,
            sample_rate,
            platform_base_url,
            log_level,
        })
    }

    /// Returns the agent id every call is registered against.
    pub fn require_agent_id(&self) -> Result<&str, ConfigError> {
        self.agent_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("RETELL_AGENT_ID".to_string()))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
