//! Credential types exchanged between the controller, the relay and the voice platform.

use serde::{Deserialize, Serialize};

/// Sample rate used when neither the configuration nor the platform supplies one.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// The credentials needed to open a single real-time voice session.
///
/// The relay forwards the platform's body verbatim, so both the camelCase and
/// snake_case spellings are accepted, alone or together. A missing or `null`
/// sample rate falls back to [`DEFAULT_SAMPLE_RATE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCredentials")]
pub struct SessionCredentials {
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,
}

/// Every spelling of the credential fields a relay body may carry.
#[derive(Deserialize)]
struct RawCredentials {
    #[serde(rename = "accessToken")]
    access_token_camel: Option<String>,
    access_token: Option<String>,
    #[serde(rename = "sampleRate")]
    sample_rate_camel: Option<u32>,
    sample_rate: Option<u32>,
}

impl From<RawCredentials> for SessionCredentials {
    fn from(raw: RawCredentials) -> Self {
        Self {
            access_token: raw.access_token_camel.or(raw.access_token),
            sample_rate: raw
                .sample_rate_camel
                .or(raw.sample_rate)
                .unwrap_or(DEFAULT_SAMPLE_RATE),
        }
    }
}

/// Body sent by the controller to the relay's `/api/register-call` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCallRequest {
    #[serde(rename = "agentId")]
    pub agent_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// 16-bit signed little-endian PCM.
    S16le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioWebsocketProtocol {
    Web,
}

/// The registration request the relay sends to the voice platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebCallRequest {
    pub agent_id: String,
    pub audio_encoding: AudioEncoding,
    pub audio_websocket_protocol: AudioWebsocketProtocol,
    pub sample_rate: u32,
}

impl WebCallRequest {
    /// Builds a request for browser calls: s16le audio over the web socket protocol.
    pub fn new(agent_id: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            agent_id: agent_id.into(),
            audio_encoding: AudioEncoding::S16le,
            audio_websocket_protocol: AudioWebsocketProtocol::Web,
            sample_rate,
        }
    }
}
