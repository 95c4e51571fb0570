//! API Models
//!
//! Request and response shapes for the relay, documented with `utoipa`.
//! The register-call response is the platform's body passed through
//! unchanged; `RegisterCallResponse` only describes the fields callers rely on.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body accepted by `POST /api/register-call`.
///
/// The relay always registers against its configured agent, so `agentId` is
/// accepted but not used.
#[derive(Deserialize, Serialize, ToSchema, Debug)]
pub struct RegisterCallPayload {
    #[serde(rename = "agentId")]
    #[schema(example = "agent_0123456789abcdef")]
    pub agent_id: String,
}

#[derive(Deserialize, Serialize, ToSchema, Debug)]
pub struct RegisterCallResponse {
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "sampleRate")]
    #[schema(example = 48000)]
    pub sample_rate: u32,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
