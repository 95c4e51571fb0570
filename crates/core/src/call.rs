//! Call lifecycle types shared by the controller and the external call client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three-valued lifecycle status of the current call attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallState {
    #[default]
    NotStarted,
    Active,
    Inactive,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::NotStarted => write!(f, "not-started"),
            CallState::Active => write!(f, "active"),
            CallState::Inactive => write!(f, "inactive"),
        }
    }
}

/// Lifecycle and audio events emitted by the external call client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "message", rename_all = "snake_case")]
pub enum CallEvent {
    /// The platform accepted the session.
    CallStarted,
    /// The agent's audio track is ready for playback.
    CallReady,
    /// The call ended, for any reason.
    CallEnded,
    /// The session failed.
    Error(String),
    AgentStartTalking,
    AgentStopTalking,
}

impl CallEvent {
    /// The event name used by the platform's web client.
    pub fn name(&self) -> &'static str {
        match self {
            CallEvent::CallStarted => "call_started",
            CallEvent::CallReady => "call_ready",
            CallEvent::CallEnded => "call_ended",
            CallEvent::Error(_) => "error",
            CallEvent::AgentStartTalking => "agent_start_talking",
            CallEvent::AgentStopTalking => "agent_stop_talking",
        }
    }
}

/// Parameters handed to the call client to open a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallConfig {
    pub access_token: String,
    pub sample_rate: u32,
}
