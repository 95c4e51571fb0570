//! The external real-time call client.
//!
//! Audio capture, encoding, transport and playback all live behind this
//! trait. The controller only opens and closes sessions and listens for the
//! lifecycle events the client emits.

use crate::call::{CallEvent, StartCallConfig};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

#[cfg(test)]
use mockall::automock;

/// A long-lived handle to the platform's real-time call client.
///
/// One instance is shared for the lifetime of the process. It is not
/// designed to run concurrent sessions.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CallClient: Send + Sync {
    /// Opens a real-time session with the given credentials.
    ///
    /// Returning `Ok` does not mean the call is live; that is signalled
    /// later by [`CallEvent::CallStarted`].
    async fn start_call(&self, config: StartCallConfig) -> Result<()>;

    /// Requests the current session to stop. Acknowledged by [`CallEvent::CallEnded`].
    fn stop_call(&self);

    /// Starts playing the agent's audio track.
    async fn start_audio_playback(&self) -> Result<()>;

    /// Registers a new listener for lifecycle and audio events.
    fn subscribe(&self) -> broadcast::Receiver<CallEvent>;
}
