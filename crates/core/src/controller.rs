//! Call Session Controller
//!
//! This module owns the call lifecycle state machine. It tracks the call
//! status (`not-started`, `active`, `inactive`) and whether the remote agent
//! is speaking, and exposes a single user action: [`CallController::toggle`].
//!
//! State only moves in response to events from the external [`CallClient`]
//! or to a failed start attempt. Starting a call never sets `active`
//! directly; that happens when the client reports `call_started`.

use crate::{
    call::{CallEvent, CallState, StartCallConfig},
    client::CallClient,
    relay_client::CredentialSource,
};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{error, info, warn};

/// Errors surfaced to the user by [`CallController::toggle`].
///
/// Every other failure is logged and reflected only as the call state
/// reverting to `inactive`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CallError {
    #[error("Agent ID is not set. Please check your .env file.")]
    MissingAgentId,
}

/// A snapshot of the two observable pieces of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusView {
    pub call_status: CallState,
    pub agent_speaking: bool,
}

impl StatusView {
    /// Presentation classes for the agent portrait.
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = Vec::new();
        match self.call_status {
            CallState::Active => classes.push("active"),
            CallState::Inactive => classes.push("inactive"),
            CallState::NotStarted => {}
        }
        if self.agent_speaking {
            classes.push("agent-speaking");
        }
        classes
    }
}

/// Drives a single shared call client through its lifecycle.
pub struct CallController {
    client: Arc<dyn CallClient>,
    credentials: Arc<dyn CredentialSource>,
    agent_id: Option<String>,
    call_status: watch::Sender<CallState>,
    agent_speaking: watch::Sender<bool>,
}

impl CallController {
    /// Creates a controller in the `not-started` state.
    ///
    /// # Arguments
    ///
    /// * `client` - The process-wide real-time call client.
    /// * `credentials` - Where session credentials are fetched from.
    /// * `agent_id` - The configured agent. `None` or empty blocks every toggle.
    pub fn new(
        client: Arc<dyn CallClient>,
        credentials: Arc<dyn CredentialSource>,
        agent_id: Option<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            agent_id,
            call_status: watch::Sender::new(CallState::NotStarted),
            agent_speaking: watch::Sender::new(false),
        }
    }

    pub fn call_status(&self) -> CallState {
        *self.call_status.borrow()
    }

    pub fn is_agent_speaking(&self) -> bool {
        *self.agent_speaking.borrow()
    }

    pub fn view(&self) -> StatusView {
        StatusView {
            call_status: self.call_status(),
            agent_speaking: self.is_agent_speaking(),
        }
    }

    /// Subscribes to call status changes.
    pub fn watch_call_status(&self) -> watch::Receiver<CallState> {
        self.call_status.subscribe()
    }

    /// Subscribes to agent-speaking changes.
    pub fn watch_agent_speaking(&self) -> watch::Receiver<bool> {
        self.agent_speaking.subscribe()
    }

    /// Starts a call if none is active, otherwise asks the client to stop.
    ///
    /// Only a missing agent id is returned as an error, before any network
    /// activity. Registration and start failures are logged and leave the
    /// call `inactive`.
    pub async fn toggle(&self) -> Result<(), CallError> {
        let agent_id = match self.agent_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => {
                warn!("Toggle ignored: no agent id configured");
                return Err(CallError::MissingAgentId);
            }
        };

        if self.call_status() == CallState::Active {
            info!("Stopping active call");
            self.client.stop_call();
            return Ok(());
        }

        if let Err(e) = self.start_call(agent_id).await {
            error!(error = ?e, "Error during call registration or start");
            self.set_call_status(CallState::Inactive);
        }
        Ok(())
    }

    async fn start_call(&self, agent_id: &str) -> Result<()> {
        let credentials = self
            .credentials
            .register_call(agent_id)
            .await
            .context("Failed to register call")?;

        let Some(access_token) = credentials.access_token.filter(|t| !t.is_empty()) else {
            bail!("Failed to get access token.");
        };

        self.client
            .start_call(StartCallConfig {
                access_token,
                sample_rate: credentials.sample_rate,
            })
            .await
            .context("Failed to start call")?;
        info!(sample_rate = credentials.sample_rate, "Starting call...");
        Ok(())
    }

    /// Applies one event from the call client to the controller state.
    ///
    /// Audio playback for `call_ready` runs on its own task so a stalled
    /// playback never holds back a later `call_ended` or `error`.
    pub fn handle_event(&self, event: CallEvent) {
        match event {
            CallEvent::CallStarted => {
                info!("Call started");
                self.set_call_status(CallState::Active);
            }
            CallEvent::CallReady => {
                info!("Call is ready, attempting to start audio playback.");
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    match client.start_audio_playback().await {
                        Ok(()) => info!("Audio playback started successfully."),
                        Err(e) => error!(error = ?e, "Error starting audio playback"),
                    }
                });
            }
            CallEvent::CallEnded => {
                info!("Call ended");
                self.set_call_status(CallState::Inactive);
                self.set_agent_speaking(false);
            }
            CallEvent::Error(message) => {
                error!(%message, "An error occurred");
                self.set_call_status(CallState::Inactive);
                self.set_agent_speaking(false);
            }
            CallEvent::AgentStartTalking => {
                info!("Agent started talking");
                self.set_agent_speaking(true);
            }
            CallEvent::AgentStopTalking => {
                info!("Agent stopped talking");
                self.set_agent_speaking(false);
            }
        }
    }

    /// Processes events in order until the client's event stream closes.
    pub async fn listen(&self, mut events: broadcast::Receiver<CallEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Call event listener lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("Call event stream closed.");
    }

    /// Subscribes to the client and spawns [`Self::listen`] on the runtime.
    ///
    /// The subscription happens before this returns, so no event emitted
    /// afterwards is missed.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let events = self.client.subscribe();
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.listen(events).await })
    }

    fn set_call_status(&self, status: CallState) {
        self.call_status.send_replace(status);
    }

    fn set_agent_speaking(&self, speaking: bool) {
        self.agent_speaking.send_replace(speaking);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::MockCallClient, credentials::SessionCredentials,
        relay_client::MockCredentialSource,
    };
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::{Notify, mpsc};

    /// A call client whose playback only completes once `release` is notified.
    struct StalledPlaybackClient {
        events: Mutex<Option<broadcast::Receiver<CallEvent>>>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl CallClient for StalledPlaybackClient {
        async fn start_call(&self, _config: StartCallConfig) -> Result<()> {
            Ok(())
        }

        fn stop_call(&self) {}

        async fn start_audio_playback(&self) -> Result<()> {
            self.release.notified().await;
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
            self.events
                .lock()
                .unwrap()
                .take()
                .expect("subscribed twice")
        }
    }

    fn credentials(token: Option<&str>) -> SessionCredentials {
        SessionCredentials {
            access_token: token.map(str::to_string),
            sample_rate: 48000,
        }
    }

    fn controller(
        client: MockCallClient,
        source: MockCredentialSource,
        agent_id: Option<&str>,
    ) -> CallController {
        CallController::new(
            Arc::new(client),
            Arc::new(source),
            agent_id.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_starts_not_started_and_silent() {
        let ctrl = controller(
            MockCallClient::new(),
            MockCredentialSource::new(),
            Some("agent_1"),
        );
        assert_eq!(ctrl.call_status(), CallState::NotStarted);
        assert!(!ctrl.is_agent_speaking());
        assert!(ctrl.view().classes().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_without_agent_id_makes_no_requests() {
        for agent_id in [None, Some("")] {
            let mut client = MockCallClient::new();
            client.expect_start_call().never();
            client.expect_stop_call().never();
            let mut source = MockCredentialSource::new();
            source.expect_register_call().never();

            let ctrl = controller(client, source, agent_id);
            assert_eq!(ctrl.toggle().await, Err(CallError::MissingAgentId));
            assert_eq!(ctrl.call_status(), CallState::NotStarted);
        }
    }

    #[tokio::test]
    async fn test_toggle_becomes_active_only_after_call_started() {
        let mut source = MockCredentialSource::new();
        source
            .expect_register_call()
            .withf(|agent_id| agent_id == "agent_1")
            .times(1)
            .returning(|_| Ok(credentials(Some("tok"))));
        let mut client = MockCallClient::new();
        client
            .expect_start_call()
            .withf(|config| config.access_token == "tok" && config.sample_rate == 48000)
            .times(1)
            .returning(|_| Ok(()));

        let ctrl = controller(client, source, Some("agent_1"));
        ctrl.toggle().await.unwrap();
        assert_eq!(ctrl.call_status(), CallState::NotStarted);

        ctrl.handle_event(CallEvent::CallStarted);
        assert_eq!(ctrl.call_status(), CallState::Active);
    }

    #[tokio::test]
    async fn test_toggle_while_active_only_stops() {
        let mut source = MockCredentialSource::new();
        source.expect_register_call().never();
        let mut client = MockCallClient::new();
        client.expect_start_call().never();
        client.expect_stop_call().times(1).return_const(());

        let ctrl = controller(client, source, Some("agent_1"));
        ctrl.handle_event(CallEvent::CallStarted);
        ctrl.toggle().await.unwrap();

        // The stop is acknowledged only by a later `call_ended` event.
        assert_eq!(ctrl.call_status(), CallState::Active);
        ctrl.handle_event(CallEvent::CallEnded);
        assert_eq!(ctrl.call_status(), CallState::Inactive);
    }

    #[tokio::test]
    async fn test_missing_access_token_goes_inactive_without_starting() {
        let mut source = MockCredentialSource::new();
        source
            .expect_register_call()
            .times(1)
            .returning(|_| Ok(credentials(None)));
        let mut client = MockCallClient::new();
        client.expect_start_call().never();

        let ctrl = controller(client, source, Some("agent_1"));
        ctrl.toggle().await.unwrap();
        assert_eq!(ctrl.call_status(), CallState::Inactive);
    }

    #[tokio::test]
    async fn test_empty_access_token_goes_inactive_without_starting() {
        let mut source = MockCredentialSource::new();
        source
            .expect_register_call()
            .times(1)
            .returning(|_| Ok(credentials(Some(""))));
        let mut client = MockCallClient::new();
        client.expect_start_call().never();

        let ctrl = controller(client, source, Some("agent_1"));
        ctrl.toggle().await.unwrap();
        assert_eq!(ctrl.call_status(), CallState::Inactive);
    }

    #[tokio::test]
    async fn test_registration_failure_goes_inactive() {
        let mut source = MockCredentialSource::new();
        source
            .expect_register_call()
            .times(1)
            .returning(|_| Err(anyhow!("Error: 500 {{\"error\":\"Failed to register call.\"}}")));
        let mut client = MockCallClient::new();
        client.expect_start_call().never();

        let ctrl = controller(client, source, Some("agent_1"));
        ctrl.toggle().await.unwrap();
        assert_eq!(ctrl.call_status(), CallState::Inactive);
    }

    #[tokio::test]
    async fn test_start_failure_goes_inactive() {
        let mut source = MockCredentialSource::new();
        source
            .expect_register_call()
            .returning(|_| Ok(credentials(Some("tok"))));
        let mut client = MockCallClient::new();
        client
            .expect_start_call()
            .times(1)
            .returning(|_| Err(anyhow!("microphone permission denied")));

        let ctrl = controller(client, source, Some("agent_1"));
        ctrl.toggle().await.unwrap();
        assert_eq!(ctrl.call_status(), CallState::Inactive);
    }

    #[tokio::test]
    async fn test_toggle_from_inactive_starts_new_cycle() {
        let mut source = MockCredentialSource::new();
        source
            .expect_register_call()
            .times(1)
            .returning(|_| Ok(credentials(Some("tok"))));
        let mut client = MockCallClient::new();
        client.expect_start_call().times(1).returning(|_| Ok(()));

        let ctrl = controller(client, source, Some("agent_1"));
        ctrl.handle_event(CallEvent::CallEnded);
        assert_eq!(ctrl.call_status(), CallState::Inactive);

        ctrl.toggle().await.unwrap();
        ctrl.handle_event(CallEvent::CallStarted);
        assert_eq!(ctrl.call_status(), CallState::Active);
    }

    #[tokio::test]
    async fn test_call_ended_and_error_clear_agent_speaking() {
        let ends = [CallEvent::CallEnded, CallEvent::Error("dropped".to_string())];
        for end in ends {
            let ctrl = controller(
                MockCallClient::new(),
                MockCredentialSource::new(),
                Some("agent_1"),
            );
            ctrl.handle_event(CallEvent::CallStarted);
            ctrl.handle_event(CallEvent::AgentStartTalking);
            assert!(ctrl.is_agent_speaking());

            ctrl.handle_event(end);
            assert!(!ctrl.is_agent_speaking());
            assert_eq!(ctrl.call_status(), CallState::Inactive);
        }
    }

    #[tokio::test]
    async fn test_talking_events_do_not_touch_call_status() {
        let ctrl = controller(
            MockCallClient::new(),
            MockCredentialSource::new(),
            Some("agent_1"),
        );
        ctrl.handle_event(CallEvent::AgentStartTalking);
        assert!(ctrl.is_agent_speaking());
        assert_eq!(ctrl.call_status(), CallState::NotStarted);

        ctrl.handle_event(CallEvent::AgentStopTalking);
        assert!(!ctrl.is_agent_speaking());
        assert_eq!(ctrl.call_status(), CallState::NotStarted);
    }

    #[tokio::test]
    async fn test_playback_failure_keeps_call_running() {
        let (attempted_tx, mut attempted_rx) = mpsc::unbounded_channel();
        let mut client = MockCallClient::new();
        client
            .expect_start_audio_playback()
            .times(1)
            .returning(move || {
                let _ = attempted_tx.send(());
                Err(anyhow!("autoplay blocked"))
            });

        let ctrl = controller(client, MockCredentialSource::new(), Some("agent_1"));
        ctrl.handle_event(CallEvent::CallStarted);
        ctrl.handle_event(CallEvent::CallReady);
        attempted_rx.recv().await.unwrap();
        assert_eq!(ctrl.call_status(), CallState::Active);
    }

    #[tokio::test]
    async fn test_listener_applies_events_in_order() {
        let (tx, rx) = broadcast::channel(16);
        let mut client = MockCallClient::new();
        client.expect_subscribe().times(1).return_once(move || rx);
        let (played_tx, mut played_rx) = mpsc::unbounded_channel();
        client
            .expect_start_audio_playback()
            .times(1)
            .returning(move || {
                let _ = played_tx.send(());
                Ok(())
            });

        let ctrl = Arc::new(controller(
            client,
            MockCredentialSource::new(),
            Some("agent_1"),
        ));
        let mut status_rx = ctrl.watch_call_status();
        let handle = ctrl.spawn_listener();

        tx.send(CallEvent::CallStarted).unwrap();
        tx.send(CallEvent::CallReady).unwrap();
        tx.send(CallEvent::AgentStartTalking).unwrap();
        drop(tx);
        handle.await.unwrap();
        played_rx.recv().await.unwrap();

        assert!(status_rx.has_changed().unwrap());
        assert_eq!(*status_rx.borrow_and_update(), CallState::Active);
        assert_eq!(
            ctrl.view().classes(),
            vec!["active", "agent-speaking"]
        );
    }

    #[tokio::test]
    async fn test_stalled_playback_does_not_block_call_ended() {
        let (tx, rx) = broadcast::channel(16);
        let release = Arc::new(Notify::new());
        let client = StalledPlaybackClient {
            events: Mutex::new(Some(rx)),
            release: release.clone(),
        };
        let ctrl = Arc::new(CallController::new(
            Arc::new(client),
            Arc::new(MockCredentialSource::new()),
            Some("agent_1".to_string()),
        ));
        let mut status_rx = ctrl.watch_call_status();
        let handle = ctrl.spawn_listener();

        tx.send(CallEvent::CallStarted).unwrap();
        tx.send(CallEvent::CallReady).unwrap();
        tx.send(CallEvent::AgentStartTalking).unwrap();
        tx.send(CallEvent::CallEnded).unwrap();

        status_rx
            .wait_for(|status| *status == CallState::Inactive)
            .await
            .unwrap();
        assert!(!ctrl.is_agent_speaking());

        release.notify_one();
        drop(tx);
        handle.await.unwrap();
    }
}
