//! Shared Application State

use crate::config::Config;
use std::sync::Arc;
use voicecall_core::VoicePlatform;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub platform: Arc<dyn VoicePlatform>,
    pub config: Arc<Config>,
}
