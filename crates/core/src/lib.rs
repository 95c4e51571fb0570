pub mod call;
pub mod client;
pub mod controller;
pub mod credentials;
pub mod platform;
pub mod relay_client;

pub use call::{CallEvent, CallState, StartCallConfig};
pub use client::CallClient;
pub use controller::{CallController, CallError, StatusView};
pub use credentials::{DEFAULT_SAMPLE_RATE, RegisterCallRequest, SessionCredentials, WebCallRequest};
pub use platform::{RetellPlatform, VoicePlatform};
pub use relay_client::{CredentialSource, RelayCredentialSource};
