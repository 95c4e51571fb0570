//! Voicecall Token Relay Library Crate
//!
//! This library contains the HTTP side of the relay: configuration, the
//! shared application state, the register-call handler and routing. The
//! `api` binary is a thin wrapper around it.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
