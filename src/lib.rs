//! Library crate for volley-league-back: fixture scheduling and standings bookkeeping for
//! multi-team seasons, exposing modules for binaries and embedding services.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
