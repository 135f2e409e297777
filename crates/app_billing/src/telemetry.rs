//! Tracing subscriber setup
//!
//! Library crates only emit events. The binary installs the subscriber once
//! at startup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppError;

/// Filter from `RUST_LOG` when set, otherwise `level`, otherwise `info`
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber with plain-text or JSON output
///
/// # Errors
///
/// Returns `AppError::InvalidConfig` if a global subscriber is already set
pub fn init_tracing(level: &str, json: bool) -> Result<(), AppError> {
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| AppError::invalid_config(format!("tracing already initialised: {}", e)))
}

