//! Carelog — persistence core of a local-first health journal.
//!
//! The record store owns the relational schema (conditions, medications
//! and their dose times, allergies, consultations, surgeries); the
//! migration service moves the pre-relational key-value profile blob into
//! it exactly once; the profile aggregate holds the in-memory snapshot the
//! UI reads and writes through.

pub mod config;
pub mod db;
pub mod legacy;
pub mod migration;
pub mod models;
pub mod profile;

use tracing_subscriber::EnvFilter;

/// Install the process-wide tracing subscriber. Host applications call
/// this once at startup; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
