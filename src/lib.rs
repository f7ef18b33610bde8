// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod assemble;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod json_path;
pub mod metrics;
pub mod query;
pub mod registry;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{aggregate, FetchOutcome};
pub use crate::api::{create_router, router, AppState};
pub use crate::assemble::{assemble, ResultMap};
pub use crate::config::AppConfig;
pub use crate::query::Query;
pub use crate::registry::{SourceConfig, SourceRegistry};

use axum::Router;

/// Build the full in-process app from the default config lookup.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load_default()?;
    let state = AppState::from_config(&cfg)?;
    Ok(create_router(state))
}
