use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::{counter, histogram};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::assemble;
use crate::auth::{LoginRequest, LoginResponse, TokenIssuer};
use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::fetch::{CachedFetcher, DynFetcher, HttpTransport};
use crate::metrics::Metrics;
use crate::query::Query as AggregationQuery;
use crate::registry::SourceRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SourceRegistry>,
    pub fetcher: DynFetcher,
    pub tokens: Arc<TokenIssuer>,
    pub cache_ttl_secs: u64,
}

impl AppState {
    /// Wire the HTTP transport, cache, and registry from configuration.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let cache = Arc::new(ResponseCache::with_ttl(cfg.cache.ttl()));
        let transport = HttpTransport::new(&cfg.http)?;
        let registry = cfg.registry();
        tracing::info!(
            sources = registry.len(),
            fetchable = registry.fetchable().count(),
            ttl_secs = cfg.cache.ttl_secs,
            "aggregator state built"
        );
        Ok(Self {
            registry: Arc::new(registry),
            fetcher: Arc::new(CachedFetcher::new(transport, cache)),
            tokens: Arc::new(TokenIssuer::new(cfg.auth.clone())),
            cache_ttl_secs: cfg.cache.ttl_secs,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let metrics = Metrics::init(state.cache_ttl_secs);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/aggregation", get(aggregated_data))
        // Legacy path kept for existing clients.
        .route("/api/Aggregation/GetAggregatedData", get(aggregated_data))
        .route("/api/auth/login", post(login))
        .with_state(state)
        .merge(metrics.router())
        .layer(CorsLayer::very_permissive())
}

/// Alias kept so callers can use `crate_root::api::router`.
pub fn router(state: AppState) -> Router {
    create_router(state)
}

async fn aggregated_data(
    State(state): State<AppState>,
    Query(query): Query<AggregationQuery>,
) -> Response {
    counter!("aggregator_requests_total").increment(1);
    let t0 = Instant::now();

    let result = assemble::run(&state.registry, state.fetcher.clone(), &query).await;

    histogram!("aggregator_request_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    match result {
        Ok(map) => Json(Value::Object(map)).into_response(),
        Err(e) => {
            counter!("aggregator_request_failures_total").increment(1);
            tracing::error!(error = %e, "error on aggregation call");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    match state.tokens.login(&body) {
        Ok(Some(token)) => Json(LoginResponse { token }).into_response(),
        Ok(None) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
