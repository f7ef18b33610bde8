//! # Fan-out
//! One tokio task per fetchable source, joined with wait-all semantics.
//!
//! A source's `FetchError` is turned into a failed [`FetchOutcome`] inside its
//! own task, so it never cancels or delays siblings. Outcomes are collected
//! per index after join; nothing writes into a shared map concurrently.

use std::time::Instant;

use metrics::histogram;
use tokio::task::JoinHandle;

use crate::error::OrchestrationError;
use crate::fetch::DynFetcher;
use crate::registry::SourceRegistry;

/// Result of fetching one source. `body == None` means the fetch failed with no fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub source_name: String,
    pub body: Option<String>,
}

impl FetchOutcome {
    pub fn failed(&self) -> bool {
        self.body.is_none()
    }
}

/// Fetch every source with a non-empty URL concurrently.
///
/// Returns outcomes in registry order. Sources with a blank URL are absent.
/// There is no deadline here; the slowest source gates the return.
pub async fn aggregate(
    registry: &SourceRegistry,
    fetcher: DynFetcher,
) -> Result<Vec<FetchOutcome>, OrchestrationError> {
    let t0 = Instant::now();

    let handles: Vec<(String, JoinHandle<FetchOutcome>)> = registry
        .fetchable()
        .map(|src| {
            let fetcher = fetcher.clone();
            let name = src.name.clone();
            let url = src.url.clone();
            let handle = tokio::spawn(async move {
                let body = match fetcher.fetch(&url).await {
                    Ok(fetched) => Some(fetched.body),
                    Err(e) => {
                        tracing::warn!(error = %e, source = %name, "source fetch failed");
                        None
                    }
                };
                FetchOutcome {
                    source_name: name,
                    body,
                }
            });
            (src.name.clone(), handle)
        })
        .collect();

    tracing::info!(sources = handles.len(), "fan-out started");

    let mut outcomes = Vec::with_capacity(handles.len());
    for (source_name, handle) in handles {
        let outcome = handle
            .await
            .map_err(|source| OrchestrationError::Join {
                source_name,
                source,
            })?;
        outcomes.push(outcome);
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("aggregator_fanout_ms").record(ms);
    tracing::info!(
        sources = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.failed()).count(),
        elapsed_ms = ms,
        "fan-out finished"
    );

    Ok(outcomes)
}
