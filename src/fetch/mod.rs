//! Cached fetcher: transport abstraction + cache wrapper with stale fallback.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use crate::cache::ResponseCache;
use crate::error::FetchError;

pub use self::http::HttpTransport;

/// Where a returned body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    /// Fresh cache entry, no network round trip.
    Cache,
    /// Live upstream response (now cached).
    Live,
    /// Live fetch failed; last known-good cached copy served instead.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    pub origin: FetchOrigin,
}

/// Low-level transport: performs the *real* upstream call. Separated so the same
/// caching wrapper serves production (HTTP) and tests (scripted).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}

/// What the fan-out depends on.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError>;
}

pub type DynFetcher = Arc<dyn SourceFetcher>;

/// Transport wrapped with a [`ResponseCache`]. The only writer of the cache.
pub struct CachedFetcher<T: Transport> {
    inner: T,
    cache: Arc<ResponseCache>,
}

impl<T: Transport> CachedFetcher<T> {
    pub fn new(inner: T, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    async fn fetch_impl(&self, url: &str) -> Result<Fetched, FetchError> {
        // 1) Fresh hit.
        if let Some(body) = self.cache.get_fresh(url) {
            counter!("aggregator_cache_hits_total").increment(1);
            tracing::debug!(url = %url, "cache hit");
            return Ok(Fetched {
                body: body.to_string(),
                origin: FetchOrigin::Cache,
            });
        }
        counter!("aggregator_cache_misses_total").increment(1);

        // 2) Live call.
        match self.inner.get(url).await {
            Ok(body) => {
                self.cache.store(url, &body);
                Ok(Fetched {
                    body,
                    origin: FetchOrigin::Live,
                })
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    url = %url,
                    transport = self.inner.name(),
                    "live fetch failed"
                );
                // 3) Any previous copy, fresh or stale.
                match self.cache.lookup(url) {
                    Some(stale) => {
                        counter!("aggregator_cache_fallbacks_total").increment(1);
                        tracing::warn!(url = %url, "serving last cached copy");
                        Ok(Fetched {
                            body: stale.body.to_string(),
                            origin: FetchOrigin::Fallback,
                        })
                    }
                    None => {
                        counter!("aggregator_fetch_errors_total").increment(1);
                        Err(e)
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<T: Transport> SourceFetcher for CachedFetcher<T> {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        self.fetch_impl(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replies from a per-URL script; `None` means the call fails.
    struct ScriptedTransport {
        script: Mutex<HashMap<String, VecDeque<Option<String>>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedTransport {
        fn new(url: &str, replies: Vec<Option<&str>>) -> Self {
            let mut script = HashMap::new();
            script.insert(
                url.to_string(),
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect::<VecDeque<_>>(),
            );
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<String, FetchError> {
            *self.calls.lock().unwrap() += 1;
            let next = self
                .script
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|q| q.pop_front())
                .flatten();
            next.ok_or_else(|| FetchError::Unavailable {
                url: url.to_string(),
                reason: "scripted failure".into(),
            })
        }
        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn fetcher(replies: Vec<Option<&str>>, ttl: Duration) -> CachedFetcher<ScriptedTransport> {
        CachedFetcher::new(
            ScriptedTransport::new("http://src", replies),
            Arc::new(ResponseCache::with_ttl(ttl)),
        )
    }

    #[tokio::test]
    async fn fresh_entry_skips_the_network() {
        let f = fetcher(vec![Some("[1]"), Some("[2]")], Duration::from_secs(300));
        let first = f.fetch("http://src").await.unwrap();
        assert_eq!(first.origin, FetchOrigin::Live);
        let second = f.fetch("http://src").await.unwrap();
        assert_eq!(second.origin, FetchOrigin::Cache);
        assert_eq!(second.body, "[1]");
        assert_eq!(*f.inner.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn failure_after_success_falls_back_to_stale_copy() {
        // Zero TTL: every call goes to the network.
        let f = fetcher(vec![Some(r#"{"v":1}"#), None], Duration::ZERO);
        f.fetch("http://src").await.unwrap();
        let fb = f.fetch("http://src").await.unwrap();
        assert_eq!(fb.origin, FetchOrigin::Fallback);
        assert_eq!(fb.body, r#"{"v":1}"#);
        assert_eq!(*f.inner.calls.lock().unwrap(), 2);
    }

    /// Collects formatted log lines for level assertions.
    #[derive(Clone, Default)]
    struct LogBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn fallback_is_logged_at_warn() {
        let logs = LogBuf::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        // Current-thread runtime: the default stays in effect across awaits.
        let _guard = tracing::subscriber::set_default(subscriber);

        let f = fetcher(vec![Some("[1]"), None], Duration::ZERO);
        f.fetch("http://src").await.unwrap();
        assert_eq!(f.fetch("http://src").await.unwrap().origin, FetchOrigin::Fallback);

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = text
            .lines()
            .find(|l| l.contains("serving last cached copy"))
            .expect("fallback event logged");
        assert!(line.contains("WARN"), "{line}");
    }

    #[tokio::test]
    async fn failure_without_cache_is_an_error() {
        let f = fetcher(vec![None], Duration::from_secs(300));
        let err = f.fetch("http://src").await.unwrap_err();
        assert_eq!(err.url(), "http://src");
        assert!(f.cache().is_empty());
    }

    #[tokio::test]
    async fn live_success_replaces_cached_body() {
        let f = fetcher(vec![Some("old"), Some("new")], Duration::ZERO);
        f.fetch("http://src").await.unwrap();
        let second = f.fetch("http://src").await.unwrap();
        assert_eq!(second.origin, FetchOrigin::Live);
        assert_eq!(f.cache().lookup("http://src").unwrap().body.as_ref(), "new");
    }
}
