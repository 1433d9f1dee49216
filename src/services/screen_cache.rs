use crate::error::Error;
use crate::models::{BackendDescriptor, ParserDescriptor, ReconciliationResult};
use crate::services::reconcile::reconcile;
use crate::services::upstream::ScreenSource;
use crate::utils::normalize_screen_name;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Which per-screen value to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Parser,
    Backend,
    Reconciliation,
}

/// A resolved per-screen value, shared with the cache
#[derive(Debug, Clone)]
pub enum Descriptor {
    Parser(Arc<ParserDescriptor>),
    Backend(Arc<BackendDescriptor>),
    Reconciliation(Arc<ReconciliationResult>),
}

#[derive(Debug)]
struct CacheEntry<T> {
    value: Arc<T>,
    cached_at: Instant,
}

/// Screen key -> cached value
type Store<T> = RwLock<HashMap<String, CacheEntry<T>>>;

// Shared cache for passing between handlers
pub type SharedScreenCache = Arc<ScreenCache>;

/// Entry counts per store
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub parser_entries: usize,
    pub backend_entries: usize,
    pub reconciliation_entries: usize,
    pub ttl_secs: Option<u64>,
}

/// Outcome of a startup warm pass
#[derive(Debug, Clone, Default)]
pub struct WarmReport {
    pub warmed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Per-screen cache fronting the parser and backend services
///
/// Three independent stores (parser, backend, reconciliation) keyed by the
/// normalized screen name. A miss fetches or computes the value and stores it
/// before returning; a hit does no I/O. Locks are never held across a fetch, so
/// two callers missing the same key may both fetch and the last write wins.
///
/// Entries live for the process lifetime unless a TTL is configured, in which
/// case an expired entry behaves like a miss. [`ScreenCache::invalidate`]
/// drops all three entries of a screen together.
pub struct ScreenCache {
    source: Arc<dyn ScreenSource>,
    ttl: Option<Duration>,
    parser: Store<ParserDescriptor>,
    backend: Store<BackendDescriptor>,
    reconciled: Store<ReconciliationResult>,
}

impl ScreenCache {
    /// A zero TTL is treated as no TTL
    pub fn new(source: Arc<dyn ScreenSource>, ttl: Option<Duration>) -> Self {
        Self {
            source,
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
            parser: RwLock::new(HashMap::new()),
            backend: RwLock::new(HashMap::new()),
            reconciled: RwLock::new(HashMap::new()),
        }
    }

    fn key(screen: &str) -> Result<String, Error> {
        let key = normalize_screen_name(screen);
        if key.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Screen name '{}' is empty after normalization",
                screen
            )));
        }
        Ok(key)
    }

    fn is_fresh<T>(&self, entry: &CacheEntry<T>) -> bool {
        match self.ttl {
            Some(ttl) => entry.cached_at.elapsed() < ttl,
            None => true,
        }
    }

    async fn lookup<T>(&self, store: &Store<T>, key: &str) -> Option<Arc<T>> {
        let guard = store.read().await;
        guard
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value.clone())
    }

    async fn insert<T>(store: &Store<T>, key: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let mut guard = store.write().await;
        guard.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                cached_at: Instant::now(),
            },
        );
        value
    }

    /// Resolve any of the three per-screen values
    pub async fn resolve(&self, screen: &str, kind: DescriptorKind) -> Result<Descriptor, Error> {
        match kind {
            DescriptorKind::Parser => self.parser(screen).await.map(Descriptor::Parser),
            DescriptorKind::Backend => self.backend(screen).await.map(Descriptor::Backend),
            DescriptorKind::Reconciliation => self
                .reconciliation(screen)
                .await
                .map(Descriptor::Reconciliation),
        }
    }

    /// Parser descriptor for `screen`, fetched on miss
    pub async fn parser(&self, screen: &str) -> Result<Arc<ParserDescriptor>, Error> {
        let key = Self::key(screen)?;
        if let Some(hit) = self.lookup(&self.parser, &key).await {
            debug!(screen = %key, "Parser cache hit");
            return Ok(hit);
        }

        let descriptor = self.source.fetch_parser(&key).await?;
        Ok(Self::insert(&self.parser, &key, descriptor).await)
    }

    /// Backend descriptor for `screen`, fetched on miss
    pub async fn backend(&self, screen: &str) -> Result<Arc<BackendDescriptor>, Error> {
        let key = Self::key(screen)?;
        if let Some(hit) = self.lookup(&self.backend, &key).await {
            debug!(screen = %key, "Backend cache hit");
            return Ok(hit);
        }

        let descriptor = self.source.fetch_backend(&key).await?;
        Ok(Self::insert(&self.backend, &key, descriptor).await)
    }

    /// Reconciled elements for `screen`, computed from the cached descriptors on miss
    pub async fn reconciliation(&self, screen: &str) -> Result<Arc<ReconciliationResult>, Error> {
        let key = Self::key(screen)?;
        if let Some(hit) = self.lookup(&self.reconciled, &key).await {
            debug!(screen = %key, "Reconciliation cache hit");
            return Ok(hit);
        }

        let parser = self.parser(&key).await?;
        let backend = self.backend(&key).await?;

        let mut result = reconcile(&parser, &backend);
        if result.screen.is_empty() {
            result.screen = key.clone();
        }

        info!(
            screen = %key,
            elements = result.elements.len(),
            matched = result.matched_count(),
            "Reconciled screen"
        );

        Ok(Self::insert(&self.reconciled, &key, result).await)
    }

    /// Drop every cached value for `screen`
    ///
    /// Returns true when at least one entry existed.
    pub async fn invalidate(&self, screen: &str) -> Result<bool, Error> {
        let key = Self::key(screen)?;
        let parser = self.parser.write().await.remove(&key).is_some();
        let backend = self.backend.write().await.remove(&key).is_some();
        let reconciled = self.reconciled.write().await.remove(&key).is_some();

        let removed = parser || backend || reconciled;
        if removed {
            info!(screen = %key, "Invalidated screen cache");
        }
        Ok(removed)
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            parser_entries: self.parser.read().await.len(),
            backend_entries: self.backend.read().await.len(),
            reconciliation_entries: self.reconciled.read().await.len(),
            ttl_secs: self.ttl.map(|ttl| ttl.as_secs()),
        }
    }

    /// Eagerly resolve the reconciliation of each screen
    ///
    /// Screens are warmed one after another; a failure is logged and the pass
    /// moves on to the next screen.
    pub async fn warm(&self, screens: &[&str]) -> WarmReport {
        let mut report = WarmReport::default();

        for screen in screens {
            match self.reconciliation(screen).await {
                Ok(result) => {
                    info!(screen = %screen, elements = result.elements.len(), "Warmed screen cache");
                    report.warmed.push(screen.to_string());
                }
                Err(e) => {
                    warn!(screen = %screen, error = %e, "Failed to warm screen cache");
                    report.failed.push((screen.to_string(), e.to_string()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NO_DESCRIPTION;
    use crate::services::fakes::FakeScreenSource;

    fn cache_with(source: Arc<FakeScreenSource>, ttl: Option<Duration>) -> ScreenCache {
        ScreenCache::new(source, ttl)
    }

    #[tokio::test]
    async fn test_second_resolve_is_cached() {
        let source = Arc::new(FakeScreenSource::with_home());
        let cache = cache_with(source.clone(), None);

        let first = cache.reconciliation("home").await.unwrap();
        let second = cache.reconciliation("home").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.parser_calls(), 1);
        assert_eq!(source.backend_calls(), 1);
    }

    #[tokio::test]
    async fn test_case_variants_share_entry() {
        let source = Arc::new(FakeScreenSource::with_home());
        let cache = cache_with(source.clone(), None);

        let a = cache.reconciliation("Home").await.unwrap();
        let b = cache.reconciliation("/Home/").await.unwrap();
        let c = cache.reconciliation("home").await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(source.parser_calls(), 1);
        assert_eq!(source.requested_screens(), vec!["home".to_string(), "home".to_string()]);
    }

    #[tokio::test]
    async fn test_reconciliation_reuses_cached_descriptors() {
        let source = Arc::new(FakeScreenSource::with_home());
        let cache = cache_with(source.clone(), None);

        let parser = cache.parser("home").await.unwrap();
        let _ = cache.backend("HOME").await.unwrap();
        let result = cache.reconciliation("home").await.unwrap();

        assert_eq!(source.parser_calls(), 1);
        assert_eq!(source.backend_calls(), 1);
        assert_eq!(result.elements.len(), parser.elements.len());
        assert_eq!(result.elements[0].description, "현재가");
        assert_eq!(result.elements[1].description, NO_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_resolve_dispatches_by_kind() {
        let source = Arc::new(FakeScreenSource::with_home());
        let cache = cache_with(source, None);

        assert!(matches!(
            cache.resolve("home", DescriptorKind::Parser).await.unwrap(),
            Descriptor::Parser(_)
        ));
        assert!(matches!(
            cache.resolve("home", DescriptorKind::Backend).await.unwrap(),
            Descriptor::Backend(_)
        ));
        assert!(matches!(
            cache.resolve("home", DescriptorKind::Reconciliation).await.unwrap(),
            Descriptor::Reconciliation(_)
        ));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_typed_and_not_cached() {
        let source = Arc::new(FakeScreenSource::with_home().failing("broken"));
        let cache = cache_with(source.clone(), None);

        let err = cache.reconciliation("broken").await.unwrap_err();
        assert!(err.is_upstream());

        let _ = cache.reconciliation("broken").await;
        assert_eq!(source.parser_calls(), 2);
        assert_eq!(cache.stats().await.reconciliation_entries, 0);
    }

    #[tokio::test]
    async fn test_empty_screen_name_rejected() {
        let source = Arc::new(FakeScreenSource::with_home());
        let cache = cache_with(source.clone(), None);

        let err = cache.parser("//").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(source.parser_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_drops_all_three_entries() {
        let source = Arc::new(FakeScreenSource::with_home());
        let cache = cache_with(source.clone(), None);

        let before = cache.reconciliation("home").await.unwrap();
        assert!(cache.invalidate("HOME").await.unwrap());
        assert!(!cache.invalidate("home").await.unwrap());

        let stats = cache.stats().await;
        assert_eq!(stats.parser_entries, 0);
        assert_eq!(stats.backend_entries, 0);
        assert_eq!(stats.reconciliation_entries, 0);

        let after = cache.reconciliation("home").await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(source.parser_calls(), 2);
    }

    #[tokio::test]
    async fn test_ttl_expiry_refetches() {
        let source = Arc::new(FakeScreenSource::with_home());
        let cache = cache_with(source.clone(), Some(Duration::from_millis(20)));

        cache.parser("home").await.unwrap();
        cache.parser("home").await.unwrap();
        assert_eq!(source.parser_calls(), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.parser("home").await.unwrap();
        assert_eq!(source.parser_calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_keeps_entries() {
        let source = Arc::new(FakeScreenSource::with_home());
        let cache = cache_with(source.clone(), Some(Duration::from_secs(0)));

        cache.parser("home").await.unwrap();
        cache.parser("home").await.unwrap();

        assert_eq!(source.parser_calls(), 1);
        assert_eq!(cache.stats().await.ttl_secs, None);
    }

    #[tokio::test]
    async fn test_warm_continues_after_failure() {
        let source = Arc::new(FakeScreenSource::with_home().failing("order"));
        let cache = cache_with(source, None);

        let report = cache.warm(&["home", "order", "chart"]).await;

        assert_eq!(report.warmed, vec!["home".to_string(), "chart".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "order");

        let stats = cache.stats().await;
        assert_eq!(stats.reconciliation_entries, 2);
    }
}
