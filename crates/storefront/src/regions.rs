//! Country-code to region resolution with a process-wide cache.
//!
//! The cache is owned by [`crate::state::AppState`] rather than being a
//! global. It holds the last successfully fetched region list, indexed by
//! country code, and is rebuilt wholesale whenever a lookup misses.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lather_core::{Region, RegionId, RegionIndex};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::commerce::CommerceBackend;

/// Source of the current time for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CachedIndex {
    index: RegionIndex,
    fetched_at: Instant,
}

/// Resolves country codes to regions, caching the backend's region list.
///
/// Concurrent misses may each refetch; the rebuilt index is the same for the
/// same region list, so the last writer wins harmlessly.
pub struct RegionResolver {
    backend: Arc<dyn CommerceBackend>,
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
    cache: RwLock<Option<CachedIndex>>,
}

impl RegionResolver {
    /// Create a resolver with no expiry, using the system clock.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock), None)
    }

    /// Create a resolver with an explicit clock and optional TTL.
    #[must_use]
    pub fn with_clock(
        backend: Arc<dyn CommerceBackend>,
        clock: Arc<dyn Clock>,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            clock,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Resolve a country code to a region.
    ///
    /// Exact cache hits return without a network call. Misses refetch the
    /// whole region list and fall back to the `us` region, then the first
    /// region. Returns `None` when the backend fails or has no regions.
    #[instrument(skip(self))]
    pub async fn resolve(&self, country_code: &str) -> Option<Region> {
        if let Some(region) = self.cached(country_code).await {
            debug!(region_id = %region.id, "Region cache hit");
            return Some(region);
        }

        let regions = match self.backend.list_regions().await {
            Ok(regions) => regions,
            Err(e) => {
                warn!(error = %e, "Failed to fetch regions");
                return None;
            }
        };

        if regions.is_empty() {
            warn!("Commerce backend returned no regions");
            return None;
        }

        let index = RegionIndex::build(regions);
        debug!(
            regions = index.regions().len(),
            countries = index.country_count(),
            "Region cache refreshed"
        );
        let region = index.resolve(country_code).cloned();
        if let Some(region) = &region
            && !region.serves(country_code)
        {
            debug!(region_id = %region.id, "No region serves this country, using fallback");
        }

        *self.cache.write().await = Some(CachedIndex {
            index,
            fetched_at: self.clock.now(),
        });

        region
    }

    /// Fetch one region by ID, bypassing the cache.
    #[instrument(skip(self), fields(region_id = %id))]
    pub async fn retrieve(&self, id: &RegionId) -> Option<Region> {
        match self.backend.retrieve_region(id).await {
            Ok(region) => Some(region),
            Err(e) => {
                warn!(error = %e, "Failed to retrieve region");
                None
            }
        }
    }

    /// Drop the cached region list so the next lookup refetches.
    pub async fn clear(&self) {
        *self.cache.write().await = None;
        debug!("Region cache cleared");
    }

    async fn cached(&self, country_code: &str) -> Option<Region> {
        let cache = self.cache.read().await;
        let cached = cache.as_ref()?;
        if let Some(ttl) = self.ttl
            && self.clock.now().saturating_duration_since(cached.fetched_at) >= ttl
        {
            return None;
        }
        cached.index.get(country_code).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::commerce::fake::{FakeBackend, region};

    struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    fn backend() -> Arc<FakeBackend> {
        Arc::new(FakeBackend::with_regions(vec![
            region("reg_eu", "eur", &["de", "fr"]),
            region("reg_na", "usd", &["us", "ca"]),
        ]))
    }

    #[tokio::test]
    async fn test_resolve_caches_exact_hits() {
        let backend = backend();
        let resolver = RegionResolver::new(backend.clone());

        let first = resolver.resolve("DE").await.unwrap();
        assert_eq!(first.id.as_str(), "reg_eu");
        let second = resolver.resolve("de").await.unwrap();
        assert_eq!(second.id.as_str(), "reg_eu");
        assert_eq!(resolver.resolve("ca").await.unwrap().id.as_str(), "reg_na");

        assert_eq!(backend.region_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_unknown_country_falls_back_to_us() {
        let backend = backend();
        let resolver = RegionResolver::new(backend.clone());

        let region = resolver.resolve("jp").await.unwrap();
        assert_eq!(region.id.as_str(), "reg_na");
    }

    #[tokio::test]
    async fn test_falls_back_to_first_region_without_us() {
        let backend = Arc::new(FakeBackend::with_regions(vec![
            region("reg_eu", "eur", &["de"]),
            region("reg_uk", "gbp", &["gb"]),
        ]));
        let resolver = RegionResolver::new(backend);
        assert_eq!(resolver.resolve("jp").await.unwrap().id.as_str(), "reg_eu");
    }

    #[tokio::test]
    async fn test_empty_region_list_is_none_and_not_cached() {
        let backend = Arc::new(FakeBackend::default());
        let resolver = RegionResolver::new(backend.clone());

        assert!(resolver.resolve("us").await.is_none());

        backend
            .regions
            .lock()
            .await
            .push(region("reg_na", "usd", &["us"]));
        assert_eq!(resolver.resolve("us").await.unwrap().id.as_str(), "reg_na");
        assert_eq!(backend.region_calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_backend_failure_is_none() {
        let backend = backend();
        backend.fail_requests(true);
        let resolver = RegionResolver::new(backend);
        assert!(resolver.resolve("us").await.is_none());
    }

    #[tokio::test]
    async fn test_cached_entry_survives_backend_outage() {
        let backend = backend();
        let resolver = RegionResolver::new(backend.clone());
        resolver.resolve("us").await.unwrap();

        backend.fail_requests(true);
        assert_eq!(resolver.resolve("us").await.unwrap().id.as_str(), "reg_na");
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let backend = backend();
        let resolver = RegionResolver::new(backend.clone());

        resolver.resolve("us").await.unwrap();
        resolver.clear().await;
        resolver.resolve("us").await.unwrap();

        assert_eq!(backend.region_calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_ttl_expiry_refetches() {
        let backend = backend();
        let clock = Arc::new(ManualClock::new());
        let resolver =
            RegionResolver::with_clock(backend.clone(), clock.clone(), Some(Duration::from_secs(60)));

        resolver.resolve("us").await.unwrap();
        clock.advance(Duration::from_secs(30));
        resolver.resolve("us").await.unwrap();
        assert_eq!(backend.region_calls.load(Ordering::Relaxed), 1);

        clock.advance(Duration::from_secs(31));
        resolver.resolve("us").await.unwrap();
        assert_eq!(backend.region_calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_retrieve_by_id() {
        let resolver = RegionResolver::new(backend());
        let region = resolver.retrieve(&RegionId::new("reg_eu")).await.unwrap();
        assert_eq!(region.currency_code, "eur");
        assert!(resolver.retrieve(&RegionId::new("reg_missing")).await.is_none());
    }
}
