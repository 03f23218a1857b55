//! Application state shared across handlers.

use std::sync::Arc;

use lather_core::MoneyFormatter;

use crate::catalog::Catalog;
use crate::commerce::{CommerceBackend, CommerceError, MedusaClient};
use crate::config::StorefrontConfig;
use crate::regions::{RegionResolver, SystemClock};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the commerce backend, the region cache, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Arc<dyn CommerceBackend>,
    regions: RegionResolver,
    formatter: MoneyFormatter,
}

impl AppState {
    /// Create application state backed by the Medusa store API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, CommerceError> {
        let backend = MedusaClient::new(&config.commerce)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create application state over any commerce backend.
    #[must_use]
    pub fn with_backend(config: StorefrontConfig, backend: Arc<dyn CommerceBackend>) -> Self {
        let regions = RegionResolver::with_clock(
            Arc::clone(&backend),
            Arc::new(SystemClock),
            config.region_cache_ttl,
        );
        let formatter = MoneyFormatter::new(&config.locale, config.commerce.amount_unit);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                regions,
                formatter,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce backend.
    #[must_use]
    pub fn backend(&self) -> &dyn CommerceBackend {
        self.inner.backend.as_ref()
    }

    /// Get a reference to the region resolver.
    #[must_use]
    pub fn regions(&self) -> &RegionResolver {
        &self.inner.regions
    }

    /// Get a reference to the money formatter.
    #[must_use]
    pub fn formatter(&self) -> &MoneyFormatter {
        &self.inner.formatter
    }

    /// Product listing over this state's backend and region cache.
    #[must_use]
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self.backend(), self.regions())
    }
}
