//! Product listing, including the client-side price sort.
//!
//! The store API cannot order by calculated price, so price-sorted listings
//! fetch the whole (bounded) result set, sort it in memory, and cut the
//! requested page out. Every failure degrades to an empty page.

use lather_core::{
    CollectionId, MAX_SORT_FETCH, PAGE_SIZE, Product, ProductPage, Region, RegionId, SortOption,
    next_page, page_offset, paginate, sort_products,
};
use tracing::{instrument, warn};

use crate::commerce::{CommerceBackend, ProductList, ProductQuery};
use crate::regions::RegionResolver;

/// How the listing's region is chosen.
#[derive(Debug, Clone, Copy)]
pub enum RegionSelector<'a> {
    /// Resolve through the region cache, with fallback.
    Country(&'a str),
    /// Fetch this exact region.
    Id(&'a RegionId),
}

/// Optional listing parameters.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Page size; defaults to [`PAGE_SIZE`].
    pub limit: Option<u32>,
    /// Backend ordering, e.g. `-created_at`.
    pub order: Option<String>,
    /// Restrict to one product handle.
    pub handle: Option<String>,
    /// Restrict to one collection.
    pub collection_id: Option<CollectionId>,
}

/// Product listing over a commerce backend and a region resolver.
pub struct Catalog<'a> {
    backend: &'a dyn CommerceBackend,
    regions: &'a RegionResolver,
}

impl<'a> Catalog<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn CommerceBackend, regions: &'a RegionResolver) -> Self {
        Self { backend, regions }
    }

    /// One page of products in server order.
    ///
    /// Pages below 1 are treated as 1. No region or a backend failure yields
    /// an empty page without a next page.
    #[instrument(skip(self, params))]
    pub async fn list_products(
        &self,
        page: u32,
        params: ListParams,
        region: RegionSelector<'_>,
    ) -> ProductPage {
        let page = page.max(1);
        let limit = params.limit.unwrap_or(PAGE_SIZE);
        let Some(region) = self.region(region).await else {
            return ProductPage::empty();
        };

        let query = ProductQuery {
            region_id: region.id,
            limit,
            offset: page_offset(page, limit),
            order: params.order,
            handle: params.handle,
            collection_id: params.collection_id,
        };

        match self.fetch(&query).await {
            Some(list) => ProductPage {
                next_page: next_page(list.count, page, limit),
                products: list.products,
                count: list.count,
            },
            None => ProductPage::empty(),
        }
    }

    /// One page of products in the requested order.
    ///
    /// `CreatedAt` is ordered by the backend. Price orders count the
    /// matches, fetch up to [`MAX_SORT_FETCH`] of them, sort in memory, and
    /// slice the page window.
    #[instrument(skip(self))]
    pub async fn list_products_with_sort(
        &self,
        page: u32,
        sort: SortOption,
        selector: RegionSelector<'_>,
        limit: Option<u32>,
    ) -> ProductPage {
        let page = page.max(1);
        let limit = limit.unwrap_or(PAGE_SIZE);

        if let Some(order) = sort.backend_order() {
            let params = ListParams {
                limit: Some(limit),
                order: Some(order.to_string()),
                ..ListParams::default()
            };
            return self.list_products(page, params, selector).await;
        }

        let Some(region) = self.region(selector).await else {
            return ProductPage::empty();
        };

        let Some(counted) = self.fetch(&ProductQuery::new(region.id.clone(), 1)).await else {
            return ProductPage::empty();
        };
        let total = counted.count;
        if total == 0 {
            return ProductPage::empty();
        }

        let fetch_limit = u32::try_from(total.min(u64::from(MAX_SORT_FETCH))).unwrap_or(MAX_SORT_FETCH);
        let Some(all) = self.fetch(&ProductQuery::new(region.id, fetch_limit)).await else {
            return ProductPage::empty();
        };
        if total > u64::from(MAX_SORT_FETCH) {
            warn!(total, limit = MAX_SORT_FETCH, "Price sort truncated to fetch limit");
        }

        let mut products = all.products;
        sort_products(&mut products, sort);
        paginate(products, total, page, limit)
    }

    /// Look up a single product by handle in a country's region.
    #[instrument(skip(self))]
    pub async fn product_by_handle(&self, country_code: &str, handle: &str) -> Option<Product> {
        let params = ListParams {
            limit: Some(1),
            handle: Some(handle.to_string()),
            ..ListParams::default()
        };
        self.list_products(1, params, RegionSelector::Country(country_code))
            .await
            .products
            .into_iter()
            .next()
    }

    async fn region(&self, selector: RegionSelector<'_>) -> Option<Region> {
        let region = match selector {
            RegionSelector::Country(code) => self.regions.resolve(code).await,
            RegionSelector::Id(id) => self.regions.retrieve(id).await,
        };
        if region.is_none() {
            warn!(?selector, "No region found for product listing");
        }
        region
    }

    async fn fetch(&self, query: &ProductQuery) -> Option<ProductList> {
        match self.backend.list_products(query).await {
            Ok(list) => Some(list),
            Err(e) => {
                warn!(error = %e, region_id = %query.region_id, "Failed to fetch products");
                None
            }
        }
    }
}
