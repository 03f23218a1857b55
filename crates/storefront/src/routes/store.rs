//! Product listing route handler.

use axum::{
    Json,
    extract::{Query, State},
};
use lather_core::{RegionId, SortOption};
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::RegionSelector;
use crate::middleware::Country;
use crate::state::AppState;
use crate::views::{ProductCardView, StorePageView};

/// Store page query parameters.
///
/// Values are kept as strings so a malformed one falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct StoreQuery {
    pub page: Option<String>,
    pub sort_by: Option<String>,
    /// Price the listing in this exact region instead of the country's.
    pub region_id: Option<String>,
}

impl StoreQuery {
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
            .max(1)
    }

    fn sort(&self) -> SortOption {
        self.sort_by
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    fn region_id(&self) -> Option<RegionId> {
        self.region_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(RegionId::new)
    }
}

/// Display the product listing for a country.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Country(country_code): Country,
    Query(query): Query<StoreQuery>,
) -> Json<StorePageView> {
    let page = query.page();
    let sort_by = query.sort();
    let region_id = query.region_id();
    let selector = region_id.as_ref().map_or(
        RegionSelector::Country(country_code.as_str()),
        RegionSelector::Id,
    );

    let listing = state
        .catalog()
        .list_products_with_sort(page, sort_by, selector, None)
        .await;

    Json(StorePageView {
        products: listing
            .products
            .iter()
            .map(|p| ProductCardView::new(p, state.formatter()))
            .collect(),
        count: listing.count,
        next_page: listing.next_page,
        country_code,
        sort_by,
        page,
    })
}
