//! Product detail route handler.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use lather_core::select_price;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::Country;
use crate::state::AppState;
use crate::views::ProductPageView;

/// Product page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Selected variant ID or SKU.
    pub v_id: Option<String>,
}

/// Display a product with its prices.
///
/// Without a selected variant only the cheapest price is filled in.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Country(country_code): Country,
    Path((_, handle)): Path<(String, String)>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPageView>> {
    let product = state
        .catalog()
        .product_by_handle(country_code.as_str(), &handle)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {handle}")))?;

    let variant_key = query.v_id.as_deref().filter(|v| !v.is_empty());
    let prices = select_price(Some(&product), variant_key, state.formatter());

    Ok(Json(ProductPageView {
        country_code,
        product,
        prices,
    }))
}
