//! Cache maintenance route handlers.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use crate::state::AppState;

/// Drop the cached region list and product listings.
///
/// The next request refetches both from the commerce backend.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> StatusCode {
    state.regions().clear().await;
    state.backend().invalidate_products();
    tracing::info!("Storefront caches cleared");
    StatusCode::NO_CONTENT
}
