//! Collection route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::{ListParams, RegionSelector};
use crate::commerce::CommerceError;
use crate::error::{AppError, Result};
use crate::middleware::Country;
use crate::state::AppState;
use crate::views::{CollectionPageView, CollectionsPageView, ProductCardView};

/// Newest products first inside a collection.
const COLLECTION_ORDER: &str = "-created_at";

/// Collection page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    pub page: Option<String>,
}

impl CollectionQuery {
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// List every collection. A backend failure renders an empty list.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Country(country_code): Country,
) -> Json<CollectionsPageView> {
    let collections = state.backend().list_collections().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch collections");
        Vec::new()
    });

    Json(CollectionsPageView {
        country_code,
        collections,
    })
}

/// Display one collection with a page of its products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Country(country_code): Country,
    Path((_, handle)): Path<(String, String)>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<CollectionPageView>> {
    let collection = match state.backend().collection_by_handle(&handle).await {
        Ok(collection) => collection,
        Err(CommerceError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("collection {handle}")));
        }
        Err(e) => return Err(e.into()),
    };

    let page = query.page();
    let params = ListParams {
        order: Some(COLLECTION_ORDER.to_string()),
        collection_id: Some(collection.id.clone()),
        ..ListParams::default()
    };
    let listing = state
        .catalog()
        .list_products(page, params, RegionSelector::Country(country_code.as_str()))
        .await;

    Ok(Json(CollectionPageView {
        products: listing
            .products
            .iter()
            .map(|p| ProductCardView::new(p, state.formatter()))
            .collect(),
        count: listing.count,
        next_page: listing.next_page,
        country_code,
        collection,
        page,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_query_page() {
        assert_eq!(CollectionQuery::default().page(), 1);
        let query = CollectionQuery {
            page: Some(" 2 ".to_string()),
        };
        assert_eq!(query.page(), 2);
        let query = CollectionQuery {
            page: Some("-1".to_string()),
        };
        assert_eq!(query.page(), 1);
    }
}
