//! HTTP route handlers for storefront.
//!
//! Handlers return JSON page models; the checkout page answers with a
//! `303 See Other` when the shopper belongs on another page. A
//! `{country_code}` that is not two ASCII letters is a 404.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                               - Liveness check
//! GET    /health/ready                         - Commerce backend reachability
//!
//! # Catalog
//! GET    /{country_code}/store                 - Product listing (?page, ?sort_by, ?region_id)
//! GET    /{country_code}/products/{handle}     - Product detail (?v_id)
//! GET    /{country_code}/collections           - Collection index
//! GET    /{country_code}/collections/{handle}  - Collection products (?page)
//!
//! # Cart
//! GET    /{country_code}/cart                  - Cart page
//! POST   /{country_code}/cart/line-items       - Add variant (creates cart)
//! POST   /{country_code}/cart/promotions       - Apply promotion code
//! DELETE /{country_code}/cart/promotions/{code} - Remove promotion code
//!
//! # Checkout
//! GET    /{country_code}/checkout              - Checkout page (?step) or redirect
//! POST   /{country_code}/checkout/address      - Set email and shipping address
//! POST   /{country_code}/checkout/delivery     - Select delivery method
//! POST   /{country_code}/checkout/payment      - Open payment session
//!
//! # Maintenance
//! DELETE /api/cache                            - Clear region and product caches
//! ```

pub mod cache;
pub mod cart;
pub mod checkout;
pub mod collections;
pub mod health;
pub mod products;
pub mod store;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/line-items", post(cart::add_line_item))
        .route("/promotions", post(cart::apply_promotion))
        .route("/promotions/{code}", delete(cart::remove_promotion))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/address", post(checkout::set_address))
        .route("/delivery", post(checkout::set_delivery))
        .route("/payment", post(checkout::set_payment))
}

/// Create the country-scoped routes router.
pub fn country_routes() -> Router<AppState> {
    Router::new()
        .route("/store", get(store::index))
        .route("/products/{handle}", get(products::show))
        .route("/collections", get(collections::index))
        .route("/collections/{handle}", get(collections::show))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/cache", delete(cache::clear))
        .nest("/{country_code}", country_routes())
}

/// Build the complete storefront application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Wrap the application so trailing slashes route like their bare paths.
///
/// Path normalization must run before routing, so it wraps the finished
/// router rather than being added with `Router::layer`.
pub fn normalized(app: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(app)
}
