//! Commerce backend (Medusa store API) client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for regions, products, and carts
//! - [`CommerceBackend`] is the seam resolvers and handlers depend on
//! - [`MedusaClient`] implements it over HTTP with `reqwest`
//! - Product listings are cached in memory via `moka` (TTL from configuration)
//!
//! # Example
//!
//! ```rust,ignore
//! use lather_storefront::commerce::{CommerceBackend, MedusaClient};
//!
//! let client = MedusaClient::new(&config.commerce)?;
//! let regions = client.list_regions().await?;
//! ```

mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::MedusaClient;

use async_trait::async_trait;
use lather_core::{
    Address, Cart, CartId, Collection, CollectionId, PaymentProvider, Product, Region, RegionId,
    ShippingOption, ShippingOptionId, VariantId,
};
use serde::Serialize;
use thiserror::Error;

/// Product fields requested from the store API.
///
/// Calculated prices need the region; inventory, metadata, and tags are
/// opt-in on the backend.
pub const PRODUCT_FIELDS: &str =
    "*variants.calculated_price,+variants.inventory_quantity,+metadata,+tags";

/// Collection fields requested from the store API.
pub const COLLECTION_FIELDS: &str = "id,handle,title,metadata";

/// Page size for collection listings.
pub const COLLECTION_LIMIT: u32 = 100;

/// Cart fields requested from the store API.
pub const CART_FIELDS: &str = "*items,*region,*promotions,*shipping_methods,*payment_collection.payment_sessions";

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the backend error body, or a truncated raw body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Query for one page of products in a region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    pub region_id: RegionId,
    pub limit: u32,
    pub offset: u32,
    /// Backend ordering, e.g. `-created_at`.
    pub order: Option<String>,
    /// Restrict to one product handle.
    pub handle: Option<String>,
    /// Restrict to one collection.
    pub collection_id: Option<CollectionId>,
}

impl ProductQuery {
    /// First `limit` products of a region.
    #[must_use]
    pub const fn new(region_id: RegionId, limit: u32) -> Self {
        Self {
            region_id,
            limit,
            offset: 0,
            order: None,
            handle: None,
            collection_id: None,
        }
    }

    /// Query string pairs, including the field selection.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("region_id", self.region_id.to_string()),
            ("fields", PRODUCT_FIELDS.to_string()),
        ];
        if let Some(order) = &self.order {
            params.push(("order", order.clone()));
        }
        if let Some(handle) = &self.handle {
            params.push(("handle", handle.clone()));
        }
        if let Some(collection_id) = &self.collection_id {
            params.push(("collection_id", collection_id.to_string()));
        }
        params
    }
}

/// A page of products plus the total match count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub count: u64,
}

/// Fields to change on a cart. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
}

/// Operations the storefront needs from the commerce backend.
#[async_trait]
pub trait CommerceBackend: Send + Sync + 'static {
    /// All regions, in backend order.
    async fn list_regions(&self) -> Result<Vec<Region>, CommerceError>;

    /// One region by ID.
    async fn retrieve_region(&self, id: &RegionId) -> Result<Region, CommerceError>;

    /// One page of products with calculated prices for the query's region.
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductList, CommerceError>;

    /// Create an empty cart in a region.
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError>;

    /// Fetch a cart.
    async fn retrieve_cart(&self, id: &CartId) -> Result<Cart, CommerceError>;

    /// Set email and/or addresses on a cart.
    async fn update_cart(&self, id: &CartId, update: &CartUpdate) -> Result<Cart, CommerceError>;

    /// Add a variant to a cart.
    async fn add_line_item(
        &self,
        id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CommerceError>;

    /// Select a shipping option for a cart.
    async fn add_shipping_method(
        &self,
        id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, CommerceError>;

    /// Replace the cart's promotion codes with `codes`.
    ///
    /// Callers add a code by sending the existing codes plus the new one, and
    /// remove one by sending the rest.
    async fn apply_promotions(&self, id: &CartId, codes: &[String]) -> Result<Cart, CommerceError>;

    /// Shipping options available for a cart.
    async fn list_shipping_options(&self, id: &CartId)
    -> Result<Vec<ShippingOption>, CommerceError>;

    /// Payment providers enabled for a region.
    async fn list_payment_providers(
        &self,
        region_id: &RegionId,
    ) -> Result<Vec<PaymentProvider>, CommerceError>;

    /// Open a payment session with `provider_id`, creating the cart's
    /// payment collection first if it has none. Returns the updated cart.
    async fn initiate_payment_session(
        &self,
        cart: &Cart,
        provider_id: &str,
    ) -> Result<Cart, CommerceError>;

    /// Up to [`COLLECTION_LIMIT`] collections.
    async fn list_collections(&self) -> Result<Vec<Collection>, CommerceError>;

    /// One collection by handle.
    async fn collection_by_handle(&self, handle: &str) -> Result<Collection, CommerceError>;

    /// Backend liveness probe.
    async fn health(&self) -> Result<(), CommerceError>;

    /// Drop any cached product data.
    fn invalidate_products(&self) {}
}
