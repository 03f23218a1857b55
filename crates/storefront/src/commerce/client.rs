//! Medusa store API client implementation.
//!
//! Plain JSON over `reqwest`. Product listings are cached with `moka`; carts
//! and regions are never cached here (regions have their own cache in
//! [`crate::regions`]).

use std::sync::Arc;

use async_trait::async_trait;
use lather_core::{
    Cart, CartId, Collection, PaymentCollection, PaymentProvider, Region, RegionId, ShippingOption,
    ShippingOptionId, VariantId,
};
use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use super::{
    CART_FIELDS, COLLECTION_FIELDS, COLLECTION_LIMIT, CartUpdate, CommerceBackend, CommerceError,
    ProductList, ProductQuery,
};
use crate::config::CommerceConfig;

/// Header carrying the publishable API key.
const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

/// Response bodies are truncated to this many characters in logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// Response envelopes
// =============================================================================

#[derive(Deserialize)]
struct RegionsResponse {
    #[serde(default)]
    regions: Vec<Region>,
}

#[derive(Deserialize)]
struct RegionResponse {
    region: Region,
}

#[derive(Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Option<Vec<lather_core::Product>>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Deserialize)]
struct CartResponse {
    cart: Cart,
}

#[derive(Deserialize)]
struct ShippingOptionsResponse {
    #[serde(default)]
    shipping_options: Vec<ShippingOption>,
}

#[derive(Deserialize)]
struct PaymentProvidersResponse {
    #[serde(default)]
    payment_providers: Vec<PaymentProvider>,
}

#[derive(Deserialize)]
struct PaymentCollectionResponse {
    payment_collection: PaymentCollection,
}

#[derive(Deserialize)]
struct CollectionsResponse {
    #[serde(default)]
    collections: Option<Vec<Collection>>,
}

/// Error body returned by the backend on 4xx/5xx.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

// =============================================================================
// MedusaClient
// =============================================================================

/// Client for the Medusa store API.
///
/// Cheap to clone; clones share the HTTP connection pool and product cache.
#[derive(Clone)]
pub struct MedusaClient {
    inner: Arc<MedusaClientInner>,
}

struct MedusaClientInner {
    client: reqwest::Client,
    base_url: String,
    publishable_key: Option<SecretString>,
    products: Cache<ProductQuery, ProductList>,
}

impl MedusaClient {
    /// Create a new store API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(MedusaClientInner {
                client,
                base_url: config.backend_url.as_str().trim_end_matches('/').to_string(),
                publishable_key: config.publishable_key.clone(),
                products,
            }),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, CommerceError> {
        let raw = format!("{}{path}", self.inner.base_url);
        if params.is_empty() {
            Ok(Url::parse(&raw)?)
        } else {
            Ok(Url::parse_with_params(&raw, params)?)
        }
    }

    /// Send a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T, CommerceError> {
        let mut request = self.inner.client.request(method, url);
        if let Some(key) = &self.inner.publishable_key {
            request = request.header(PUBLISHABLE_KEY_HEADER, key.expose_secret());
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&response_text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| truncate(&response_text, 200));

            if status == StatusCode::NOT_FOUND {
                return Err(CommerceError::NotFound(message));
            }

            if status.is_client_error() {
                tracing::warn!(status = %status, message = %message, "Commerce backend rejected request");
            } else {
                tracing::error!(
                    status = %status,
                    body = %truncate(&response_text, LOG_BODY_LIMIT),
                    "Commerce backend returned non-success status"
                );
            }
            return Err(CommerceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&response_text, LOG_BODY_LIMIT),
                "Failed to parse commerce backend response"
            );
            CommerceError::Parse(e)
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CommerceError> {
        let url = self.url(path, params)?;
        self.execute(Method::GET, url, None).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, CommerceError> {
        let url = self.url(path, &[("fields", CART_FIELDS.to_string())])?;
        self.execute(Method::POST, url, Some(body)).await
    }

    /// POST without the cart field selection.
    async fn post_plain<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, CommerceError> {
        let url = self.url(path, &[])?;
        self.execute(Method::POST, url, Some(body)).await
    }

    async fn post_cart(&self, path: &str, body: serde_json::Value) -> Result<Cart, CommerceError> {
        let response: CartResponse = self.post(path, body).await?;
        Ok(response.cart)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[async_trait]
impl CommerceBackend for MedusaClient {
    #[instrument(skip(self))]
    async fn list_regions(&self) -> Result<Vec<Region>, CommerceError> {
        let response: RegionsResponse = self.get("/store/regions", &[]).await?;
        debug!(count = response.regions.len(), "Fetched regions");
        Ok(response.regions)
    }

    #[instrument(skip(self), fields(region_id = %id))]
    async fn retrieve_region(&self, id: &RegionId) -> Result<Region, CommerceError> {
        let response: RegionResponse = self.get(&format!("/store/regions/{id}"), &[]).await?;
        Ok(response.region)
    }

    #[instrument(skip(self), fields(region_id = %query.region_id, limit = query.limit, offset = query.offset))]
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductList, CommerceError> {
        if let Some(list) = self.inner.products.get(query).await {
            debug!("Cache hit for products");
            return Ok(list);
        }

        let response: ProductsResponse = self.get("/store/products", &query.to_params()).await?;
        let list = ProductList {
            products: response.products.unwrap_or_default(),
            count: response.count.unwrap_or(0),
        };

        self.inner.products.insert(query.clone(), list.clone()).await;

        Ok(list)
    }

    #[instrument(skip(self), fields(region_id = %region_id))]
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError> {
        self.post_cart("/store/carts", json!({ "region_id": region_id }))
            .await
    }

    #[instrument(skip(self), fields(cart_id = %id))]
    async fn retrieve_cart(&self, id: &CartId) -> Result<Cart, CommerceError> {
        let response: CartResponse = self
            .get(
                &format!("/store/carts/{id}"),
                &[("fields", CART_FIELDS.to_string())],
            )
            .await?;
        Ok(response.cart)
    }

    #[instrument(skip(self, update), fields(cart_id = %id))]
    async fn update_cart(&self, id: &CartId, update: &CartUpdate) -> Result<Cart, CommerceError> {
        let body = serde_json::to_value(update)?;
        self.post_cart(&format!("/store/carts/{id}"), body).await
    }

    #[instrument(skip(self), fields(cart_id = %id, variant_id = %variant_id))]
    async fn add_line_item(
        &self,
        id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        self.post_cart(
            &format!("/store/carts/{id}/line-items"),
            json!({ "variant_id": variant_id, "quantity": quantity }),
        )
        .await
    }

    #[instrument(skip(self), fields(cart_id = %id, option_id = %option_id))]
    async fn add_shipping_method(
        &self,
        id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, CommerceError> {
        self.post_cart(
            &format!("/store/carts/{id}/shipping-methods"),
            json!({ "option_id": option_id }),
        )
        .await
    }

    #[instrument(skip(self), fields(cart_id = %id))]
    async fn apply_promotions(&self, id: &CartId, codes: &[String]) -> Result<Cart, CommerceError> {
        self.post_cart(&format!("/store/carts/{id}"), json!({ "promo_codes": codes }))
            .await
    }

    #[instrument(skip(self), fields(cart_id = %id))]
    async fn list_shipping_options(
        &self,
        id: &CartId,
    ) -> Result<Vec<ShippingOption>, CommerceError> {
        let response: ShippingOptionsResponse = self
            .get("/store/shipping-options", &[("cart_id", id.to_string())])
            .await?;
        Ok(response.shipping_options)
    }

    #[instrument(skip(self), fields(region_id = %region_id))]
    async fn list_payment_providers(
        &self,
        region_id: &RegionId,
    ) -> Result<Vec<PaymentProvider>, CommerceError> {
        let response: PaymentProvidersResponse = self
            .get(
                "/store/payment-providers",
                &[("region_id", region_id.to_string())],
            )
            .await?;
        Ok(response.payment_providers)
    }

    #[instrument(skip(self, cart), fields(cart_id = %cart.id))]
    async fn initiate_payment_session(
        &self,
        cart: &Cart,
        provider_id: &str,
    ) -> Result<Cart, CommerceError> {
        let collection_id = if let Some(collection) = &cart.payment_collection {
            collection.id.clone()
        } else {
            let created: PaymentCollectionResponse = self
                .post_plain("/store/payment-collections", json!({ "cart_id": cart.id }))
                .await?;
            debug!(payment_collection_id = %created.payment_collection.id, "Created payment collection");
            created.payment_collection.id
        };

        let _: PaymentCollectionResponse = self
            .post_plain(
                &format!("/store/payment-collections/{collection_id}/payment-sessions"),
                json!({ "provider_id": provider_id }),
            )
            .await?;

        self.retrieve_cart(&cart.id).await
    }

    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<Collection>, CommerceError> {
        let response: CollectionsResponse = self
            .get(
                "/store/collections",
                &[
                    ("limit", COLLECTION_LIMIT.to_string()),
                    ("offset", "0".to_string()),
                    ("fields", COLLECTION_FIELDS.to_string()),
                ],
            )
            .await?;
        let collections = response.collections.unwrap_or_default();
        debug!(count = collections.len(), "Fetched collections");
        Ok(collections)
    }

    #[instrument(skip(self))]
    async fn collection_by_handle(&self, handle: &str) -> Result<Collection, CommerceError> {
        let response: CollectionsResponse = self
            .get(
                "/store/collections",
                &[
                    ("handle", handle.to_string()),
                    ("fields", COLLECTION_FIELDS.to_string()),
                ],
            )
            .await?;
        response
            .collections
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| CommerceError::NotFound(format!("collection {handle}")))
    }

    #[instrument(skip(self))]
    async fn health(&self) -> Result<(), CommerceError> {
        let url = self.url("/health", &[])?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CommerceError::Status {
                status: status.as_u16(),
                message: "health check failed".to_string(),
            })
        }
    }

    fn invalidate_products(&self) {
        self.inner.products.invalidate_all();
        debug!("Product cache invalidated");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> MedusaClient {
        MedusaClient::new(&CommerceConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_url_joins_path_and_params() {
        let client = client("http://localhost:9000/");
        let url = client
            .url("/store/shipping-options", &[("cart_id", "cart_1".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/store/shipping-options?cart_id=cart_1"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = client("https://api.lather.shop/medusa");
        let url = client.url("/store/regions", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.lather.shop/medusa/store/regions");
    }

    #[test]
    fn test_products_response_tolerates_nulls() {
        let response: ProductsResponse =
            serde_json::from_str(r#"{"products": null, "count": null}"#).unwrap();
        assert!(response.products.is_none());
        assert!(response.count.is_none());
    }

    #[test]
    fn test_collections_response_tolerates_null() {
        let response: CollectionsResponse =
            serde_json::from_str(r#"{"collections": null}"#).unwrap();
        assert!(response.collections.is_none());

        let response: CollectionsResponse = serde_json::from_str(
            r#"{"collections": [{"id": "pcol_1", "handle": "gift-sets", "title": "Gift Sets"}]}"#,
        )
        .unwrap();
        assert_eq!(response.collections.unwrap()[0].title, "Gift Sets");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
