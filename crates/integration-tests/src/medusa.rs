//! In-process fake of the Medusa store API.
//!
//! Serves the handful of `/store/*` endpoints the storefront calls, from
//! seeded regions, products and collections plus carts created during the
//! test. Amounts are in major units.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// Publishable key the fake requires on every store request.
pub const PUBLISHABLE_KEY: &str = "pk_test_lather";

/// Promotion codes the fake accepts; each takes 10% off items.
pub const PROMO_CODES: [&str; 2] = ["SUDS10", "BUBBLES10"];

/// The only promotion code most tests need.
pub const PROMO_CODE: &str = PROMO_CODES[0];

/// The payment provider every region offers.
pub const PAYMENT_PROVIDER: &str = "pp_system_default";

/// Shared handle to the fake backend's data.
#[derive(Clone)]
pub struct FakeMedusa {
    inner: Arc<Inner>,
}

struct Inner {
    regions: Mutex<Vec<Value>>,
    products: Vec<Value>,
    collections: Vec<Value>,
    shipping_options: Vec<Value>,
    carts: Mutex<HashMap<String, Value>>,
    next_id: AtomicU64,
    region_requests: AtomicU64,
    product_requests: AtomicU64,
}

type ApiResult = Result<Json<Value>, Response>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "type": "invalid_data", "message": message }))).into_response()
}

fn require_key(headers: &HeaderMap) -> Result<(), Response> {
    match headers.get("x-publishable-api-key").and_then(|v| v.to_str().ok()) {
        Some(PUBLISHABLE_KEY) => Ok(()),
        _ => Err(error(
            StatusCode::BAD_REQUEST,
            "Publishable API key required in the request header",
        )),
    }
}

fn product(
    handle: &str,
    title: &str,
    collection_id: &str,
    created_at: &str,
    variants: &[Value],
) -> Value {
    json!({
        "id": format!("prod_{handle}"),
        "title": title,
        "handle": handle,
        "collection_id": collection_id,
        "description": format!("{title}, cold-processed in small batches."),
        "thumbnail": format!("https://cdn.lather.test/{handle}.jpg"),
        "created_at": created_at,
        "variants": variants,
        "tags": [{ "id": "ptag_organic", "value": "organic" }],
        "metadata": null,
    })
}

fn variant(id: &str, sku: &str, amount: f64, original: f64, price_list_type: Option<&str>) -> Value {
    json!({
        "id": id,
        "title": "Bar",
        "sku": sku,
        "inventory_quantity": 25,
        "calculated_price": {
            "calculated_amount": amount,
            "original_amount": original,
            "currency_code": "usd",
            "calculated_price": { "price_list_type": price_list_type },
        },
    })
}

fn seed_products() -> Vec<Value> {
    vec![
        product(
            "lavender-oat",
            "Lavender Oat Bar",
            "pcol_bars",
            "2024-03-01T10:00:00Z",
            &[variant("variant_lavender", "LAV-OAT", 12.0, 12.0, None)],
        ),
        product(
            "rose-clay",
            "Rose Clay Bar",
            "pcol_bars",
            "2024-05-01T10:00:00Z",
            &[variant("variant_rose", "ROSE-CLAY", 9.0, 12.0, Some("sale"))],
        ),
        product(
            "charcoal-detox",
            "Charcoal Detox Bar",
            "pcol_bars",
            "2024-01-10T10:00:00Z",
            &[variant("variant_charcoal", "CHAR-DTX", 14.0, 14.0, None)],
        ),
        product(
            "goat-milk",
            "Goat Milk Bar",
            "pcol_bars",
            "2024-06-01T10:00:00Z",
            &[variant("variant_goat", "GOAT-MLK", 7.0, 7.0, None)],
        ),
        product(
            "gift-set",
            "Gift Set",
            "pcol_gifts",
            "2024-02-14T10:00:00Z",
            &[
                variant("variant_gift_large", "GIFT-L", 30.0, 30.0, None),
                variant("variant_gift_small", "GIFT-S", 25.0, 25.0, None),
            ],
        ),
    ]
}

fn seed_collections() -> Vec<Value> {
    vec![
        json!({ "id": "pcol_bars", "title": "Soap Bars", "handle": "bars", "metadata": null }),
        json!({ "id": "pcol_gifts", "title": "Gift Sets", "handle": "gift-sets", "metadata": null }),
    ]
}

fn seed_regions() -> Vec<Value> {
    vec![
        json!({
            "id": "reg_eu",
            "name": "Europe",
            "currency_code": "eur",
            "countries": [
                { "iso_2": "de", "display_name": "Germany" },
                { "iso_2": "fr", "display_name": "France" },
                { "iso_2": "dk", "display_name": "Denmark" },
            ],
        }),
        json!({
            "id": "reg_na",
            "name": "North America",
            "currency_code": "usd",
            "countries": [
                { "iso_2": "us", "display_name": "United States" },
                { "iso_2": "ca", "display_name": "Canada" },
            ],
        }),
    ]
}

impl Default for FakeMedusa {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMedusa {
    /// A backend seeded with two regions, five products in two collections,
    /// and two shipping options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                regions: Mutex::new(seed_regions()),
                products: seed_products(),
                collections: seed_collections(),
                shipping_options: vec![
                    json!({ "id": "so_standard", "name": "Standard", "amount": 5.0 }),
                    json!({ "id": "so_express", "name": "Express", "amount": 15.0 }),
                ],
                carts: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                region_requests: AtomicU64::new(0),
                product_requests: AtomicU64::new(0),
            }),
        }
    }

    /// The store API router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(|| async { "OK" }))
            .route("/store/regions", get(list_regions))
            .route("/store/regions/{id}", get(retrieve_region))
            .route("/store/products", get(list_products))
            .route("/store/carts", post(create_cart))
            .route("/store/carts/{id}", get(retrieve_cart).post(update_cart))
            .route("/store/carts/{id}/line-items", post(add_line_item))
            .route("/store/carts/{id}/shipping-methods", post(add_shipping_method))
            .route("/store/shipping-options", get(list_shipping_options))
            .route("/store/payment-providers", get(list_payment_providers))
            .route("/store/payment-collections", post(create_payment_collection))
            .route(
                "/store/payment-collections/{id}/payment-sessions",
                post(create_payment_session),
            )
            .route("/store/collections", get(list_collections))
            .with_state(self.clone())
    }

    /// Number of `GET /store/regions` requests served.
    #[must_use]
    pub fn region_requests(&self) -> u64 {
        self.inner.region_requests.load(Ordering::SeqCst)
    }

    /// Number of `GET /store/products` requests served.
    #[must_use]
    pub fn product_requests(&self) -> u64 {
        self.inner.product_requests.load(Ordering::SeqCst)
    }

    /// Add a region after startup.
    pub async fn add_region(&self, region: Value) {
        self.inner.regions.lock().await.push(region);
    }

    /// A stored cart, as the backend would return it.
    pub async fn cart(&self, id: &str) -> Option<Value> {
        self.inner.carts.lock().await.get(id).cloned()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}_{n:04}")
    }

    fn find_variant(&self, variant_id: &str) -> Option<(Value, Value)> {
        self.inner.products.iter().find_map(|p| {
            p["variants"]
                .as_array()?
                .iter()
                .find(|v| v["id"] == variant_id)
                .map(|v| (p.clone(), v.clone()))
        })
    }

    async fn with_cart<F>(&self, id: &str, f: F) -> ApiResult
    where
        F: FnOnce(&mut Value) -> Result<(), Response>,
    {
        let mut carts = self.inner.carts.lock().await;
        let cart = carts.get_mut(id).ok_or_else(|| {
            error(StatusCode::NOT_FOUND, &format!("Cart id not found: {id}"))
        })?;
        f(cart)?;
        recompute_totals(cart);
        Ok(Json(json!({ "cart": cart })))
    }
}

fn amount(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0)
}

fn recompute_totals(cart: &mut Value) {
    let items = cart["items"].as_array().cloned().unwrap_or_default();
    let item_subtotal: f64 = items.iter().map(|i| amount(&i["subtotal"])).sum();
    let shipping_total: f64 = cart["shipping_methods"]
        .as_array()
        .map(|m| m.iter().map(|s| amount(&s["amount"])).sum())
        .unwrap_or(0.0);
    let discounted = cart["promotions"]
        .as_array()
        .is_some_and(|p| p.iter().any(|p| PROMO_CODES.iter().any(|c| p["code"] == *c)));
    let discount_rate = if discounted { 0.1 } else { 0.0 };

    let mut discount_total = 0.0;
    let items: Vec<Value> = items
        .into_iter()
        .map(|mut item| {
            let subtotal = amount(&item["subtotal"]);
            let discount = (subtotal * discount_rate * 100.0).round() / 100.0;
            discount_total += discount;
            item["original_total"] = json!(subtotal);
            item["total"] = json!(subtotal - discount);
            item
        })
        .collect();

    cart["items"] = json!(items);
    cart["item_subtotal"] = json!(item_subtotal);
    cart["subtotal"] = json!(item_subtotal);
    cart["shipping_total"] = json!(shipping_total);
    cart["discount_total"] = json!(discount_total);
    cart["tax_total"] = json!(0.0);
    cart["total"] = json!(item_subtotal - discount_total + shipping_total);
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_regions(State(fake): State<FakeMedusa>, headers: HeaderMap) -> ApiResult {
    require_key(&headers)?;
    fake.inner.region_requests.fetch_add(1, Ordering::SeqCst);
    let regions = fake.inner.regions.lock().await.clone();
    Ok(Json(json!({ "regions": regions, "count": regions.len() })))
}

async fn retrieve_region(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    require_key(&headers)?;
    let regions = fake.inner.regions.lock().await;
    regions
        .iter()
        .find(|r| r["id"] == id.as_str())
        .map(|r| Json(json!({ "region": r })))
        .ok_or_else(|| error(StatusCode::NOT_FOUND, &format!("Region with id: {id} was not found")))
}

#[derive(Debug, Deserialize)]
struct ProductParams {
    region_id: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    order: Option<String>,
    handle: Option<String>,
    collection_id: Option<String>,
}

async fn list_products(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Query(params): Query<ProductParams>,
) -> ApiResult {
    require_key(&headers)?;
    fake.inner.product_requests.fetch_add(1, Ordering::SeqCst);
    if params.region_id.is_none() {
        return Err(error(StatusCode::BAD_REQUEST, "region_id is required for pricing"));
    }

    let mut products: Vec<Value> = fake
        .inner
        .products
        .iter()
        .filter(|p| params.handle.as_ref().is_none_or(|h| p["handle"] == h.as_str()))
        .filter(|p| {
            params
                .collection_id
                .as_ref()
                .is_none_or(|c| p["collection_id"] == c.as_str())
        })
        .cloned()
        .collect();

    if params.order.as_deref() == Some("-created_at") {
        products.sort_by(|a, b| {
            b["created_at"]
                .as_str()
                .unwrap_or_default()
                .cmp(a["created_at"].as_str().unwrap_or_default())
        });
    }

    let count = products.len();
    let products: Vec<Value> = products
        .into_iter()
        .skip(params.offset.unwrap_or(0))
        .take(params.limit.unwrap_or(50))
        .collect();

    Ok(Json(json!({
        "products": products,
        "count": count,
        "offset": params.offset.unwrap_or(0),
        "limit": params.limit.unwrap_or(50),
    })))
}

#[derive(Debug, Deserialize)]
struct CreateCartBody {
    region_id: String,
}

async fn create_cart(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Json(body): Json<CreateCartBody>,
) -> ApiResult {
    require_key(&headers)?;
    let region = fake
        .inner
        .regions
        .lock()
        .await
        .iter()
        .find(|r| r["id"] == body.region_id.as_str())
        .cloned()
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "Region not found"))?;

    let id = fake.next_id("cart");
    let mut cart = json!({
        "id": id,
        "email": null,
        "currency_code": region["currency_code"],
        "region_id": region["id"],
        "region": {
            "id": region["id"],
            "name": region["name"],
            "currency_code": region["currency_code"],
        },
        "shipping_address": null,
        "billing_address": null,
        "items": [],
        "shipping_methods": [],
        "promotions": [],
        "payment_collection": null,
    });
    recompute_totals(&mut cart);
    fake.inner.carts.lock().await.insert(id, cart.clone());

    Ok(Json(json!({ "cart": cart })))
}

async fn retrieve_cart(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    require_key(&headers)?;
    fake.with_cart(&id, |_| Ok(())).await
}

async fn update_cart(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    require_key(&headers)?;
    let promotions = body.get("promo_codes").map(promotions_from_codes).transpose()?;

    fake.with_cart(&id, |cart| {
        for key in ["email", "shipping_address", "billing_address"] {
            if let Some(value) = body.get(key) {
                cart[key] = value.clone();
            }
        }
        if let Some(promotions) = promotions {
            cart["promotions"] = promotions;
        }
        Ok(())
    })
    .await
}

/// `promo_codes` replaces the cart's promotions; any unknown code fails the update.
fn promotions_from_codes(codes: &Value) -> Result<Value, Response> {
    let codes = codes
        .as_array()
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "promo_codes must be an array"))?;
    let mut promotions = Vec::with_capacity(codes.len());
    for code in codes {
        let code = code.as_str().unwrap_or_default();
        if !PROMO_CODES.contains(&code) {
            return Err(error(
                StatusCode::BAD_REQUEST,
                &format!("The promotion code {code} is invalid"),
            ));
        }
        promotions.push(json!({
            "id": format!("promo_{}", code.to_lowercase()),
            "code": code,
            "is_automatic": false,
        }));
    }
    Ok(json!(promotions))
}

#[derive(Debug, Deserialize)]
struct LineItemBody {
    variant_id: String,
    quantity: u32,
}

async fn add_line_item(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<LineItemBody>,
) -> ApiResult {
    require_key(&headers)?;
    let (product, variant) = fake.find_variant(&body.variant_id).ok_or_else(|| {
        error(
            StatusCode::BAD_REQUEST,
            &format!("Variant {} does not exist", body.variant_id),
        )
    })?;
    let line_id = fake.next_id("cali");

    fake.with_cart(&id, move |cart| {
        let unit_price = amount(&variant["calculated_price"]["calculated_amount"]);
        let items = cart["items"].as_array_mut().ok_or_else(|| {
            error(StatusCode::INTERNAL_SERVER_ERROR, "cart has no items array")
        })?;

        if let Some(existing) = items.iter_mut().find(|i| i["variant_id"] == variant["id"]) {
            let quantity = existing["quantity"].as_u64().unwrap_or(0) + u64::from(body.quantity);
            existing["quantity"] = json!(quantity);
            #[allow(clippy::cast_precision_loss)]
            let subtotal = unit_price * quantity as f64;
            existing["subtotal"] = json!(subtotal);
        } else {
            items.push(json!({
                "id": line_id,
                "title": variant["title"],
                "product_title": product["title"],
                "variant_id": variant["id"],
                "thumbnail": product["thumbnail"],
                "quantity": body.quantity,
                "unit_price": unit_price,
                "subtotal": unit_price * f64::from(body.quantity),
            }));
        }
        Ok(())
    })
    .await
}

#[derive(Debug, Deserialize)]
struct ShippingMethodBody {
    option_id: String,
}

async fn add_shipping_method(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ShippingMethodBody>,
) -> ApiResult {
    require_key(&headers)?;
    let option = fake
        .inner
        .shipping_options
        .iter()
        .find(|o| o["id"] == body.option_id.as_str())
        .cloned()
        .ok_or_else(|| {
            error(
                StatusCode::BAD_REQUEST,
                &format!("Shipping option {} not found", body.option_id),
            )
        })?;
    let method_id = fake.next_id("casm");

    fake.with_cart(&id, move |cart| {
        cart["shipping_methods"] = json!([{
            "id": method_id,
            "shipping_option_id": option["id"],
            "name": option["name"],
            "amount": option["amount"],
        }]);
        Ok(())
    })
    .await
}

#[derive(Debug, Deserialize)]
struct ShippingOptionParams {
    cart_id: Option<String>,
}

async fn list_shipping_options(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Query(params): Query<ShippingOptionParams>,
) -> ApiResult {
    require_key(&headers)?;
    let Some(cart_id) = params.cart_id else {
        return Err(error(StatusCode::BAD_REQUEST, "cart_id is required"));
    };
    if fake.cart(&cart_id).await.is_none() {
        return Err(error(StatusCode::NOT_FOUND, &format!("Cart id not found: {cart_id}")));
    }
    Ok(Json(json!({ "shipping_options": fake.inner.shipping_options })))
}

#[derive(Debug, Deserialize)]
struct PaymentProviderParams {
    region_id: Option<String>,
}

async fn list_payment_providers(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Query(params): Query<PaymentProviderParams>,
) -> ApiResult {
    require_key(&headers)?;
    let Some(region_id) = params.region_id else {
        return Err(error(StatusCode::BAD_REQUEST, "region_id is required"));
    };
    let known = fake
        .inner
        .regions
        .lock()
        .await
        .iter()
        .any(|r| r["id"] == region_id.as_str());
    let providers = if known {
        json!([{ "id": PAYMENT_PROVIDER }])
    } else {
        json!([])
    };
    Ok(Json(json!({ "payment_providers": providers })))
}

#[derive(Debug, Deserialize)]
struct PaymentCollectionBody {
    cart_id: String,
}

async fn create_payment_collection(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Json(body): Json<PaymentCollectionBody>,
) -> ApiResult {
    require_key(&headers)?;
    let collection_id = fake.next_id("paycol");
    let mut carts = fake.inner.carts.lock().await;
    let cart = carts.get_mut(&body.cart_id).ok_or_else(|| {
        error(StatusCode::NOT_FOUND, &format!("Cart id not found: {}", body.cart_id))
    })?;
    if !cart["payment_collection"].is_null() {
        return Ok(Json(json!({ "payment_collection": cart["payment_collection"] })));
    }

    cart["payment_collection"] = json!({
        "id": collection_id,
        "status": "not_paid",
        "payment_sessions": [],
    });
    Ok(Json(json!({ "payment_collection": cart["payment_collection"] })))
}

#[derive(Debug, Deserialize)]
struct PaymentSessionBody {
    provider_id: String,
}

async fn create_payment_session(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PaymentSessionBody>,
) -> ApiResult {
    require_key(&headers)?;
    if body.provider_id != PAYMENT_PROVIDER {
        return Err(error(
            StatusCode::BAD_REQUEST,
            &format!("Payment provider {} is not enabled", body.provider_id),
        ));
    }
    let session_id = fake.next_id("payses");

    let mut carts = fake.inner.carts.lock().await;
    let collection = carts
        .values_mut()
        .map(|cart| &mut cart["payment_collection"])
        .find(|c| c["id"] == id.as_str())
        .ok_or_else(|| {
            error(StatusCode::NOT_FOUND, &format!("Payment collection {id} not found"))
        })?;

    collection["payment_sessions"] = json!([{
        "id": session_id,
        "provider_id": body.provider_id,
        "status": "pending",
    }]);
    Ok(Json(json!({ "payment_collection": collection })))
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    handle: Option<String>,
}

async fn list_collections(
    State(fake): State<FakeMedusa>,
    headers: HeaderMap,
    Query(params): Query<CollectionParams>,
) -> ApiResult {
    require_key(&headers)?;
    let collections: Vec<&Value> = fake
        .inner
        .collections
        .iter()
        .filter(|c| params.handle.as_ref().is_none_or(|h| c["handle"] == h.as_str()))
        .collect();
    Ok(Json(json!({
        "collections": collections,
        "count": collections.len(),
    })))
}
