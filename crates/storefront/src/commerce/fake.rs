//! In-memory commerce backend for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use lather_core::{
    Cart, CartId, Collection, CollectionId, Country, LineItem, LineItemId, PaymentCollection,
    PaymentProvider, PaymentSession, Product, Promotion, Region, RegionId, ShippingMethod,
    ShippingOption, ShippingOptionId, VariantId,
};
use tokio::sync::Mutex;

use super::{CartUpdate, CommerceBackend, CommerceError, ProductList, ProductQuery};

pub struct FakeBackend {
    pub regions: Mutex<Vec<Region>>,
    pub products: Mutex<Vec<Product>>,
    pub carts: Mutex<HashMap<CartId, Cart>>,
    pub shipping_options: Mutex<Vec<ShippingOption>>,
    pub collections: Mutex<Vec<Collection>>,
    pub payment_providers: Mutex<Vec<PaymentProvider>>,
    pub region_calls: AtomicU64,
    pub product_calls: AtomicU64,
    pub queries: Mutex<Vec<ProductQuery>>,
    pub fail: AtomicBool,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            regions: Mutex::new(Vec::new()),
            products: Mutex::new(Vec::new()),
            carts: Mutex::new(HashMap::new()),
            shipping_options: Mutex::new(Vec::new()),
            collections: Mutex::new(Vec::new()),
            payment_providers: Mutex::new(vec![PaymentProvider {
                id: "pp_system_default".to_string(),
            }]),
            region_calls: AtomicU64::new(0),
            product_calls: AtomicU64::new(0),
            queries: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

pub fn region(id: &str, currency: &str, countries: &[&str]) -> Region {
    Region {
        id: RegionId::new(id),
        name: id.to_string(),
        currency_code: currency.to_string(),
        countries: countries
            .iter()
            .map(|c| Country {
                iso_2: Some((*c).to_string()),
                display_name: None,
            })
            .collect(),
    }
}

pub fn product(id: &str, amount: Option<f64>) -> Product {
    let json = serde_json::json!({
        "id": id,
        "title": id,
        "handle": id,
        "variants": [{
            "id": format!("{id}_variant"),
            "sku": format!("{id}-sku"),
            "calculated_price": amount.map(|a| serde_json::json!({
                "calculated_amount": a,
                "currency_code": "usd"
            }))
        }]
    });
    serde_json::from_value(json).unwrap_or_else(|e| panic!("invalid product fixture: {e}"))
}

pub fn collection(id: &str, handle: &str) -> Collection {
    Collection {
        id: CollectionId::new(id),
        title: handle.to_string(),
        handle: handle.to_string(),
        metadata: None,
    }
}

pub fn cart(id: &str, region_id: Option<&str>) -> Cart {
    let json = serde_json::json!({
        "id": id,
        "currency_code": "usd",
        "region_id": region_id,
    });
    serde_json::from_value(json).unwrap_or_else(|e| panic!("invalid cart fixture: {e}"))
}

impl FakeBackend {
    pub fn with_regions(regions: Vec<Region>) -> Self {
        Self {
            regions: Mutex::new(regions),
            ..Self::default()
        }
    }

    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CommerceError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(CommerceError::Status {
                status: 503,
                message: "backend unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn with_cart<F>(&self, id: &CartId, f: F) -> Result<Cart, CommerceError>
    where
        F: FnOnce(&mut Cart) + Send,
    {
        self.check()?;
        let mut carts = self.carts.lock().await;
        let cart = carts
            .get_mut(id)
            .ok_or_else(|| CommerceError::NotFound(format!("cart {id}")))?;
        f(cart);
        Ok(cart.clone())
    }
}

#[async_trait]
impl CommerceBackend for FakeBackend {
    async fn list_regions(&self) -> Result<Vec<Region>, CommerceError> {
        self.region_calls.fetch_add(1, Ordering::Relaxed);
        self.check()?;
        Ok(self.regions.lock().await.clone())
    }

    async fn retrieve_region(&self, id: &RegionId) -> Result<Region, CommerceError> {
        self.check()?;
        self.regions
            .lock()
            .await
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| CommerceError::NotFound(format!("region {id}")))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductList, CommerceError> {
        self.product_calls.fetch_add(1, Ordering::Relaxed);
        self.queries.lock().await.push(query.clone());
        self.check()?;
        let all: Vec<Product> = self
            .products
            .lock()
            .await
            .iter()
            .filter(|p| query.handle.as_ref().is_none_or(|h| &p.handle == h))
            .filter(|p| {
                query
                    .collection_id
                    .as_ref()
                    .is_none_or(|c| p.collection_id.as_ref() == Some(c))
            })
            .cloned()
            .collect();
        let count = all.len() as u64;
        let products = all
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok(ProductList { products, count })
    }

    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError> {
        self.check()?;
        let mut carts = self.carts.lock().await;
        let new = cart(&format!("cart_{}", carts.len() + 1), Some(region_id.as_str()));
        carts.insert(new.id.clone(), new.clone());
        Ok(new)
    }

    async fn retrieve_cart(&self, id: &CartId) -> Result<Cart, CommerceError> {
        self.with_cart(id, |_| {}).await
    }

    async fn update_cart(&self, id: &CartId, update: &CartUpdate) -> Result<Cart, CommerceError> {
        let update = update.clone();
        self.with_cart(id, move |cart| {
            if let Some(email) = update.email {
                cart.email = Some(email);
            }
            if let Some(address) = update.shipping_address {
                cart.shipping_address = Some(address);
            }
        })
        .await
    }

    async fn add_line_item(
        &self,
        id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let variant_id = variant_id.clone();
        self.with_cart(id, move |cart| {
            let line = LineItem {
                id: LineItemId::new(format!("li_{}", cart.items.len() + 1)),
                title: None,
                product_title: None,
                variant_id: Some(variant_id),
                thumbnail: None,
                quantity: i64::from(quantity),
                unit_price: Some(10.0),
                subtotal: None,
                total: Some(10.0 * f64::from(quantity)),
                original_total: None,
            };
            cart.items.push(line);
        })
        .await
    }

    async fn add_shipping_method(
        &self,
        id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, CommerceError> {
        let option_id = option_id.clone();
        self.with_cart(id, move |cart| {
            cart.shipping_methods.push(ShippingMethod {
                id: format!("sm_{}", cart.shipping_methods.len() + 1),
                shipping_option_id: Some(option_id),
                name: Some("Standard".to_string()),
                amount: Some(5.0),
            });
        })
        .await
    }

    async fn apply_promotions(&self, id: &CartId, codes: &[String]) -> Result<Cart, CommerceError> {
        let codes = codes.to_vec();
        self.with_cart(id, move |cart| {
            cart.promotions.clear();
            for code in codes {
                if cart.promotions.iter().any(|p| p.code.as_deref() == Some(code.as_str())) {
                    continue;
                }
                cart.promotions.push(Promotion {
                    id: None,
                    code: Some(code),
                    is_automatic: Some(false),
                });
            }
        })
        .await
    }

    async fn list_shipping_options(
        &self,
        _id: &CartId,
    ) -> Result<Vec<ShippingOption>, CommerceError> {
        self.check()?;
        Ok(self.shipping_options.lock().await.clone())
    }

    async fn list_payment_providers(
        &self,
        _region_id: &RegionId,
    ) -> Result<Vec<PaymentProvider>, CommerceError> {
        self.check()?;
        Ok(self.payment_providers.lock().await.clone())
    }

    async fn initiate_payment_session(
        &self,
        cart: &Cart,
        provider_id: &str,
    ) -> Result<Cart, CommerceError> {
        let provider_id = provider_id.to_string();
        let collection_id = format!("paycol_{}", cart.id);
        let session_id = format!("payses_{}", cart.id);
        self.with_cart(&cart.id, move |cart| {
            let collection = cart.payment_collection.get_or_insert_with(|| PaymentCollection {
                id: collection_id,
                status: Some("not_paid".to_string()),
                payment_sessions: Vec::new(),
            });
            collection.payment_sessions = vec![PaymentSession {
                id: session_id,
                provider_id: Some(provider_id),
                status: Some("pending".to_string()),
            }];
        })
        .await
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, CommerceError> {
        self.check()?;
        Ok(self.collections.lock().await.clone())
    }

    async fn collection_by_handle(&self, handle: &str) -> Result<Collection, CommerceError> {
        self.check()?;
        self.collections
            .lock()
            .await
            .iter()
            .find(|c| c.handle == handle)
            .cloned()
            .ok_or_else(|| CommerceError::NotFound(format!("collection {handle}")))
    }

    async fn health(&self) -> Result<(), CommerceError> {
        self.check()
    }
}
