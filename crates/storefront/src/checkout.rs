//! Checkout page resolution.
//!
//! Decides whether the checkout page can render for the current cart and
//! requested step, or where the shopper must be sent instead. Redirects are
//! plain values; the handler turns them into `303 See Other`.

use lather_core::{
    Cart, CartId, CheckoutStep, CountryCode, MoneyFormatter, PaymentProvider, RegionId,
    StepProgress, checkout_progress, resolve_step,
};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::commerce::CommerceBackend;
use crate::views::{CartView, ShippingOptionView};

/// A same-site redirect target path.
///
/// Only built from a validated [`CountryCode`], so the path always starts
/// with `/xx/` and can never point off-site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTo(String);

impl RedirectTo {
    /// The cart page for a country.
    #[must_use]
    pub fn cart(country_code: &CountryCode) -> Self {
        Self(format!("/{country_code}/cart"))
    }

    /// The checkout page at a given step.
    #[must_use]
    pub fn step(country_code: &CountryCode, step: CheckoutStep) -> Self {
        Self(format!("/{country_code}/checkout?step={step}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything the checkout page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutPage {
    pub country_code: CountryCode,
    /// Step being shown.
    pub step: CheckoutStep,
    /// First incomplete step according to the cart.
    pub next_incomplete_step: CheckoutStep,
    pub progress: Vec<StepProgress>,
    pub payment_initiated: bool,
    pub cart: CartView,
    /// Delivery options; only loaded from the delivery step on.
    pub shipping_options: Vec<ShippingOptionView>,
    /// Payment providers for the cart's region; only loaded from the
    /// payment step on.
    pub payment_providers: Vec<PaymentProvider>,
}

/// Resolve the checkout page for a cart and requested step.
///
/// # Errors
///
/// Returns the redirect to follow when:
/// - there is no cart, it cannot be loaded, or it has no region (cart page)
/// - no step, or an unknown step, was requested (derived step)
/// - review was requested before payment started (derived step)
#[instrument(skip(backend, formatter))]
pub async fn resolve_checkout_page(
    backend: &dyn CommerceBackend,
    formatter: &MoneyFormatter,
    country_code: &CountryCode,
    cart_id: Option<&CartId>,
    step: Option<&str>,
) -> Result<CheckoutPage, RedirectTo> {
    let Some(cart_id) = cart_id else {
        return Err(RedirectTo::cart(country_code));
    };

    let cart = match backend.retrieve_cart(cart_id).await {
        Ok(cart) => cart,
        Err(e) => {
            warn!(error = %e, "Failed to load cart for checkout");
            return Err(RedirectTo::cart(country_code));
        }
    };

    let Some(region_id) = cart.region_id().cloned() else {
        warn!(cart_id = %cart.id, "Cart has no valid region");
        return Err(RedirectTo::cart(country_code));
    };

    let derived = resolve_step(&cart);
    let requested = step
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<CheckoutStep>().ok());
    let step = match requested {
        None => return Err(RedirectTo::step(country_code, derived)),
        Some(CheckoutStep::Review) if !cart.payment_initiated() => {
            return Err(RedirectTo::step(country_code, derived));
        }
        Some(step) => step,
    };

    let shipping_options = if step >= CheckoutStep::Delivery {
        load_shipping_options(backend, &cart, formatter).await
    } else {
        Vec::new()
    };

    let payment_providers = if step >= CheckoutStep::Payment {
        load_payment_providers(backend, &region_id).await
    } else {
        Vec::new()
    };

    Ok(CheckoutPage {
        country_code: country_code.clone(),
        step,
        next_incomplete_step: derived,
        progress: checkout_progress(&cart),
        payment_initiated: cart.payment_initiated(),
        cart: CartView::new(&cart, formatter),
        shipping_options,
        payment_providers,
    })
}

async fn load_payment_providers(
    backend: &dyn CommerceBackend,
    region_id: &RegionId,
) -> Vec<PaymentProvider> {
    backend
        .list_payment_providers(region_id)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, region_id = %region_id, "Failed to load payment providers");
            Vec::new()
        })
}

async fn load_shipping_options(
    backend: &dyn CommerceBackend,
    cart: &Cart,
    formatter: &MoneyFormatter,
) -> Vec<ShippingOptionView> {
    let selected = cart
        .selected_shipping_method()
        .and_then(|m| m.shipping_option_id.as_ref());

    match backend.list_shipping_options(&cart.id).await {
        Ok(options) => options
            .iter()
            .map(|o| ShippingOptionView::new(o, selected, &cart.currency_code, formatter))
            .collect(),
        Err(e) => {
            warn!(error = %e, cart_id = %cart.id, "Failed to load shipping options");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lather_core::{
        Address, PaymentCollection, PaymentSession, ShippingMethod, ShippingOption,
        ShippingOptionId,
    };

    use super::*;
    use crate::commerce::fake::{FakeBackend, cart};

    async fn backend_with(cart: Cart) -> FakeBackend {
        let backend = FakeBackend::default();
        backend.carts.lock().await.insert(cart.id.clone(), cart);
        backend.shipping_options.lock().await.push(ShippingOption {
            id: ShippingOptionId::new("so_std"),
            name: "Standard".to_string(),
            amount: Some(5.0),
        });
        backend
    }

    fn addressed(mut cart: Cart) -> Cart {
        cart.email = Some("shopper@example.com".to_string());
        cart.shipping_address = Some(Address {
            address_1: Some("12 Lavender Lane".to_string()),
            country_code: Some("us".to_string()),
            ..Address::default()
        });
        cart
    }

    async fn resolve(
        backend: &FakeBackend,
        cart_id: Option<&str>,
        step: Option<&str>,
    ) -> Result<CheckoutPage, RedirectTo> {
        let id = cart_id.map(CartId::new);
        let us = CountryCode::parse("us").unwrap();
        resolve_checkout_page(backend, &MoneyFormatter::default(), &us, id.as_ref(), step).await
    }

    #[tokio::test]
    async fn test_no_cart_redirects_to_cart() {
        let backend = FakeBackend::default();
        let redirect = resolve(&backend, None, Some("address")).await.unwrap_err();
        assert_eq!(redirect.as_str(), "/us/cart");

        let redirect = resolve(&backend, Some("cart_gone"), None).await.unwrap_err();
        assert_eq!(redirect.as_str(), "/us/cart");
    }

    #[tokio::test]
    async fn test_cart_without_region_redirects_to_cart() {
        let backend = backend_with(cart("cart_1", None)).await;
        let redirect = resolve(&backend, Some("cart_1"), Some("address")).await.unwrap_err();
        assert_eq!(redirect.as_str(), "/us/cart");
    }

    #[tokio::test]
    async fn test_missing_step_redirects_to_derived_step() {
        let backend = backend_with(cart("cart_1", Some("reg_na"))).await;
        let redirect = resolve(&backend, Some("cart_1"), None).await.unwrap_err();
        assert_eq!(redirect.as_str(), "/us/checkout?step=address");

        let redirect = resolve(&backend, Some("cart_1"), Some("")).await.unwrap_err();
        assert_eq!(redirect.as_str(), "/us/checkout?step=address");

        let redirect = resolve(&backend, Some("cart_1"), Some("shipping")).await.unwrap_err();
        assert_eq!(redirect.as_str(), "/us/checkout?step=address");
    }

    #[tokio::test]
    async fn test_addressed_cart_derives_delivery() {
        let backend = backend_with(addressed(cart("cart_1", Some("reg_na")))).await;
        let redirect = resolve(&backend, Some("cart_1"), None).await.unwrap_err();
        assert_eq!(redirect.as_str(), "/us/checkout?step=delivery");

        let page = resolve(&backend, Some("cart_1"), Some("delivery")).await.unwrap();
        assert_eq!(page.step, CheckoutStep::Delivery);
        assert_eq!(page.next_incomplete_step, CheckoutStep::Delivery);
        assert!(page.progress[0].completed);
        assert_eq!(page.shipping_options.len(), 1);
        assert!(!page.shipping_options[0].selected);
    }

    #[tokio::test]
    async fn test_address_step_skips_shipping_options() {
        let backend = backend_with(cart("cart_1", Some("reg_na"))).await;
        let page = resolve(&backend, Some("cart_1"), Some("address")).await.unwrap();
        assert_eq!(page.step, CheckoutStep::Address);
        assert!(page.shipping_options.is_empty());
        assert!(page.payment_providers.is_empty());
    }

    #[test]
    fn test_redirects_stay_on_site() {
        let dk = CountryCode::parse("DK").unwrap();
        assert_eq!(RedirectTo::cart(&dk).as_str(), "/dk/cart");
        assert_eq!(
            RedirectTo::step(&dk, CheckoutStep::Payment).as_str(),
            "/dk/checkout?step=payment"
        );
    }

    #[tokio::test]
    async fn test_payment_step_without_providers_still_renders() {
        let backend = backend_with(addressed(cart("cart_1", Some("reg_na")))).await;
        backend.payment_providers.lock().await.clear();
        let page = resolve(&backend, Some("cart_1"), Some("payment")).await.unwrap();
        assert_eq!(page.step, CheckoutStep::Payment);
        assert!(page.payment_providers.is_empty());
    }

    #[tokio::test]
    async fn test_review_requires_payment() {
        let mut c = addressed(cart("cart_1", Some("reg_na")));
        c.shipping_methods.push(ShippingMethod {
            id: "sm_1".to_string(),
            shipping_option_id: Some(ShippingOptionId::new("so_std")),
            name: None,
            amount: Some(5.0),
        });
        let backend = backend_with(c.clone()).await;

        let redirect = resolve(&backend, Some("cart_1"), Some("review")).await.unwrap_err();
        assert_eq!(redirect.as_str(), "/us/checkout?step=payment");

        c.payment_collection = Some(PaymentCollection {
            id: "paycol_1".to_string(),
            status: None,
            payment_sessions: vec![PaymentSession {
                id: "ps_1".to_string(),
                provider_id: Some("pp_system_default".to_string()),
                status: None,
            }],
        });
        let backend = backend_with(c).await;
        let page = resolve(&backend, Some("cart_1"), Some("review")).await.unwrap();
        assert_eq!(page.step, CheckoutStep::Review);
        assert!(page.payment_initiated);
        assert!(page.shipping_options[0].selected);
        assert_eq!(page.payment_providers[0].id, "pp_system_default");
    }
}
