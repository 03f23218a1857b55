//! Checkout route handlers.
//!
//! The page handler either returns the checkout page model or a
//! `303 See Other` to where the shopper must go instead. Form posts update
//! the cart and move the shopper on to the next step: address, delivery,
//! payment, then review.

use axum::{
    Form, Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use lather_core::{Address, CheckoutStep, Email, ShippingOptionId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::checkout::{RedirectTo, resolve_checkout_page};
use crate::commerce::CartUpdate;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{Country, get_cart_id};
use crate::state::AppState;

/// Checkout page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutQuery {
    pub step: Option<String>,
}

/// Shipping address form data.
#[derive(Debug, Default, Deserialize)]
pub struct AddressForm {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
}

impl AddressForm {
    /// Blank fields become `None`; the country code is lowercased.
    fn address(&self) -> Address {
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Address {
            first_name: field(&self.first_name),
            last_name: field(&self.last_name),
            company: field(&self.company),
            address_1: field(&self.address_1),
            address_2: field(&self.address_2),
            city: field(&self.city),
            province: field(&self.province),
            postal_code: field(&self.postal_code),
            country_code: field(&self.country_code).map(|c| c.to_lowercase()),
            phone: field(&self.phone),
        }
    }
}

/// Delivery method form data.
#[derive(Debug, Deserialize)]
pub struct DeliveryForm {
    pub shipping_option_id: String,
}

/// Payment method form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub provider_id: String,
}

/// Display the checkout page or redirect to the right step.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Country(country_code): Country,
    Query(query): Query<CheckoutQuery>,
) -> Response {
    let cart_id = get_cart_id(&session).await;

    match resolve_checkout_page(
        state.backend(),
        state.formatter(),
        &country_code,
        cart_id.as_ref(),
        query.step.as_deref(),
    )
    .await
    {
        Ok(page) => Json(page).into_response(),
        Err(redirect) => Redirect::to(redirect.as_str()).into_response(),
    }
}

/// Save the email and shipping address, then continue to delivery.
#[instrument(skip(state, session, form))]
pub async fn set_address(
    State(state): State<AppState>,
    session: Session,
    Country(country_code): Country,
    Form(form): Form<AddressForm>,
) -> Result<Redirect> {
    let cart_id = get_cart_id(&session)
        .await
        .ok_or_else(|| AppError::BadRequest("No existing cart found".to_string()))?;

    let email = Email::parse(&form.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let address = form.address();
    if !address.is_set() {
        return Err(AppError::BadRequest("Street address is required".to_string()));
    }

    let update = CartUpdate {
        email: Some(email.into()),
        shipping_address: Some(address.clone()),
        billing_address: Some(address),
    };
    state.backend().update_cart(&cart_id, &update).await?;
    add_breadcrumb("checkout", "Set shipping address", Some(&[("cart_id", cart_id.as_str())]));

    Ok(Redirect::to(RedirectTo::step(&country_code, CheckoutStep::Delivery).as_str()))
}

/// Select a delivery method, then continue to payment.
#[instrument(skip(state, session))]
pub async fn set_delivery(
    State(state): State<AppState>,
    session: Session,
    Country(country_code): Country,
    Form(form): Form<DeliveryForm>,
) -> Result<Redirect> {
    let cart_id = get_cart_id(&session)
        .await
        .ok_or_else(|| AppError::BadRequest("No existing cart found".to_string()))?;

    let option_id = form.shipping_option_id.trim();
    if option_id.is_empty() {
        return Err(AppError::BadRequest("Missing shipping option".to_string()));
    }

    state
        .backend()
        .add_shipping_method(&cart_id, &ShippingOptionId::new(option_id))
        .await?;
    add_breadcrumb(
        "checkout",
        "Selected delivery method",
        Some(&[("cart_id", cart_id.as_str()), ("shipping_option_id", option_id)]),
    );

    Ok(Redirect::to(RedirectTo::step(&country_code, CheckoutStep::Payment).as_str()))
}

/// Open a payment session with the chosen provider, then continue to review.
///
/// A session already open with the same provider is reused.
#[instrument(skip(state, session))]
pub async fn set_payment(
    State(state): State<AppState>,
    session: Session,
    Country(country_code): Country,
    Form(form): Form<PaymentForm>,
) -> Result<Redirect> {
    let cart_id = get_cart_id(&session)
        .await
        .ok_or_else(|| AppError::BadRequest("No existing cart found".to_string()))?;

    let provider_id = form.provider_id.trim();
    if provider_id.is_empty() {
        return Err(AppError::BadRequest("Missing payment provider".to_string()));
    }

    let cart = state.backend().retrieve_cart(&cart_id).await?;
    if cart.has_payment_session(provider_id) {
        tracing::debug!(cart_id = %cart_id, provider_id, "Payment session already open");
    } else {
        state
            .backend()
            .initiate_payment_session(&cart, provider_id)
            .await?;
        add_breadcrumb(
            "checkout",
            "Initiated payment session",
            Some(&[("cart_id", cart_id.as_str()), ("provider_id", provider_id)]),
        );
    }

    Ok(Redirect::to(RedirectTo::step(&country_code, CheckoutStep::Review).as_str()))
}
