//! Cart route handlers.
//!
//! Cart IDs are stored in the session and map to carts in the commerce
//! backend. A cart is created lazily, in the country's region, on the first
//! line item. A session pointing at a cart the backend no longer knows is
//! cleared.

use axum::{
    Form, Json,
    extract::{Path, State},
};
use lather_core::{Cart, CountryCode, VariantId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::CommerceError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{Country, clear_cart_id, get_cart_id, set_cart_id};
use crate::state::AppState;
use crate::views::CartView;

/// Currency shown for an empty cart when no region can be resolved.
const FALLBACK_CURRENCY: &str = "usd";

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Promotion code form data.
#[derive(Debug, Deserialize)]
pub struct PromotionForm {
    pub code: String,
}

/// Display the cart.
///
/// A missing or unreadable cart renders as an empty cart in the country's
/// currency.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Country(country_code): Country,
) -> Json<CartView> {
    if let Some(cart_id) = get_cart_id(&session).await {
        match state.backend().retrieve_cart(&cart_id).await {
            Ok(cart) => return Json(CartView::new(&cart, state.formatter())),
            Err(CommerceError::NotFound(_)) => {
                tracing::info!(cart_id = %cart_id, "Session cart no longer exists");
                forget_cart(&session).await;
            }
            Err(e) => tracing::warn!(error = %e, cart_id = %cart_id, "Failed to fetch cart"),
        }
    }

    let currency = state
        .regions()
        .resolve(country_code.as_str())
        .await
        .map_or_else(|| FALLBACK_CURRENCY.to_string(), |r| r.currency_code);

    Json(CartView::empty(&currency, state.formatter()))
}

/// Add a variant to the cart, creating the cart if needed.
#[instrument(skip(state, session))]
pub async fn add_line_item(
    State(state): State<AppState>,
    session: Session,
    Country(country_code): Country,
    Form(form): Form<AddToCartForm>,
) -> Result<Json<CartView>> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("Quantity must be at least 1".to_string()));
    }
    let variant_id = form.variant_id.trim();
    if variant_id.is_empty() {
        return Err(AppError::BadRequest("Missing variant".to_string()));
    }

    let cart = get_or_create_cart(&state, &session, &country_code).await?;

    let cart = state
        .backend()
        .add_line_item(&cart.id, &VariantId::new(variant_id), quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added line item",
        Some(&[("cart_id", cart.id.as_str()), ("variant_id", variant_id)]),
    );

    Ok(Json(CartView::new(&cart, state.formatter())))
}

/// Apply a promotion code, keeping the codes already on the cart.
#[instrument(skip(state, session))]
pub async fn apply_promotion(
    State(state): State<AppState>,
    session: Session,
    Country(_country_code): Country,
    Form(form): Form<PromotionForm>,
) -> Result<Json<CartView>> {
    let code = form.code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("Missing promotion code".to_string()));
    }

    let cart_id = get_cart_id(&session)
        .await
        .ok_or_else(|| AppError::BadRequest("No existing cart found".to_string()))?;
    let cart = state.backend().retrieve_cart(&cart_id).await?;

    let mut codes: Vec<String> = cart
        .promotion_codes()
        .into_iter()
        .map(str::to_string)
        .collect();
    if !codes.iter().any(|c| c == code) {
        codes.push(code.to_string());
    }

    let cart = state.backend().apply_promotions(&cart.id, &codes).await?;
    add_breadcrumb("cart", "Applied promotion", Some(&[("code", code)]));

    Ok(Json(CartView::new(&cart, state.formatter())))
}

/// Remove one promotion code, keeping the others on the cart.
///
/// Removing a code the cart does not carry leaves it unchanged.
#[instrument(skip(state, session))]
pub async fn remove_promotion(
    State(state): State<AppState>,
    session: Session,
    Country(_country_code): Country,
    Path((_, code)): Path<(String, String)>,
) -> Result<Json<CartView>> {
    let cart_id = get_cart_id(&session)
        .await
        .ok_or_else(|| AppError::BadRequest("No existing cart found".to_string()))?;
    let cart = state.backend().retrieve_cart(&cart_id).await?;

    let codes: Vec<String> = cart
        .promotion_codes()
        .into_iter()
        .filter(|c| *c != code)
        .map(str::to_string)
        .collect();
    if codes.len() == cart.promotion_codes().len() {
        tracing::debug!(code = %code, "Promotion not on cart");
        return Ok(Json(CartView::new(&cart, state.formatter())));
    }

    let cart = state.backend().apply_promotions(&cart.id, &codes).await?;
    add_breadcrumb("cart", "Removed promotion", Some(&[("code", code.as_str())]));

    Ok(Json(CartView::new(&cart, state.formatter())))
}

/// Load the session's cart, or create one in the country's region.
async fn get_or_create_cart(
    state: &AppState,
    session: &Session,
    country_code: &CountryCode,
) -> Result<Cart> {
    if let Some(cart_id) = get_cart_id(session).await {
        match state.backend().retrieve_cart(&cart_id).await {
            Ok(cart) => return Ok(cart),
            Err(CommerceError::NotFound(_)) => {
                tracing::info!(cart_id = %cart_id, "Session cart no longer exists, creating a new one");
                clear_cart_id(session).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let region = state
        .regions()
        .resolve(country_code.as_str())
        .await
        .ok_or_else(|| AppError::NotFound(format!("region for country {country_code}")))?;

    let cart = state.backend().create_cart(&region.id).await?;
    set_cart_id(session, &cart.id).await?;
    tracing::info!(cart_id = %cart.id, region_id = %region.id, "Created cart");

    Ok(cart)
}

/// Drop a stale cart ID from the session.
async fn forget_cart(session: &Session) {
    if let Err(e) = clear_cart_id(session).await {
        tracing::warn!(error = %e, "Failed to clear cart ID from session");
    }
}
