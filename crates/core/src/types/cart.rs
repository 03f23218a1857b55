//! Cart snapshots and checkout step derivation.
//!
//! Carts are owned by the commerce backend; these types are read-only views
//! of what it returns. The checkout step is derived from cart completeness
//! every time it is needed and never stored.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::de::{lenient_amount, null_as_default};
use super::id::{CartId, LineItemId, RegionId, ShippingOptionId, VariantId};

/// A postal address attached to a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    /// Primary street line. An address without one is treated as unset.
    pub address_1: Option<String>,
    pub address_2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    /// ISO 3166-1 alpha-2, lowercase.
    pub country_code: Option<String>,
    pub phone: Option<String>,
}

impl Address {
    /// Whether the primary street line is present and non-blank.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.address_1
            .as_deref()
            .is_some_and(|line| !line.trim().is_empty())
    }
}

/// A shipping method selected on the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: String,
    #[serde(default)]
    pub shipping_option_id: Option<ShippingOptionId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
}

/// A promotion applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Promotion {
    pub id: Option<String>,
    pub code: Option<String>,
    pub is_automatic: Option<bool>,
}

impl Default for Promotion {
    fn default() -> Self {
        Self {
            id: None,
            code: None,
            is_automatic: Some(false),
        }
    }
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub original_total: Option<f64>,
}

impl LineItem {
    /// Total after discounts, falling back to subtotal, then unit price times quantity.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Quantities are small
    pub fn effective_total(&self) -> f64 {
        self.total
            .filter(|t| *t != 0.0)
            .or(self.subtotal.filter(|t| *t != 0.0))
            .or_else(|| self.unit_price.map(|p| p * self.quantity as f64))
            .unwrap_or(0.0)
    }

    /// Total before discounts, with the same fallbacks as [`Self::effective_total`].
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Quantities are small
    pub fn effective_original_total(&self) -> f64 {
        self.original_total
            .filter(|t| *t != 0.0)
            .or(self.subtotal.filter(|t| *t != 0.0))
            .or_else(|| self.unit_price.map(|p| p * self.quantity as f64))
            .unwrap_or(0.0)
    }
}

/// A payment session opened with a payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub id: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// The cart's payment collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCollection {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_sessions: Vec<PaymentSession>,
}

/// A payment provider enabled for a region, e.g. `pp_system_default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProvider {
    pub id: String,
}

/// A delivery option offered for a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub id: ShippingOptionId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
}

/// The subset of region data embedded in a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartRegion {
    pub id: Option<RegionId>,
    pub name: Option<String>,
    pub currency_code: Option<String>,
}

/// A cart as returned by the commerce backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub region_id: Option<RegionId>,
    #[serde(default)]
    pub region: Option<CartRegion>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    /// Ordered by selection time; the last one is the active method.
    #[serde(default, deserialize_with = "null_as_default")]
    pub shipping_methods: Vec<ShippingMethod>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub promotions: Vec<Promotion>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub item_subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub shipping_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub discount_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<f64>,
    #[serde(default)]
    pub payment_collection: Option<PaymentCollection>,
}

impl Cart {
    /// Whether a shipping address with a street line is set.
    #[must_use]
    pub fn has_shipping_address(&self) -> bool {
        self.shipping_address.as_ref().is_some_and(Address::is_set)
    }

    /// Whether a non-blank email is set.
    #[must_use]
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    /// The active shipping method (last selected wins).
    #[must_use]
    pub fn selected_shipping_method(&self) -> Option<&ShippingMethod> {
        self.shipping_methods.last()
    }

    /// Whether at least one payment session has been opened.
    #[must_use]
    pub fn payment_initiated(&self) -> bool {
        self.payment_collection
            .as_ref()
            .is_some_and(|pc| !pc.payment_sessions.is_empty())
    }

    /// Whether a payment session with `provider_id` is already open.
    #[must_use]
    pub fn has_payment_session(&self, provider_id: &str) -> bool {
        self.payment_collection.as_ref().is_some_and(|pc| {
            pc.payment_sessions
                .iter()
                .any(|s| s.provider_id.as_deref() == Some(provider_id))
        })
    }

    /// Region ID from the embedded region, falling back to `region_id`.
    #[must_use]
    pub fn region_id(&self) -> Option<&RegionId> {
        self.region
            .as_ref()
            .and_then(|r| r.id.as_ref())
            .or(self.region_id.as_ref())
            .filter(|id| !id.as_str().is_empty())
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity.max(0)).sum()
    }

    /// Codes of applied promotions, skipping code-less automatic ones.
    #[must_use]
    pub fn promotion_codes(&self) -> Vec<&str> {
        self.promotions
            .iter()
            .filter_map(|p| p.code.as_deref())
            .collect()
    }
}

/// A stage of checkout, in the order a shopper completes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Address,
    Delivery,
    Payment,
    Review,
}

impl CheckoutStep {
    /// All steps in order.
    pub const ALL: [Self; 4] = [Self::Address, Self::Delivery, Self::Payment, Self::Review];

    /// Query-string value for this step.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Delivery => "delivery",
            Self::Payment => "payment",
            Self::Review => "review",
        }
    }

    /// Progress-bar label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Address => "Shipping Address",
            Self::Delivery => "Delivery Method",
            Self::Payment => "Payment Details",
            Self::Review => "Review Order",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckoutStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(Self::Address),
            "delivery" => Ok(Self::Delivery),
            "payment" => Ok(Self::Payment),
            "review" => Ok(Self::Review),
            _ => Err(format!("invalid checkout step: {s}")),
        }
    }
}

/// Derive the first incomplete checkout step.
///
/// Never returns [`CheckoutStep::Review`]; review is only reached by explicit
/// navigation after payment starts.
///
/// ```
/// use lather_core::{Cart, CheckoutStep, resolve_step};
///
/// let cart: Cart = serde_json::from_str(r#"{"id": "cart_1"}"#).unwrap();
/// assert_eq!(resolve_step(&cart), CheckoutStep::Address);
/// ```
#[must_use]
pub fn resolve_step(cart: &Cart) -> CheckoutStep {
    if !cart.has_shipping_address() || !cart.has_email() {
        CheckoutStep::Address
    } else if cart.shipping_methods.is_empty() {
        CheckoutStep::Delivery
    } else {
        CheckoutStep::Payment
    }
}

/// One entry of the checkout progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    pub step: CheckoutStep,
    pub label: &'static str,
    pub completed: bool,
}

/// Completion state of every step.
///
/// Payment and review are never shown as completed before the order is placed.
#[must_use]
pub fn checkout_progress(cart: &Cart) -> Vec<StepProgress> {
    CheckoutStep::ALL
        .into_iter()
        .map(|step| StepProgress {
            step,
            label: step.label(),
            completed: match step {
                CheckoutStep::Address => cart.has_shipping_address() && cart.has_email(),
                CheckoutStep::Delivery => !cart.shipping_methods.is_empty(),
                CheckoutStep::Payment | CheckoutStep::Review => false,
            },
        })
        .collect()
}
