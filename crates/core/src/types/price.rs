//! Product price selection and discount figures.
//!
//! Prices come from the backend's calculated-price block on each variant.
//! Selection never fails: a missing product, missing variants, or unpriced
//! variants simply produce `None`.

use serde::{Deserialize, Serialize};

use super::money::MoneyFormatter;
use super::product::{Product, ProductVariant};

/// Currency assumed when a calculated price carries none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Where a variant's calculated price came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    #[default]
    Default,
    Sale,
    Override,
}

impl PriceType {
    /// Map a backend `price_list_type`; unknown values are `Default`.
    #[must_use]
    pub fn from_price_list_type(value: &str) -> Self {
        match value {
            "sale" => Self::Sale,
            "override" => Self::Override,
            _ => Self::Default,
        }
    }

    /// Whether the price should be shown as a markdown.
    #[must_use]
    pub const fn is_sale(self) -> bool {
        matches!(self, Self::Sale)
    }
}

/// A resolved, display-ready variant price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantPrice {
    pub calculated_price_number: f64,
    pub calculated_price: String,
    pub original_price_number: Option<f64>,
    pub original_price: Option<String>,
    pub currency_code: String,
    pub price_type: PriceType,
    pub percentage_diff: Option<i64>,
}

/// Prices shown for a product page or card.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPrices {
    /// Cheapest priced variant.
    pub cheapest_price: Option<VariantPrice>,
    /// Price of the requested variant.
    pub variant_price: Option<VariantPrice>,
}

/// `round((original - calculated) / original * 100)`, rounding halves up.
///
/// `None` unless `original` is positive.
///
/// ```
/// use lather_core::percentage_diff;
///
/// assert_eq!(percentage_diff(20.0, 15.0), Some(25));
/// assert_eq!(percentage_diff(0.0, 15.0), None);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Percentages of finite amounts
pub fn percentage_diff(original: f64, calculated: f64) -> Option<i64> {
    if !original.is_finite() || !calculated.is_finite() || original <= 0.0 {
        return None;
    }
    let pct = (original - calculated) / original * 100.0;
    Some((pct + 0.5).floor() as i64)
}

/// Discount percentage for a cart line, shown when `0 < total < original`.
#[must_use]
pub fn line_item_savings(total: f64, original_total: f64) -> Option<i64> {
    if total > 0.0 && total < original_total {
        percentage_diff(original_total, total)
    } else {
        None
    }
}

/// Build the display price for one variant; `None` when it has no calculated amount.
#[must_use]
pub fn prices_for_variant(variant: &ProductVariant, formatter: &MoneyFormatter) -> Option<VariantPrice> {
    let price = variant.calculated_price.as_ref()?;
    let amount = price.calculated_amount?;
    let currency_code = price
        .currency_code
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string();
    let original = price.original_amount;

    Some(VariantPrice {
        calculated_price_number: amount,
        calculated_price: formatter.format(Some(amount), &currency_code),
        original_price_number: original,
        original_price: original.map(|o| formatter.format(Some(o), &currency_code)),
        price_type: PriceType::from_price_list_type(price.price_list_type()),
        percentage_diff: original.and_then(|o| percentage_diff(o, amount)),
        currency_code,
    })
}

/// The variant with the lowest calculated amount; the first one wins ties.
#[must_use]
pub fn cheapest_variant(product: &Product) -> Option<&ProductVariant> {
    product
        .variants
        .iter()
        .filter_map(|v| v.calculated_amount().map(|a| (v, a)))
        .fold(None, |best: Option<(&ProductVariant, f64)>, (v, a)| match best {
            Some((_, best_amount)) if best_amount <= a => best,
            _ => Some((v, a)),
        })
        .map(|(v, _)| v)
}

/// Lowest calculated amount across a product's variants.
#[must_use]
pub fn cheapest_amount(product: &Product) -> Option<f64> {
    cheapest_variant(product).and_then(ProductVariant::calculated_amount)
}

/// Select the cheapest and the requested variant's prices.
///
/// `variant_key` matches a variant ID or SKU.
#[must_use]
pub fn select_price(
    product: Option<&Product>,
    variant_key: Option<&str>,
    formatter: &MoneyFormatter,
) -> ProductPrices {
    let Some(product) = product else {
        return ProductPrices::default();
    };

    let cheapest_price =
        cheapest_variant(product).and_then(|v| prices_for_variant(v, formatter));
    let variant_price = variant_key
        .filter(|k| !k.is_empty())
        .and_then(|k| product.variant(k))
        .and_then(|v| prices_for_variant(v, formatter));

    ProductPrices {
        cheapest_price,
        variant_price,
    }
}
