//! Catalog products as returned by the store API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de::{lenient_amount, null_as_default};
use super::id::{CollectionId, ProductId, VariantId};

/// Price list metadata attached to a calculated price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceListInfo {
    pub id: Option<String>,
    /// `sale` or `override`; absent for the default price set.
    pub price_list_type: Option<String>,
}

/// A variant's price in the requested region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatedPrice {
    #[serde(deserialize_with = "lenient_amount")]
    pub calculated_amount: Option<f64>,
    #[serde(deserialize_with = "lenient_amount")]
    pub original_amount: Option<f64>,
    pub currency_code: Option<String>,
    /// Details of the price list the calculated amount came from.
    pub calculated_price: Option<PriceListInfo>,
}

impl CalculatedPrice {
    /// Price list type, defaulting to `default`.
    #[must_use]
    pub fn price_list_type(&self) -> &str {
        self.calculated_price
            .as_ref()
            .and_then(|p| p.price_list_type.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or("default")
    }
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub calculated_price: Option<CalculatedPrice>,
}

impl ProductVariant {
    /// The calculated amount, when the backend priced this variant.
    #[must_use]
    pub fn calculated_amount(&self) -> Option<f64> {
        self.calculated_price
            .as_ref()
            .and_then(|p| p.calculated_amount)
    }

    /// Whether `key` names this variant by ID or SKU.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.id.as_str() == key || self.sku.as_deref() == Some(key)
    }
}

/// A product tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTag {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub collection_id: Option<CollectionId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variants: Vec<ProductVariant>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<ProductTag>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl Product {
    /// Find a variant by ID or SKU.
    #[must_use]
    pub fn variant(&self, key: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.matches(key))
    }
}
