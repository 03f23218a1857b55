//! Page models returned by the route handlers.
//!
//! Every amount is formatted here, once, with the application's
//! [`MoneyFormatter`], so handlers never format money themselves.

use lather_core::{
    Cart, CartId, Collection, CountryCode, LineItem, LineItemId, MoneyFormatter, Product,
    ProductPrices, ShippingOption, ShippingOptionId, VariantId, VariantPrice, line_item_savings,
    select_price,
};
use serde::Serialize;

/// A cart line ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemView {
    pub id: LineItemId,
    pub title: String,
    pub variant_id: Option<VariantId>,
    pub thumbnail: Option<String>,
    pub quantity: i64,
    pub unit_price: String,
    pub total: String,
    /// Pre-discount total, present only when the line is discounted.
    pub original_total: Option<String>,
    pub savings_percent: Option<i64>,
}

impl LineItemView {
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Quantities are small
    pub fn new(item: &LineItem, currency_code: &str, formatter: &MoneyFormatter) -> Self {
        let total = item.effective_total();
        let original = item.effective_original_total();
        let savings_percent = line_item_savings(total, original);
        let quantity = item.quantity.max(1) as f64;
        let unit_price = item
            .unit_price
            .filter(|p| *p != 0.0)
            .unwrap_or(total / quantity);

        Self {
            id: item.id.clone(),
            title: item
                .product_title
                .clone()
                .or_else(|| item.title.clone())
                .unwrap_or_default(),
            variant_id: item.variant_id.clone(),
            thumbnail: item.thumbnail.clone(),
            quantity: item.quantity,
            unit_price: formatter.format(Some(unit_price), currency_code),
            total: formatter.format(Some(total), currency_code),
            original_total: savings_percent.map(|_| formatter.format(Some(original), currency_code)),
            savings_percent,
        }
    }
}

/// Formatted cart totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalsView {
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub discount: String,
    pub total: String,
}

/// The cart page and checkout summary model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub id: Option<CartId>,
    pub currency_code: String,
    pub email: Option<String>,
    pub items: Vec<LineItemView>,
    pub item_count: i64,
    pub promotion_codes: Vec<String>,
    pub totals: TotalsView,
}

impl CartView {
    /// A cart with no lines, in `currency_code`.
    #[must_use]
    pub fn empty(currency_code: &str, formatter: &MoneyFormatter) -> Self {
        let zero = formatter.format(Some(0.0), currency_code);
        Self {
            id: None,
            currency_code: currency_code.to_string(),
            email: None,
            items: Vec::new(),
            item_count: 0,
            promotion_codes: Vec::new(),
            totals: TotalsView {
                subtotal: zero.clone(),
                shipping: zero.clone(),
                tax: zero.clone(),
                discount: zero.clone(),
                total: zero,
            },
        }
    }

    #[must_use]
    pub fn new(cart: &Cart, formatter: &MoneyFormatter) -> Self {
        let currency = cart.currency_code.as_str();
        let fmt = |amount: Option<f64>| formatter.format(Some(amount.unwrap_or(0.0)), currency);

        Self {
            id: Some(cart.id.clone()),
            currency_code: cart.currency_code.clone(),
            email: cart.email.clone(),
            items: cart
                .items
                .iter()
                .map(|item| LineItemView::new(item, currency, formatter))
                .collect(),
            item_count: cart.item_count(),
            promotion_codes: cart
                .promotion_codes()
                .into_iter()
                .map(str::to_string)
                .collect(),
            totals: TotalsView {
                subtotal: fmt(cart.item_subtotal.or(cart.subtotal)),
                shipping: fmt(cart.shipping_total),
                tax: fmt(cart.tax_total),
                discount: fmt(cart.discount_total),
                total: fmt(cart.total),
            },
        }
    }
}

/// A delivery option with its formatted price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingOptionView {
    pub id: ShippingOptionId,
    pub name: String,
    pub price: String,
    pub selected: bool,
}

impl ShippingOptionView {
    #[must_use]
    pub fn new(
        option: &ShippingOption,
        selected: Option<&ShippingOptionId>,
        currency_code: &str,
        formatter: &MoneyFormatter,
    ) -> Self {
        Self {
            id: option.id.clone(),
            name: option.name.clone(),
            price: formatter.format(option.amount, currency_code),
            selected: selected == Some(&option.id),
        }
    }
}

/// A product tile on the listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCardView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub price: Option<VariantPrice>,
    /// The cheapest price comes from a sale price list.
    pub on_sale: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, formatter: &MoneyFormatter) -> Self {
        let ProductPrices { cheapest_price, .. } = select_price(Some(product), None, formatter);
        Self {
            id: product.id.to_string(),
            handle: product.handle.clone(),
            title: product.title.clone(),
            thumbnail: product.thumbnail.clone(),
            on_sale: cheapest_price
                .as_ref()
                .is_some_and(|p| p.price_type.is_sale()),
            price: cheapest_price,
        }
    }
}

/// The product listing page model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorePageView {
    pub country_code: CountryCode,
    pub sort_by: lather_core::SortOption,
    pub page: u32,
    pub products: Vec<ProductCardView>,
    pub count: u64,
    pub next_page: Option<u32>,
}

/// The product detail page model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPageView {
    pub country_code: CountryCode,
    pub product: Product,
    pub prices: ProductPrices,
}

/// The collections index model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionsPageView {
    pub country_code: CountryCode,
    pub collections: Vec<Collection>,
}

/// A single collection with one page of its products.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPageView {
    pub country_code: CountryCode,
    pub collection: Collection,
    pub page: u32,
    pub products: Vec<ProductCardView>,
    pub count: u64,
    pub next_page: Option<u32>,
}
