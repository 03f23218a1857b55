//! Domain types for the Lather storefront.
//!
//! Everything here is plain data plus pure functions over it: currency and
//! locale tables, money formatting, regions, carts and checkout steps,
//! products, collections, price selection, and listing order.

mod de;

pub mod cart;
pub mod collection;
pub mod country;
pub mod currency;
pub mod email;
pub mod id;
pub mod locale;
pub mod money;
pub mod price;
pub mod product;
pub mod region;
pub mod sort;

pub use cart::{
    Address, Cart, CartRegion, CheckoutStep, LineItem, PaymentCollection, PaymentProvider,
    PaymentSession, Promotion, ShippingMethod, ShippingOption, StepProgress, checkout_progress, resolve_step,
};
pub use collection::Collection;
pub use country::{CountryCode, CountryCodeError};
pub use currency::{CurrencyCode, CurrencyError, currency_symbol, symbol_after};
pub use email::{Email, EmailError};
pub use id::*;
pub use locale::{NumberLocale, SymbolPosition};
pub use money::{
    AmountUnit, MoneyFormatter, format_heuristic, format_minor_units, format_money,
    reformat_price_string,
};
pub use price::{
    PriceType, ProductPrices, VariantPrice, cheapest_amount, cheapest_variant, line_item_savings,
    percentage_diff, prices_for_variant, select_price,
};
pub use product::{CalculatedPrice, PriceListInfo, Product, ProductTag, ProductVariant};
pub use region::{Country, FALLBACK_COUNTRY, Region, RegionIndex};
pub use sort::{
    MAX_SORT_FETCH, PAGE_SIZE, ProductPage, SortOption, next_page, page_offset, paginate,
    sort_products,
};
