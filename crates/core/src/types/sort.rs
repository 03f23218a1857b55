//! Product listing sort options and pagination arithmetic.

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Serialize};

use super::price::cheapest_amount;
use super::product::Product;

/// Products per listing page.
pub const PAGE_SIZE: u32 = 12;

/// Upper bound on products fetched for an in-memory price sort.
pub const MAX_SORT_FETCH: u32 = 2000;

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// Newest first, ordered by the backend.
    #[default]
    CreatedAt,
    PriceAsc,
    PriceDesc,
}

impl SortOption {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
        }
    }

    /// Whether the backend can order by this option itself.
    #[must_use]
    pub const fn is_server_side(self) -> bool {
        matches!(self, Self::CreatedAt)
    }

    /// Backend `order` parameter for server-side options.
    #[must_use]
    pub const fn backend_order(self) -> Option<&'static str> {
        match self {
            Self::CreatedAt => Some("-created_at"),
            Self::PriceAsc | Self::PriceDesc => None,
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            _ => Err(format!("invalid sort option: {s}")),
        }
    }
}

/// Sort products in place by their cheapest calculated price.
///
/// The sort is stable. Products without any priced variant go last in both
/// directions. `CreatedAt` orders newest first, undated products last.
pub fn sort_products(products: &mut [Product], sort: SortOption) {
    match sort {
        SortOption::PriceAsc => {
            products.sort_by(|a, b| by_price(cheapest_amount(a), cheapest_amount(b), false));
        }
        SortOption::PriceDesc => {
            products.sort_by(|a, b| by_price(cheapest_amount(a), cheapest_amount(b), true));
        }
        SortOption::CreatedAt => {
            products.sort_by(|a, b| match (a.created_at, b.created_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }
    }
}

fn by_price(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.total_cmp(&y);
            if descending { ord.reverse() } else { ord }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Zero-based offset of a one-based page; pages below 1 count as 1.
#[must_use]
pub const fn page_offset(page: u32, limit: u32) -> u32 {
    let page = if page < 1 { 1 } else { page };
    (page - 1).saturating_mul(limit)
}

/// The following page number when more results exist past this window.
#[must_use]
pub const fn next_page(count: u64, page: u32, limit: u32) -> Option<u32> {
    let page = if page < 1 { 1 } else { page };
    let end = page_offset(page, limit) as u64 + limit as u64;
    if count > end { Some(page + 1) } else { None }
}

/// One page of a product listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total matching products across all pages.
    pub count: u64,
    pub next_page: Option<u32>,
}

impl ProductPage {
    /// A page with no results and no successor.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Slice one page out of a fully sorted result set.
#[must_use]
pub fn paginate(products: Vec<Product>, count: u64, page: u32, limit: u32) -> ProductPage {
    let offset = page_offset(page, limit) as usize;
    let products = products
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect();
    ProductPage {
        products,
        count,
        next_page: next_page(count, page, limit),
    }
}
