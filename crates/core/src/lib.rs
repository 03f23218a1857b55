//! Lather Core - Domain types for the Lather storefront.
//!
//! This crate holds the pieces of the storefront that do not talk to the
//! network:
//! - currency symbols, number locales, and money formatting
//! - region lookup by country code with fallback
//! - cart snapshots and checkout step derivation
//! - product price selection and listing sort/pagination
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. The storefront crate owns the commerce backend client
//! and caches and feeds fetched data through these functions.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
