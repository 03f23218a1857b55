//! Lather storefront library.
//!
//! Region resolution, product listing, cart and checkout flows over a
//! Medusa-compatible commerce backend, served as JSON page models. Built as
//! a library so the integration tests can mount the router directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod commerce;
pub mod config;
pub mod error;
pub mod middleware;
pub mod regions;
pub mod routes;
pub mod state;
pub mod views;

pub use routes::{app, normalized};
