//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//!
//! Country-scoped handlers take the [`Country`] extractor, which validates
//! the `{country_code}` path segment.

pub mod country;
pub mod request_id;
pub mod session;

pub use country::Country;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{clear_cart_id, create_session_layer, get_cart_id, set_cart_id};
