//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The session only carries
//! the shopper's cart ID; carts themselves live in the commerce backend.

use lather_core::CartId;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "lather_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Keys stored in the session.
pub mod session_keys {
    /// The shopper's active cart.
    pub const CART_ID: &str = "cart_id";
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Read the cart ID from the session.
///
/// A session read failure is treated as "no cart".
pub async fn get_cart_id(session: &Session) -> Option<CartId> {
    match session.get::<CartId>(session_keys::CART_ID).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart ID from session");
            None
        }
    }
}

/// Store the cart ID in the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_cart_id(
    session: &Session,
    cart_id: &CartId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_ID, cart_id).await
}

/// Forget the session's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_cart_id(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CartId>(session_keys::CART_ID).await?;
    Ok(())
}
