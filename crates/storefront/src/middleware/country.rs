//! Country code extractor for country-scoped routes.
//!
//! The `{country_code}` segment is percent-decoded by the router and later
//! echoed into redirect targets, so it is validated before any handler sees
//! it. Anything but two ASCII letters is a 404.

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::request::Parts,
};
use lather_core::CountryCode;

use crate::error::AppError;

/// Name of the path parameter holding the country code.
pub const COUNTRY_PARAM: &str = "country_code";

/// Extractor for the validated, lowercased `{country_code}` path segment.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Country(country_code): Country) -> String {
///     format!("Shopping in {country_code}")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Country(pub CountryCode);

impl<S> FromRequestParts<S> for Country
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let not_found = || AppError::NotFound("page".to_string());

        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found())?;
        let raw = params
            .iter()
            .find(|(name, _)| *name == COUNTRY_PARAM)
            .map(|(_, value)| value)
            .ok_or_else(not_found)?;

        CountryCode::parse(raw).map(Self).map_err(|e| {
            tracing::debug!(error = %e, "Rejected country code");
            not_found()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new().route(
            "/{country_code}/cart",
            get(|Country(code): Country| async move { code.to_string() }),
        )
    }

    async fn call(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_code_is_lowercased() {
        assert_eq!(call("/DK/cart").await, (StatusCode::OK, "dk".to_string()));
    }

    #[tokio::test]
    async fn test_encoded_slashes_are_not_found() {
        let (status, _) = call("/%2F%2Fevil.example/cart").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call("/%2F%2F/cart").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_control_characters_are_not_found() {
        let (status, _) = call("/u%0A/cart").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_long_segment_is_not_found() {
        let (status, _) = call("/usa/cart").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
