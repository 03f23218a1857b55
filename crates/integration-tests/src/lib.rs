//! Integration tests for the Lather storefront.
//!
//! [`TestContext::start`] runs a fake Medusa store API and the real
//! storefront application on ephemeral local ports, wired together over
//! HTTP, and hands back a `reqwest` client with a cookie store so the
//! session cart survives between requests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lather-integration-tests
//! ```

pub mod medusa;

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Request;
use axum::{Router, ServiceExt};
use lather_storefront::config::{CommerceConfig, StorefrontConfig};
use lather_storefront::state::AppState;
use reqwest::Client;
use secrecy::SecretString;
use tokio::net::TcpListener;
use url::Url;

pub use medusa::{FakeMedusa, PAYMENT_PROVIDER, PROMO_CODE, PROMO_CODES, PUBLISHABLE_KEY};

/// A running fake backend and storefront.
pub struct TestContext {
    /// Client with a cookie store that does not follow redirects.
    pub client: Client,
    /// Base URL of the storefront, without a trailing slash.
    pub storefront_url: String,
    /// Handle to the fake backend's data and request counters.
    pub backend: FakeMedusa,
}

impl TestContext {
    /// Start both servers with default storefront settings.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start both servers, adjusting the storefront configuration first.
    pub async fn start_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let backend = FakeMedusa::new();
        let backend_addr = serve(backend.router()).await;

        let backend_url =
            Url::parse(&format!("http://{backend_addr}")).expect("valid backend URL");
        let mut commerce = CommerceConfig::new(backend_url);
        commerce.publishable_key = Some(SecretString::from(PUBLISHABLE_KEY));
        commerce.timeout = Duration::from_secs(5);

        let mut config = StorefrontConfig::with_commerce(commerce);
        configure(&mut config);

        let state = AppState::new(config).expect("Failed to build application state");
        let app = lather_storefront::normalized(lather_storefront::app(state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront listener");
        let storefront_addr = listener.local_addr().expect("storefront address");
        tokio::spawn(async move {
            axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
                .await
                .expect("storefront server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            storefront_url: format!("http://{storefront_addr}"),
            backend,
        }
    }

    /// Absolute storefront URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// A second shopper: same servers, empty cookie jar.
    #[must_use]
    pub fn new_client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }
}

/// Serve `router` on an ephemeral port and return its address.
async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind backend listener");
    let addr = listener.local_addr().expect("backend address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("backend server error");
    });
    addr
}
