//! End-to-end test harness for Orchard.
//!
//! Each test spawns the real routers on an ephemeral port, pointed at a
//! `wiremock` server standing in for the commerce API. Sessions use
//! `MemoryStore`, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p orchard-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;

use axum::Router;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::SecretString;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use url::Url;
use wiremock::MockServer;

/// Service token the admin sends in tests.
pub const SERVICE_TOKEN: &str = "oat_7fK2mQ9xLp4Rz8Wv3Nc6Hb1Ty5";

/// A running app and a client with its own cookie jar.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A second visitor: same server, fresh cookie jar.
    #[must_use]
    pub fn new_visitor(&self, ip: &str) -> Self {
        Self {
            addr: self.addr,
            client: client(ip),
        }
    }
}

/// Client with a cookie store. The storefront rate limiter keys on the
/// forwarded client IP, so every client sends one.
#[must_use]
pub fn client(ip: &str) -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(ip).expect("valid IP header"),
    );
    reqwest::Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client builds")
}

async fn serve(router: Router, ip: &str) -> TestApp {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server runs");
    });
    TestApp {
        addr,
        client: client(ip),
    }
}

fn api_url(api: &MockServer) -> Url {
    Url::parse(&api.uri()).expect("mock server URI")
}

/// Spawn the storefront against `api`.
pub async fn spawn_storefront(api: &MockServer, ip: &str) -> TestApp {
    use orchard_storefront::config::{ApiConfig, StorefrontConfig};
    use orchard_storefront::state::AppState;

    let config = StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: "127.0.0.1".parse().expect("ip"),
        port: 0,
        base_url: "http://localhost".to_string(),
        api: ApiConfig {
            base_url: api_url(api),
            timeout_secs: 5,
            cache_ttl_secs: 60,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    };
    let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    let state = AppState::new(config).expect("storefront state");
    serve(orchard_storefront::app(state, sessions), ip).await
}

/// Spawn the admin against `api`.
pub async fn spawn_admin(api: &MockServer) -> TestApp {
    use orchard_admin::config::{AdminConfig, ApiConfig};
    use orchard_admin::state::AppState;

    let config = AdminConfig {
        host: "127.0.0.1".parse().expect("ip"),
        port: 0,
        api: ApiConfig {
            base_url: api_url(api),
            token: SecretString::from(SERVICE_TOKEN),
            timeout_secs: 5,
        },
        lookup_cache_ttl_secs: 60,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
        tls: None,
    };
    let state = AppState::new(config).expect("admin state");
    serve(orchard_admin::app(state), "127.0.0.1").await
}
