//! Common test utilities for API testing with a mock ledger.
//!
//! The fixture builds the real router in-process, backed by `MockLedger`, so
//! every endpoint can be exercised without a node.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use ticketswap_core::auth::ApiKeyAuthenticator;
use ticketswap_core::config::{AuthConfig, DeployConfig, ServerConfig};
use ticketswap_core::testing::MockLedger;
use ticketswap_core::{
    AuthMethod, Authenticator, Config, NoneAuthenticator, OrchestratorConfig, TicketLedger,
    TransactionOrchestrator, WatcherConfig,
};
use ticketswap_server::state::AppState;

/// Re-export fixtures for test convenience
pub use ticketswap_core::testing::fixtures;

/// Test fixture for API testing with a mock ledger.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_purchase() {
///     let fixture = TestFixture::new();
///     fixture.post("/api/v1/session/connect", json!({})).await;
///
///     let response = fixture.post("/api/v1/tickets/purchase", json!({ "count": 2 })).await;
///     assert_eq!(response.body["status"]["kind"], "success");
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock ledger; absent when the fixture has no wallet provider
    pub ledger: Option<Arc<MockLedger>>,
    pub orchestrator: Arc<TransactionOrchestrator>,
}

/// Response from a test request
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with a mock ledger and no authentication.
    pub fn new() -> Self {
        Self::build(TestConfig::default())
    }

    /// Fixture without a wallet provider.
    pub fn without_ledger() -> Self {
        Self::build(TestConfig {
            ledger: false,
            api_key: None,
        })
    }

    /// Fixture requiring `api_key` on every API route.
    pub fn with_api_key(api_key: &str) -> Self {
        Self::build(TestConfig {
            ledger: true,
            api_key: Some(api_key.to_string()),
        })
    }

    fn build(test_config: TestConfig) -> Self {
        let auth = match &test_config.api_key {
            Some(key) => AuthConfig {
                method: AuthMethod::ApiKey,
                api_key: Some(key.clone()),
            },
            None => AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
        };
        let authenticator: Arc<dyn Authenticator> = match &test_config.api_key {
            Some(key) => Arc::new(ApiKeyAuthenticator::new(key.clone())),
            None => Arc::new(NoneAuthenticator),
        };

        let config = Config {
            auth,
            server: ServerConfig::default(),
            ledger: None,
            orchestrator: OrchestratorConfig::default(),
            watcher: WatcherConfig::default(),
            deploy: DeployConfig::default(),
        };

        let ledger = test_config.ledger.then(|| Arc::new(MockLedger::new()));
        let orchestrator = Arc::new(TransactionOrchestrator::new(
            config.orchestrator.clone(),
            ledger
                .clone()
                .map(|l| l as Arc<dyn TicketLedger>),
        ));

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            Arc::clone(&orchestrator),
            None,
        ));
        let router = ticketswap_server::api::create_router(state);

        Self {
            router,
            ledger,
            orchestrator,
        }
    }

    /// The mock ledger. Panics for fixtures built without one.
    pub fn ledger(&self) -> &MockLedger {
        self.ledger.as_deref().expect("fixture has no ledger")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), &[]).await
    }

    /// Send a GET request with extra headers.
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request("GET", path, None, headers).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Back the orchestrator with a mock ledger
    pub ledger: bool,
    /// Require this API key
    pub api_key: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            ledger: true,
            api_key: None,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
