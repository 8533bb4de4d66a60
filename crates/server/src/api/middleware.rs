//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use ticketswap_core::{AuthError, AuthRequest, Identity};
use tracing::debug;

use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Per-route request counts and latency.
///
/// Ticket numbers and wallet addresses in the path are folded into
/// placeholders, so `/tickets/7` and `/tickets/8` share a label set.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Gate in front of the `/api/v1` routes.
///
/// Those routes sign transactions with the service wallet, so unless
/// `auth.method = "none"` a request without the operator key gets 401 before
/// any ledger call. The accepted [`Identity`] is left in the request extensions
/// for the handlers that log who asked for a purchase, refund or swap.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let authenticator = state.authenticator();

    // Skip auth check if using NoneAuthenticator, but still insert anonymous identity
    if authenticator.method_name() == "none" {
        let mut request = request;
        request.extensions_mut().insert(Identity::anonymous());
        return Ok(next.run(request).await);
    }

    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    // Source IP defaults to localhost when the connect info is unavailable
    let source_ip = request
        .extensions()
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };

    match authenticator.authenticate(&auth_request).await {
        Ok(identity) => {
            let mut request = request;
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(AuthError::NotAuthenticated) => {
            debug!("Rejected request from {}: no credentials", source_ip);
            AUTH_FAILURES_TOTAL
                .with_label_values(&["not_authenticated"])
                .inc();
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(AuthError::InvalidCredentials(_)) => {
            debug!("Rejected request from {}: invalid credentials", source_ip);
            AUTH_FAILURES_TOTAL
                .with_label_values(&["invalid_credentials"])
                .inc();
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(AuthError::ConfigurationError(_)) => {
            AUTH_FAILURES_TOTAL
                .with_label_values(&["internal_error"])
                .inc();
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Who asked for a wallet operation, for the handler's log line.
///
/// `anonymous` when auth is disabled.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let caller = parts
            .extensions
            .get::<Identity>()
            .map(|id| id.caller.clone())
            .unwrap_or_else(|| "anonymous".to_string());
        std::future::ready(Ok(Caller(caller)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        middleware,
        routing::get,
        Router,
    };
    use std::sync::Arc;
    use ticketswap_core::auth::ApiKeyAuthenticator;
    use ticketswap_core::config::{AuthConfig, DeployConfig, ServerConfig};
    use ticketswap_core::{
        AuthMethod, Authenticator, Config, NoneAuthenticator, OrchestratorConfig,
        TransactionOrchestrator, WatcherConfig,
    };
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    fn create_test_state(auth_config: AuthConfig) -> Arc<AppState> {
        let authenticator: Arc<dyn Authenticator> = match auth_config.method {
            AuthMethod::None => Arc::new(NoneAuthenticator),
            AuthMethod::ApiKey => {
                Arc::new(ApiKeyAuthenticator::new(auth_config.api_key.clone().unwrap()))
            }
        };

        let config = Config {
            auth: auth_config,
            server: ServerConfig::default(),
            ledger: None,
            orchestrator: OrchestratorConfig::default(),
            watcher: WatcherConfig::default(),
            deploy: DeployConfig::default(),
        };
        let orchestrator = Arc::new(TransactionOrchestrator::new(
            config.orchestrator.clone(),
            None,
        ));

        Arc::new(AppState::new(config, authenticator, orchestrator, None))
    }

    fn api_key_state() -> Arc<AppState> {
        create_test_state(AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some("secret-key".to_string()),
        })
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(dummy_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_none_auth_allows_all() {
        let state = create_test_state(AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        });

        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_key_auth_valid() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_key_auth_invalid() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer wrong-key")
            .body(Body::empty())
            .unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_api_key_auth_missing() {
        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_x_api_key_header() {
        let request = Request::builder()
            .uri("/test")
            .header("X-API-Key", "secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app(api_key_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejected_request_never_reaches_handler() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static REACHED: AtomicUsize = AtomicUsize::new(0);
        async fn spending_handler() -> &'static str {
            REACHED.fetch_add(1, Ordering::SeqCst);
            "spent"
        }

        let state = api_key_state();
        let app = Router::new()
            .route("/purchase", axum::routing::post(spending_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        let request = Request::builder()
            .method("POST")
            .uri("/purchase")
            .header("X-API-Key", "wrong-key")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(REACHED.load(Ordering::SeqCst), 0);

        let request = Request::builder()
            .method("POST")
            .uri("/purchase")
            .header("X-API-Key", "secret-key")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(REACHED.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_caller_extractor_with_api_key() {
        use http_body_util::BodyExt;

        async fn caller_handler(Caller(caller): Caller) -> String {
            caller
        }

        let state = api_key_state();
        let app = Router::new()
            .route("/test", get(caller_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let caller = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(caller, "api_key_holder");
    }

    #[tokio::test]
    async fn test_caller_extractor_with_none_auth() {
        use http_body_util::BodyExt;

        async fn caller_handler(Caller(caller): Caller) -> String {
            caller
        }

        let state = create_test_state(AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        });
        let app = Router::new()
            .route("/test", get(caller_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), "anonymous");
    }
}
