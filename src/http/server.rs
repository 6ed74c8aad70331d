//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Hold the live state and swap it on config reload
//! - Serve until shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ShimConfig;
use crate::http::request::IncomingRequest;
use crate::http::request_id::UuidRequestId;
use crate::observability::{metrics, spans::RequestSpan};
use crate::origin::normalize_origin;
use crate::proxy::Pipeline;
use crate::storefront::{StorefrontClient, StorefrontError, StorefrontQuery};

/// Errors building server state from a config.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build storefront client: {0}")]
    Storefront(#[from] StorefrontError),

    #[error("failed to build backend client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid public origin: {0}")]
    PublicOrigin(#[from] crate::origin::OriginError),
}

/// State derived from one config generation.
pub struct InnerState {
    pub config: ShimConfig,
    /// Normalized `listener.public_origin`, if set.
    pub public_origin: Option<String>,
    pub storefront: Arc<dyn StorefrontQuery>,
    pub pipeline: Pipeline,
}

impl InnerState {
    pub fn build(config: ShimConfig, storefront: Arc<dyn StorefrontQuery>) -> Result<Self, StateError> {
        let public_origin = config
            .listener
            .public_origin
            .as_deref()
            .map(normalize_origin)
            .transpose()?;
        let pipeline = Pipeline::new(&config, storefront.clone())?;

        Ok(Self {
            config,
            public_origin,
            storefront,
            pipeline,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
}

impl AppState {
    pub fn new(inner: InnerState) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(inner)),
        }
    }

    pub fn config(&self) -> ShimConfig {
        self.inner.load().config.clone()
    }
}

/// HTTP server for the shim.
pub struct HttpServer {
    router: Router,
    state: AppState,
    /// Storefront supplied by the caller; kept across reloads.
    pinned_storefront: bool,
}

impl HttpServer {
    /// Create a server talking to the configured storefront API.
    pub fn new(config: ShimConfig) -> Result<Self, StateError> {
        let storefront: Arc<dyn StorefrontQuery> = Arc::new(StorefrontClient::new(&config.storefront)?);
        Self::build(config, storefront, false)
    }

    /// Create a server that resolves through the given storefront.
    pub fn with_storefront(config: ShimConfig, storefront: Arc<dyn StorefrontQuery>) -> Result<Self, StateError> {
        Self::build(config, storefront, true)
    }

    fn build(config: ShimConfig, storefront: Arc<dyn StorefrontQuery>, pinned: bool) -> Result<Self, StateError> {
        let request_secs = config.timeouts.request_secs;
        let state = AppState::new(InnerState::build(config, storefront)?);
        let router = Self::build_router(request_secs, state.clone());

        Ok(Self {
            router,
            state,
            pinned_storefront: pinned,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(request_secs: u64, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
            .layer(TimeoutLayer::new(Duration::from_secs(request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id());

        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(middleware)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Router with state attached, for driving the app without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configs arriving on `config_updates` replace the live state; one that
    /// fails to build is logged and dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<ShimConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload = tokio::spawn(apply_reloads(self.state.clone(), config_updates, self.pinned_storefront));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn apply_reloads(state: AppState, mut updates: mpsc::UnboundedReceiver<ShimConfig>, pinned: bool) {
    while let Some(config) = updates.recv().await {
        let current = state.inner.load_full();
        if config.timeouts.request_secs != current.config.timeouts.request_secs {
            tracing::warn!("Request timeout change takes effect on restart");
        }

        let storefront = if pinned || config.storefront == current.config.storefront {
            Ok(current.storefront.clone())
        } else {
            StorefrontClient::new(&config.storefront).map(|c| Arc::new(c) as Arc<dyn StorefrontQuery>)
        };

        match storefront.map_err(StateError::from).and_then(|s| InnerState::build(config, s)) {
            Ok(next) => {
                state.inner.store(Arc::new(next));
                tracing::info!("Configuration reloaded");
            }
            Err(e) => tracing::error!(error = %e, "Reload rejected, keeping current configuration"),
        }
    }
}

/// Catch-all proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let inner = state.inner.load_full();
    let method = request.method().to_string();

    let incoming = match IncomingRequest::from_request(
        request,
        inner.public_origin.as_deref(),
        inner.config.listener.trust_forwarded_headers,
    ) {
        Ok(incoming) => incoming,
        Err(e) => {
            let response = e.into_response();
            metrics::record_request(&method, response.status().as_u16(), "none", start);
            return response;
        }
    };
    let kind = incoming.kind();

    let response = match inner.pipeline.handle(incoming).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(&method, response.status().as_u16(), kind.as_str(), start);
    tracing::debug!(
        status = response.status().as_u16(),
        path_kind = kind.as_str(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request complete"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::{CachePolicy, StorefrontResult};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct FixedDomain(&'static str);

    #[async_trait]
    impl StorefrontQuery for FixedDomain {
        async fn query(&self, _query: &str, _cache: CachePolicy) -> StorefrontResult<Value> {
            Ok(json!({ "shop": { "primaryDomain": { "url": self.0 } } }))
        }
    }

    struct Down;

    #[async_trait]
    impl StorefrontQuery for Down {
        async fn query(&self, _query: &str, _cache: CachePolicy) -> StorefrontResult<Value> {
            Err(StorefrontError::Status(503))
        }
    }

    fn config() -> ShimConfig {
        let mut config = ShimConfig::default();
        config.storefront.store_domain = "example.myshopify.com".to_string();
        config
    }

    #[tokio::test]
    async fn test_resolution_failure_is_plain_500() {
        let server = HttpServer::with_storefront(config(), Arc::new(Down)).unwrap();
        let request = Request::builder()
            .uri("/products/hat")
            .header("host", "www.example.com")
            .body(Body::empty())
            .unwrap();

        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_client_request_id_is_echoed() {
        let server = HttpServer::with_storefront(config(), Arc::new(Down)).unwrap();
        let request = Request::builder()
            .uri("/")
            .header("host", "www.example.com")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();

        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_missing_host_is_400() {
        let server = HttpServer::with_storefront(config(), Arc::new(FixedDomain("https://shop.example.com"))).unwrap();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reload_swaps_state() {
        let server = HttpServer::with_storefront(config(), Arc::new(FixedDomain("https://shop.example.com"))).unwrap();
        let state = server.state().clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(apply_reloads(state.clone(), rx, true));

        let mut next = config();
        next.rewrite.remove_no_index = false;
        next.listener.public_origin = Some("https://WWW.example.com/".to_string());
        tx.send(next).unwrap();
        drop(tx);
        task.await.unwrap();

        let inner = state.inner.load();
        assert!(!inner.pipeline.rewrite_options().remove_no_index);
        assert_eq!(inner.public_origin.as_deref(), Some("https://www.example.com"));
    }

    #[tokio::test]
    async fn test_bad_reload_keeps_current_state() {
        let server = HttpServer::with_storefront(config(), Arc::new(FixedDomain("https://shop.example.com"))).unwrap();
        let state = server.state().clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(apply_reloads(state.clone(), rx, true));

        let mut next = config();
        next.listener.public_origin = Some("not a url".to_string());
        tx.send(next).unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(state.config(), config());
    }
}
