pub mod api;

use crate::services::{ContextAssembler, JsonFetcher, SharedScreenCache};
use axum::http::HeaderValue;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upstream base URLs reported by `/health`
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamSummary {
    pub parser: String,
    pub backend: String,
    pub chart: String,
    pub model: String,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedScreenCache,
    pub assembler: Arc<ContextAssembler>,
    pub fetcher: Arc<dyn JsonFetcher>,
    pub upstreams: Arc<UpstreamSummary>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        assembler: Arc<ContextAssembler>,
        fetcher: Arc<dyn JsonFetcher>,
        upstreams: UpstreamSummary,
    ) -> Self {
        Self {
            cache: assembler.cache().clone(),
            assembler,
            fetcher,
            upstreams: Arc::new(upstreams),
            started_at: Instant::now(),
        }
    }
}

// FromRef implementations to extract specific state components
impl FromRef<AppState> for SharedScreenCache {
    fn from_ref(app_state: &AppState) -> SharedScreenCache {
        app_state.cache.clone()
    }
}

impl FromRef<AppState> for Arc<ContextAssembler> {
    fn from_ref(app_state: &AppState) -> Arc<ContextAssembler> {
        app_state.assembler.clone()
    }
}

impl FromRef<AppState> for Arc<dyn JsonFetcher> {
    fn from_ref(app_state: &AppState) -> Arc<dyn JsonFetcher> {
        app_state.fetcher.clone()
    }
}

/// Install the global fmt subscriber (`RUST_LOG`, default `info`)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
}

/// CORS for the configured origins, or any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Build the router with every route and layer
pub fn router(app_state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(api::root_handler))
        .route("/health", get(api::health_handler))
        .route("/chat", post(api::chat_handler))
        .route("/compare", post(api::compare_handler))
        .route(
            "/screens/{screen}",
            get(api::get_screen_handler).delete(api::invalidate_screen_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(app_state)
}

/// Start the axum server
pub async fn serve(
    app_state: AppState,
    port: u16,
    cors_origins: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting kiwooming server");

    tracing::info!("Registering routes:");
    tracing::info!("  GET /");
    tracing::info!("  GET /health");
    tracing::info!("  POST /chat {{text, context, section, scrollY}}");
    tracing::info!("  POST /compare {{parser_url, backend_url}}");
    tracing::info!("  GET|DELETE /screens/{{screen}}");

    let app = router(app_state, cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::warn!("still logging after a second init");
    }

    #[test]
    fn test_cors_layer_skips_invalid_origin() {
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
        let _ = cors_layer(&[]);
    }
}
