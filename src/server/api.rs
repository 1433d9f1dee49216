use crate::error::Error;
use crate::server::AppState;
use crate::services::context::error_reply;
use crate::services::{reconcile_urls, ChatRequest, ContextAssembler, JsonFetcher, SharedScreenCache};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Body of `POST /compare`
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub parser_url: String,
    pub backend_url: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Response of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub cache: crate::services::CacheStats,
    pub upstreams: crate::server::UpstreamSummary,
    pub current_system_time: String,
}

/// Status code for an error surfaced by a JSON endpoint
fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Parse(_) => StatusCode::BAD_GATEWAY,
        e if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &Error) -> Response {
    (
        error_status(error),
        Json(serde_json::json!({
            "error": error.to_string()
        })),
    )
        .into_response()
}

/// GET / - Liveness banner
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "🚀 Kiwooming AI Server Running!"
    }))
}

/// GET /health - Uptime, cache occupancy and configured upstreams
#[instrument(skip(app_state))]
pub async fn health_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let cache = app_state.cache.stats().await;

    debug!(
        parser_entries = cache.parser_entries,
        backend_entries = cache.backend_entries,
        reconciliation_entries = cache.reconciliation_entries,
        "Returning health stats"
    );

    let health = HealthResponse {
        status: "ok",
        uptime_secs: app_state.started_at.elapsed().as_secs(),
        cache,
        upstreams: app_state.upstreams.as_ref().clone(),
        current_system_time: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(health)).into_response()
}

/// POST /chat - Answer a question about the user's current screen
///
/// Always 200: failures are reported inside `reply`, including a malformed body.
#[instrument(skip_all)]
pub async fn chat_handler(
    State(assembler): State<Arc<ContextAssembler>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> impl IntoResponse {
    let reply = match payload {
        Ok(Json(request)) => assembler.answer(&request).await,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected chat body");
            error_reply(&Error::InvalidInput(rejection.body_text()))
        }
    };
    info!(reply_chars = reply.chars().count(), "Chat reply ready");

    (StatusCode::OK, Json(ChatResponse { reply })).into_response()
}

/// POST /compare - Reconcile descriptors fetched from explicit URLs
///
/// Nothing on this path touches the screen cache.
#[instrument(skip_all)]
pub async fn compare_handler(
    State(fetcher): State<Arc<dyn JsonFetcher>>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected compare body");
            return error_response(&Error::InvalidInput(rejection.body_text()));
        }
    };
    debug!(parser_url = %request.parser_url, backend_url = %request.backend_url, "Compare request");

    match reconcile_urls(fetcher.as_ref(), &request.parser_url, &request.backend_url).await {
        Ok(result) => {
            info!(
                screen = %result.screen,
                elements = result.elements.len(),
                matched = result.matched_count(),
                "Compare complete"
            );
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Compare failed");
            error_response(&e)
        }
    }
}

/// GET /screens/{screen} - Cached reconciliation of one screen
#[instrument(skip(cache))]
pub async fn get_screen_handler(
    State(cache): State<SharedScreenCache>,
    Path(screen): Path<String>,
) -> impl IntoResponse {
    match cache.reconciliation(&screen).await {
        Ok(result) => (StatusCode::OK, Json(result.as_ref().clone())).into_response(),
        Err(e) => {
            warn!(error = %e, "Screen lookup failed");
            error_response(&e)
        }
    }
}

/// DELETE /screens/{screen} - Drop every cached value of one screen
#[instrument(skip(cache))]
pub async fn invalidate_screen_handler(
    State(cache): State<SharedScreenCache>,
    Path(screen): Path<String>,
) -> impl IntoResponse {
    match cache.invalidate(&screen).await {
        Ok(invalidated) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "screen": crate::utils::normalize_screen_name(&screen),
                "invalidated": invalidated
            })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}
