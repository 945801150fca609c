//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/exercises", get(http::http_list_exercises))
        .route("/api/v1/attempt", post(http::http_start_attempt))
        .route("/api/v1/answer", post(http::http_post_answer))
        .route("/api/v1/score", get(http::http_get_score))
        .route("/api/v1/reset", post(http::http_post_reset))
        .route("/api/v1/build", post(http::http_post_build))
        .route("/api/v1/speech/speak", post(http::http_post_speak))
        .route("/api/v1/speech/pause", post(http::http_post_pause))
        .route("/api/v1/speech/resume", post(http::http_post_resume))
        .route("/api/v1/speech/stop", post(http::http_post_stop))
        .route("/api/v1/speech/voices", get(http::http_get_voices))
        .route("/api/v1/pref", get(http::http_get_pref).post(http::http_set_pref))
        .route("/api/v1/drill", get(http::http_get_drill).post(http::http_record_drill))
        .route(
            "/api/v1/recommendation",
            get(http::http_get_recommendation).post(http::http_save_recommendation),
        )
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
