//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
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
/// - WebSocket practice session at `/ws`
/// - JSON API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/settings", get(http::http_get_settings))
        .route("/api/v1/sentence", get(http::http_get_sentence))
        .route("/api/v1/check", post(http::http_post_check))
        .route("/api/v1/pinyin", post(http::http_post_pinyin))
        .route("/api/v1/pinyin/tonal", post(http::http_post_tonal))
        .route("/api/v1/pinyin/normalize", post(http::http_post_normalize))
        .route(
            "/api/v1/vocabulary",
            get(http::http_list_vocabulary).post(http::http_add_vocabulary),
        )
        .route(
            "/api/v1/vocabulary/:id",
            patch(http::http_patch_vocabulary).delete(http::http_delete_vocabulary),
        )
        .route("/api/v1/voice", post(http::http_post_voice))
        .route("/api/v1/speech", post(http::http_post_speech))
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
        .fallback_service(static_service)
}
