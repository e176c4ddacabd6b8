//! Tingli · Mandarin listening-practice backend
//!
//! - Axum HTTP + WebSocket API
//! - Numeric pinyin → tone marks, answer similarity and scoring
//! - Optional OpenAI sentence generation and speech (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : enables sentence generation and speech if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_MODEL        : default "gpt-4o-mini"
//!   OPENAI_TTS_MODEL    : default "gpt-4o-mini-tts"
//!   OPENAI_TTS_VOICE    : default "alloy"
//!   TINGLI_CONFIG_PATH  : path to TOML config (settings, scoring, prompts)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod pinyin;
mod similarity;
mod seeds;
mod store;
mod sentences;
mod openai;
mod speech;
mod practice;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: config, vocabulary backend, optional OpenAI client.
  let state = Arc::new(AppState::from_env()?);

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "tingli_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "tingli_backend", error = %e, "Failed to listen for shutdown signal");
    return;
  }
  info!(target: "tingli_backend", "Shutdown signal received");
}
