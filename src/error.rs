//! Error types per concern, plus the HTTP mapping.

use axum::{
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure to obtain a usable sentence from the generator.
/// Always recovered with a fallback sentence.
#[derive(Debug, Error)]
pub enum GenerationError {
  #[error("generator unavailable: {0}")]
  Unavailable(String),
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("OpenAI HTTP {status}: {message}")]
  Api { status: u16, message: String },
  #[error("JSON parse error: {0}")]
  Parse(#[from] serde_json::Error),
  #[error("invalid sentence: {0}")]
  Invalid(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("vocabulary entry not found: {0}")]
  NotFound(String),
  #[error("invalid vocabulary entry: {0}")]
  Invalid(String),
  #[error("vocabulary file I/O failed: {0}")]
  Io(#[from] std::io::Error),
  #[error("vocabulary file is malformed: {0}")]
  Serde(#[from] serde_json::Error),
  #[error("vocabulary lock poisoned")]
  Poisoned,
  #[error("vocabulary task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PracticeError {
  #[error("no sentence is being practiced")]
  NoActiveItem,
  #[error("sentence {0} is no longer current")]
  StaleSentence(String),
}

#[derive(Debug, Error)]
pub enum SpeechError {
  #[error("speech synthesis unavailable (no OPENAI_API_KEY)")]
  Unavailable,
  #[error("nothing to speak")]
  EmptyText,
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("OpenAI HTTP {status}: {message}")]
  Api { status: u16, message: String },
}

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Json(#[from] JsonRejection),
  #[error(transparent)]
  Query(#[from] QueryRejection),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = match &self {
      AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
      AppError::Store(StoreError::Invalid(_)) => StatusCode::BAD_REQUEST,
      AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Json(rejection) => rejection.status(),
      AppError::Query(rejection) => rejection.status(),
    };
    if status.is_server_error() {
      tracing::error!(target: "tingli_backend", error = %self, "Request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
