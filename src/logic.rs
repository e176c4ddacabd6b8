//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Stateless answer checking (similarity, status, points)
//!   - Pinyin helpers (Hanzi → pinyin, numeric → tone marks, normalization)
//!   - Speech synthesis with a non-blocking error payload

use std::time::Duration;

use tracing::{debug, instrument};

use crate::pinyin::{convert_numeric_pinyin_to_tonal, normalize_pinyin, to_pinyin_diacritics};
use crate::protocol::{CheckIn, CheckOut, SpeechOut};
use crate::similarity::{compute_score, feedback_status, is_mastered, FeedbackStatus};
use crate::speech::synthesize;
use crate::state::AppState;

#[instrument(level = "info", skip(state, body), fields(input_len = body.user_input.len(), elapsed_ms = ?body.elapsed_ms))]
pub fn check_answer(state: &AppState, body: &CheckIn) -> CheckOut {
  let scoring = &state.config.scoring;
  let (status, similarity) = feedback_status(&body.user_input, &body.reference, scoring);

  let points = match (status, similarity, body.elapsed_ms) {
    (FeedbackStatus::Correct, Some(s), Some(ms)) => Some(compute_score(s, Duration::from_millis(ms), scoring)),
    _ => None,
  };
  let mastered = similarity.is_some_and(|s| is_mastered(s, scoring));

  debug!(target: "practice", ?status, ?similarity, "Answer checked");
  CheckOut { status, similarity, points, mastered }
}

#[instrument(level = "info", skip(text), fields(text_len = text.len()))]
pub fn do_pinyin(text: &str) -> String {
  let p = to_pinyin_diacritics(text);
  debug!(target: "tingli_backend", text, pinyin = %p, "Hanzi to pinyin");
  p
}

pub fn do_tonal(text: &str) -> String {
  convert_numeric_pinyin_to_tonal(text)
}

pub fn do_normalize(text: &str) -> String {
  normalize_pinyin(text)
}

#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn do_speech(state: &AppState, text: &str) -> SpeechOut {
  match synthesize(state.openai.as_ref(), text).await {
    Ok(audio_base64) => SpeechOut::Audio { ok: true, audio_base64, mime: "audio/mpeg" },
    Err(e) => SpeechOut::Failed { ok: false, message: e.to_string() },
  }
}
