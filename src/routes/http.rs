//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{FromRequest, FromRequestParts, Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::domain::{NewWord, VocabularyWord};
use crate::error::AppError;
use crate::logic::*;
use crate::pinyin::convert_numeric_pinyin_to_tonal;
use crate::protocol::*;
use crate::speech::select_voice;
use crate::state::AppState;

/// JSON body extractor whose rejection uses the `{"error": ...}` envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query-string extractor with the same error envelope.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.config.settings.clone())
}

#[instrument(level = "info", skip(state), fields(difficulty = %q.difficulty))]
pub async fn http_get_sentence(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<SentenceQuery>,
) -> impl IntoResponse {
  let sentence = state.next_sentence(q.difficulty).await;
  info!(target: "practice", difficulty = %q.difficulty, id = %sentence.id, from_fallback = sentence.from_fallback, "HTTP sentence served");
  Json(sentence)
}

#[instrument(level = "info", skip(state, body), fields(input_len = body.user_input.len()))]
pub async fn http_post_check(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<CheckIn>,
) -> impl IntoResponse {
  let out = check_answer(&state, &body);
  info!(target: "practice", status = ?out.status, mastered = out.mastered, "HTTP answer checked");
  Json(out)
}

#[instrument(level = "info", skip(body), fields(text_len = body.text.len()))]
pub async fn http_post_pinyin(ApiJson(body): ApiJson<TextIn>) -> impl IntoResponse {
  Json(PinyinOut { pinyin: do_pinyin(&body.text) })
}

#[instrument(level = "info", skip(body), fields(text_len = body.text.len()))]
pub async fn http_post_tonal(ApiJson(body): ApiJson<TextIn>) -> impl IntoResponse {
  Json(PinyinOut { pinyin: do_tonal(&body.text) })
}

#[instrument(level = "info", skip(body), fields(text_len = body.text.len()))]
pub async fn http_post_normalize(ApiJson(body): ApiJson<TextIn>) -> impl IntoResponse {
  Json(NormalizedOut { normalized: do_normalize(&body.text) })
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_vocabulary(
  State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VocabularyWord>>, AppError> {
  let words = state
    .vocabulary_call(|store| store.list())
    .await?
    .into_iter()
    .map(|mut w| {
      w.pinyin = convert_numeric_pinyin_to_tonal(&w.pinyin);
      w
    })
    .collect();
  Ok(Json(words))
}

#[instrument(level = "info", skip(state, body), fields(chinese = %body.chinese))]
pub async fn http_add_vocabulary(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<NewWord>,
) -> Result<impl IntoResponse, AppError> {
  let word = state.vocabulary_call(move |store| store.add(body)).await?;
  info!(target: "tingli_backend", id = %word.id, "Vocabulary entry added");
  Ok((StatusCode::CREATED, Json(word)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_patch_vocabulary(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<ActiveIn>,
) -> Result<Json<VocabularyWord>, AppError> {
  let active = body.active;
  Ok(Json(state.vocabulary_call(move |store| store.set_active(&id, active)).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_vocabulary(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
  state.vocabulary_call(move |store| store.remove(&id)).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, body), fields(voices = body.voices.len()))]
pub async fn http_post_voice(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<VoiceIn>,
) -> impl IntoResponse {
  let choice: VoiceOut = select_voice(&body.voices, &state.config.settings);
  Json(choice)
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_post_speech(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<TextIn>,
) -> impl IntoResponse {
  Json(do_speech(&state, &body.text).await)
}
