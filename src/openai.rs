//! Minimal OpenAI client for our use-cases.
//!
//! - chat.completions in JSON mode for sentence generation
//! - audio/speech for text-to-speech
//!
//! Calls are instrumented and log model names, latencies and response sizes (not contents).
//! The API key is never logged.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{Difficulty, VocabularyWord};
use crate::error::{GenerationError, SpeechError};
use crate::sentences::{GeneratedSentence, SentenceGenerator};
use crate::util::{fill_template, trunc_for_log};

const CLIENT_UA: &str = "tingli-backend/0.1";

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub tts_model: String,
  pub tts_voice: String,
  pub prompts: Prompts,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let tts_model = std::env::var("OPENAI_TTS_MODEL").unwrap_or_else(|_| "gpt-4o-mini-tts".into());
    let tts_voice = std::env::var("OPENAI_TTS_VOICE").unwrap_or_else(|_| "alloy".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model, tts_model, tts_voice, prompts })
  }

  fn post(&self, path: &str) -> reqwest::RequestBuilder {
    self.client
      .post(format!("{}/{}", self.base_url, path))
      .header(USER_AGENT, CLIENT_UA)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, GenerationError> {
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
    };

    let res = self.post("chat/completions").json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(GenerationError::Api { status, message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    Ok(serde_json::from_str::<T>(&text)?)
  }

  /// Ask the model for one sentence at `difficulty` that uses the given words.
  #[instrument(level = "info", skip(self, vocabulary), fields(%difficulty, words = vocabulary.len(), model = %self.model))]
  pub async fn generate_sentence(
    &self,
    vocabulary: &[VocabularyWord],
    difficulty: Difficulty,
  ) -> Result<GeneratedSentence, GenerationError> {
    let difficulty_s = difficulty.to_string();
    let vocabulary_s = format_vocabulary(vocabulary);
    let user = fill_template(
      &self.prompts.sentence_user_template,
      &[("difficulty", difficulty_s.as_str()), ("vocabulary", vocabulary_s.as_str())],
    );

    let start = Instant::now();
    let result = self.chat_json::<GeneratedSentence>(&self.prompts.sentence_system, &user, 0.9).await;
    let elapsed = start.elapsed();

    match &result {
      Ok(s) => info!(
        ?elapsed,
        zh_preview = %trunc_for_log(&s.chinese, 30),
        "Sentence generated"
      ),
      Err(e) => error!(?elapsed, error = %e, "Model call failed during sentence generation"),
    }
    result
  }

  /// Text-to-speech through audio/speech. Returns MP3 bytes.
  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), model = %self.tts_model))]
  pub async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
    let req = SpeechRequest {
      model: &self.tts_model,
      voice: &self.tts_voice,
      input: text,
      response_format: "mp3",
    };
    let res = self.post("audio/speech").json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(SpeechError::Api { status, message });
    }

    let bytes = res.bytes().await?;
    info!(audio_bytes = bytes.len(), "Speech synthesized");
    Ok(bytes.to_vec())
  }
}

impl SentenceGenerator for OpenAI {
  async fn generate(
    &self,
    vocabulary: &[VocabularyWord],
    difficulty: Difficulty,
  ) -> Result<GeneratedSentence, GenerationError> {
    self.generate_sentence(vocabulary, difficulty).await
  }
}

/// One word per line: "- 喜欢 (xǐ huan): to like"
fn format_vocabulary(vocabulary: &[VocabularyWord]) -> String {
  vocabulary
    .iter()
    .map(|w| format!("- {} ({}): {}", w.chinese, w.pinyin, w.english))
    .collect::<Vec<_>>()
    .join("\n")
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
  model: &'a str,
  voice: &'a str,
  input: &'a str,
  response_format: &'a str,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_api_error_message() {
    let body = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Invalid API key"));
    assert_eq!(extract_openai_error("<html>"), None);
  }

  #[test]
  fn vocabulary_is_listed_one_per_line() {
    let words = vec![
      VocabularyWord { id: "1".into(), chinese: "茶".into(), pinyin: "chá".into(), english: "tea".into(), active: true, mastery: 0 },
      VocabularyWord { id: "2".into(), chinese: "喝".into(), pinyin: "hē".into(), english: "to drink".into(), active: true, mastery: 0 },
    ];
    assert_eq!(format_vocabulary(&words), "- 茶 (chá): tea\n- 喝 (hē): to drink");
  }
}
