//! Speech: which voice the client should use, and server-side synthesis.
//!
//! Voice preference: saved voice URI → any Mandarin-tagged voice → explicit
//! language override → "zh-CN".

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::config::Settings;
use crate::error::SpeechError;
use crate::openai::OpenAI;

pub const DEFAULT_SPEECH_LANG: &str = "zh-CN";

/// A voice as reported by the client's speech-synthesis engine.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
  #[serde(rename = "voiceURI")]
  pub voice_uri: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub lang: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceChoice {
  /// `None` means "let the engine pick for `lang`".
  pub voice: Option<Voice>,
  pub lang: String,
}

fn is_mandarin(lang: &str) -> bool {
  let lang = lang.to_ascii_lowercase().replace('_', "-");
  lang == "zh" || lang.starts_with("zh-") || lang == "cmn" || lang.starts_with("cmn-")
}

/// Pick a voice from `voices` following the preference order.
pub fn select_voice(voices: &[Voice], settings: &Settings) -> VoiceChoice {
  if let Some(saved) = settings.voice_uri.as_deref() {
    if let Some(v) = voices.iter().find(|v| v.voice_uri == saved) {
      return VoiceChoice { voice: Some(v.clone()), lang: v.lang.clone() };
    }
  }
  if let Some(v) = voices.iter().find(|v| is_mandarin(&v.lang)) {
    return VoiceChoice { voice: Some(v.clone()), lang: v.lang.clone() };
  }
  let lang = settings
    .speech_lang
    .clone()
    .filter(|l| !l.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_SPEECH_LANG.to_string());
  VoiceChoice { voice: None, lang }
}

/// Base64 MP3 for the given Chinese text.
#[instrument(level = "info", skip(openai, text), fields(text_len = text.len()))]
pub async fn synthesize(openai: Option<&OpenAI>, text: &str) -> Result<String, SpeechError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(SpeechError::EmptyText);
  }
  let oa = openai.ok_or(SpeechError::Unavailable)?;
  match oa.synthesize_speech(text).await {
    Ok(bytes) => Ok(STANDARD.encode(bytes)),
    Err(e) => {
      error!(target: "tingli_backend", error = %e, "Speech synthesis failed");
      Err(e)
    }
  }
}
