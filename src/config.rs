//! Loading application configuration (settings, scoring constants, prompts) from TOML.
//!
//! Every section is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [settings]
//! theme = "dark"
//! voice_uri = "Google 普通话（中国大陆）"
//! speech_lang = "zh-TW"
//! dev_mode = false
//! vocabulary_path = "./data/vocabulary.json"
//!
//! [scoring]
//! correct_threshold = 0.8
//! time_weight = 3.0
//!
//! [prompts]
//! sentence_system = "..."
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub settings: Settings,
  #[serde(default)]
  pub scoring: ScoringConfig,
  #[serde(default)]
  pub prompts: Prompts,
}

/// User-facing settings that used to live in browser storage.
///
/// Keys:
///   - `theme`: UI theme hint, "light" or "dark"
///   - `voice_uri`: saved speech-synthesis voice, tried first
///   - `speech_lang`: explicit language override when no Mandarin voice exists
///   - `dev_mode`: keep vocabulary in memory instead of on disk
///   - `vocabulary_path`: JSON file backing the vocabulary when not in dev mode
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
  pub theme: String,
  pub voice_uri: Option<String>,
  pub speech_lang: Option<String>,
  pub dev_mode: bool,
  pub vocabulary_path: PathBuf,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      theme: "light".into(),
      voice_uri: None,
      speech_lang: None,
      dev_mode: false,
      vocabulary_path: PathBuf::from("./data/vocabulary.json"),
    }
  }
}

/// Feedback thresholds and point formula constants.
///
/// points = round(s * accuracy_points)
///        + max(min_time_points, max_time_points - floor(t / time_bucket_secs) * (time_weight / time_weight_base))
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
  pub correct_threshold: f64,
  pub partial_threshold: f64,
  pub mastery_threshold: f64,
  pub accuracy_points: f64,
  pub max_time_points: f64,
  pub min_time_points: f64,
  pub time_bucket_secs: f64,
  pub time_weight: f64,
  pub time_weight_base: f64,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      correct_threshold: 0.8,
      partial_threshold: 0.4,
      mastery_threshold: 0.9,
      accuracy_points: 90.0,
      max_time_points: 10.0,
      min_time_points: 1.0,
      time_bucket_secs: 3.0,
      time_weight: 3.0,
      time_weight_base: 3.0,
    }
  }
}

/// Prompts used by the OpenAI client.
/// `{difficulty}` and `{vocabulary}` are substituted in the user template.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub sentence_system: String,
  pub sentence_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      sentence_system: "You are a Mandarin listening-practice content generator. Respond ONLY with strict JSON.".into(),
      sentence_user_template: "Write ONE natural Mandarin sentence at '{difficulty}' level that uses at least one of these words:\n{vocabulary}\nReturn JSON with fields: chinese, pinyin, english. Pinyin MUST use tone numbers 1-5 after each syllable, space-separated (e.g. \"ni3 hao3\"). Keep it short.".into(),
    }
  }
}

/// Load `AppConfig` from TINGLI_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("TINGLI_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "tingli_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "tingli_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "tingli_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
