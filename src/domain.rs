//! Domain models: difficulty tiers, vocabulary entries and practice sentences.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Difficulty::Beginner => "beginner",
      Difficulty::Intermediate => "intermediate",
      Difficulty::Advanced => "advanced",
    };
    f.write_str(s)
  }
}

/// One entry of the learner's word list. Only `active` entries feed sentence generation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VocabularyWord {
  pub id: String,
  pub chinese: String,
  pub pinyin: String,
  pub english: String,
  #[serde(default = "default_active")]
  pub active: bool,
  /// Number of practice attempts on sentences containing this word that reached mastery.
  #[serde(default)]
  pub mastery: u32,
}

fn default_active() -> bool { true }

/// Fields accepted when adding a word.
#[derive(Clone, Debug, Deserialize)]
pub struct NewWord {
  pub chinese: String,
  #[serde(default)]
  pub pinyin: String,
  pub english: String,
  #[serde(default = "default_active")]
  pub active: bool,
}

/// A sentence presented for listening practice.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
  pub id: String,
  pub difficulty: Difficulty,
  pub chinese: String,
  pub pinyin: String,
  pub english: String,
  pub from_fallback: bool,
  /// Ids of vocabulary entries that occur in `chinese`.
  #[serde(default)]
  pub words: Vec<String>,
}
