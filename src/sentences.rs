//! Sentence pipeline: AI generation → validation → fallback.
//!
//! Generation is best effort. Any failure (no generator, network, model output
//! that doesn't parse or doesn't pass validation) is logged and replaced with a
//! uniform-random sentence from the difficulty's built-in pool.

use std::future::Future;

use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Difficulty, Sentence, VocabularyWord};
use crate::error::GenerationError;
use crate::pinyin::{convert_numeric_pinyin_to_tonal, to_pinyin_diacritics};
use crate::seeds::pick_fallback;
use crate::util::is_cjk;

/// Raw generator output before validation.
#[derive(Clone, Debug, Deserialize)]
pub struct GeneratedSentence {
  pub chinese: String,
  #[serde(default)]
  pub pinyin: String,
  pub english: String,
}

/// Anything that can produce a sentence from a word list.
pub trait SentenceGenerator: Send + Sync {
  fn generate(
    &self,
    vocabulary: &[VocabularyWord],
    difficulty: Difficulty,
  ) -> impl Future<Output = Result<GeneratedSentence, GenerationError>> + Send;
}

/// Generate a sentence for `difficulty` from the active `vocabulary`, falling back to the
/// built-in pool on any failure. Never fails.
#[instrument(level = "info", skip(generator, vocabulary), fields(%difficulty, words = vocabulary.len()))]
pub async fn generate_or_fallback<G: SentenceGenerator>(
  generator: Option<&G>,
  vocabulary: &[VocabularyWord],
  difficulty: Difficulty,
) -> Sentence {
  let attempt = match generator {
    None => Err(GenerationError::Unavailable("OPENAI_API_KEY not set".into())),
    Some(_) if vocabulary.is_empty() => Err(GenerationError::Unavailable("no active vocabulary".into())),
    Some(g) => match g.generate(vocabulary, difficulty).await {
      Ok(raw) => validate_generated(raw, vocabulary, difficulty),
      Err(e) => Err(e),
    },
  };

  match attempt {
    Ok(sentence) => {
      info!(target: "practice", id = %sentence.id, words = sentence.words.len(), source = "generated", "Sentence ready");
      sentence
    }
    Err(e) => {
      let mut sentence = pick_fallback(difficulty);
      sentence.words = words_in(&sentence.chinese, vocabulary);
      warn!(target: "practice", id = %sentence.id, error = %e, source = "fallback", "Generation failed; serving fallback sentence");
      sentence
    }
  }
}

/// Accept a generated sentence only if it is usable for practice:
/// Han characters present, an English reference, and at least one active word used.
pub fn validate_generated(
  raw: GeneratedSentence,
  vocabulary: &[VocabularyWord],
  difficulty: Difficulty,
) -> Result<Sentence, GenerationError> {
  let chinese = raw.chinese.trim().to_string();
  let english = raw.english.trim().to_string();

  if !chinese.chars().any(is_cjk) {
    return Err(GenerationError::Invalid("chinese text has no Han characters".into()));
  }
  if english.is_empty() {
    return Err(GenerationError::Invalid("english reference is empty".into()));
  }
  let words = words_in(&chinese, vocabulary);
  if !vocabulary.is_empty() && words.is_empty() {
    return Err(GenerationError::Invalid("sentence uses none of the active words".into()));
  }

  let pinyin = match raw.pinyin.trim() {
    "" => to_pinyin_diacritics(&chinese),
    py => convert_numeric_pinyin_to_tonal(py),
  };

  Ok(Sentence {
    id: Uuid::new_v4().to_string(),
    difficulty,
    chinese,
    pinyin,
    english,
    from_fallback: false,
    words,
  })
}

/// Ids of vocabulary entries whose Chinese occurs in `chinese`.
pub fn words_in(chinese: &str, vocabulary: &[VocabularyWord]) -> Vec<String> {
  vocabulary
    .iter()
    .filter(|w| !w.chinese.is_empty() && chinese.contains(&w.chinese))
    .map(|w| w.id.clone())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::is_fallback_for;

  /// Generator that always returns the same result.
  struct FixedGenerator(Result<(&'static str, &'static str, &'static str), &'static str>);

  impl SentenceGenerator for FixedGenerator {
    async fn generate(
      &self,
      _vocabulary: &[VocabularyWord],
      _difficulty: Difficulty,
    ) -> Result<GeneratedSentence, GenerationError> {
      match self.0 {
        Ok((zh, py, en)) => Ok(GeneratedSentence { chinese: zh.into(), pinyin: py.into(), english: en.into() }),
        Err(msg) => Err(GenerationError::Unavailable(msg.into())),
      }
    }
  }

  fn vocab() -> Vec<VocabularyWord> {
    vec![
      VocabularyWord { id: "w-tea".into(), chinese: "茶".into(), pinyin: "chá".into(), english: "tea".into(), active: true, mastery: 0 },
      VocabularyWord { id: "w-like".into(), chinese: "喜欢".into(), pinyin: "xǐ huan".into(), english: "to like".into(), active: true, mastery: 0 },
    ]
  }

  #[tokio::test]
  async fn failing_generator_falls_back_to_requested_tier() {
    let generator = FixedGenerator(Err("boom"));
    for _ in 0..10 {
      let s = generate_or_fallback(Some(&generator), &vocab(), Difficulty::Intermediate).await;
      assert!(s.from_fallback);
      assert_eq!(s.difficulty, Difficulty::Intermediate);
      assert!(is_fallback_for(Difficulty::Intermediate, &s.chinese));
    }
  }

  #[tokio::test]
  async fn missing_generator_falls_back() {
    let s = generate_or_fallback::<FixedGenerator>(None, &vocab(), Difficulty::Advanced).await;
    assert!(s.from_fallback);
    assert!(is_fallback_for(Difficulty::Advanced, &s.chinese));
  }

  #[tokio::test]
  async fn empty_vocabulary_skips_generation() {
    let generator = FixedGenerator(Ok(("我喜欢喝茶。", "wo3 xi3 huan5 he1 cha2", "I like tea.")));
    let s = generate_or_fallback(Some(&generator), &[], Difficulty::Beginner).await;
    assert!(s.from_fallback);
  }

  #[tokio::test]
  async fn valid_generation_is_served_with_tone_marks() {
    let generator = FixedGenerator(Ok(("我喜欢喝茶。", "wo3 xi3 huan5 he1 cha2", "I like drinking tea.")));
    let s = generate_or_fallback(Some(&generator), &vocab(), Difficulty::Beginner).await;
    assert!(!s.from_fallback);
    assert_eq!(s.pinyin, "wǒ xǐ huan hē chá");
    assert_eq!(s.words, vec!["w-tea".to_string(), "w-like".to_string()]);
  }

  #[tokio::test]
  async fn invalid_generation_falls_back() {
    let generator = FixedGenerator(Ok(("I like tea", "", "I like tea")));
    let s = generate_or_fallback(Some(&generator), &vocab(), Difficulty::Beginner).await;
    assert!(s.from_fallback);
  }

  #[test]
  fn validation_rejects_sentences_without_active_words() {
    let raw = GeneratedSentence { chinese: "他是老师。".into(), pinyin: String::new(), english: "He is a teacher.".into() };
    assert!(matches!(validate_generated(raw, &vocab(), Difficulty::Beginner), Err(GenerationError::Invalid(_))));
  }

  #[test]
  fn validation_derives_missing_pinyin() {
    let raw = GeneratedSentence { chinese: "茶".into(), pinyin: " ".into(), english: "Tea.".into() };
    let s = validate_generated(raw, &vocab(), Difficulty::Beginner).expect("valid");
    assert_eq!(s.pinyin, "chá");
  }
}
