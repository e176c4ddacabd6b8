//! Answer similarity, feedback buckets and the point formula.
//!
//! The similarity is a Sørensen–Dice coefficient over character bigrams of
//! the normalized strings (lowercase, no punctuation, whitespace ignored).

use std::time::Duration;

use serde::Serialize;

use crate::config::ScoringConfig;

/// Feedback state shown to the learner while typing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
  /// Nothing typed yet; no score is computed.
  Empty,
  Correct,
  Partial,
  Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
  pub accuracy: f64,
  pub time: f64,
  pub total: f64,
}

/// Similarity in `[0, 1]` between a user translation and the reference.
pub fn check_similarity(user_input: &str, reference: &str) -> f64 {
  let a = normalize_answer(user_input);
  let b = normalize_answer(reference);
  strsim::sorensen_dice(&a, &b).clamp(0.0, 1.0)
}

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize_answer(s: &str) -> String {
  s.to_lowercase()
    .chars()
    .map(|c| if c.is_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn classify(similarity: f64, cfg: &ScoringConfig) -> FeedbackStatus {
  if similarity >= cfg.correct_threshold {
    FeedbackStatus::Correct
  } else if similarity >= cfg.partial_threshold {
    FeedbackStatus::Partial
  } else {
    FeedbackStatus::Incorrect
  }
}

/// Status plus similarity; `None` similarity for empty input.
pub fn feedback_status(user_input: &str, reference: &str, cfg: &ScoringConfig) -> (FeedbackStatus, Option<f64>) {
  if user_input.trim().is_empty() {
    return (FeedbackStatus::Empty, None);
  }
  let s = check_similarity(user_input, reference);
  (classify(s, cfg), Some(s))
}

/// Points for an answer with similarity `similarity` given `elapsed` since the sentence was shown.
/// Accuracy dominates; the time bonus shrinks per bucket but never drops below the floor.
pub fn compute_score(similarity: f64, elapsed: Duration, cfg: &ScoringConfig) -> ScoreBreakdown {
  let accuracy = (similarity * cfg.accuracy_points).round();
  let buckets = (elapsed.as_secs_f64() / cfg.time_bucket_secs).floor();
  let time = (cfg.max_time_points - buckets * (cfg.time_weight / cfg.time_weight_base)).max(cfg.min_time_points);
  ScoreBreakdown { accuracy, time, total: accuracy + time }
}

pub fn is_mastered(similarity: f64, cfg: &ScoringConfig) -> bool {
  similarity > cfg.mastery_threshold
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_sentence_is_correct() {
    let cfg = ScoringConfig::default();
    let s = check_similarity("I am very happy", "I am very happy");
    assert_eq!(s, 1.0);
    assert_eq!(classify(s, &cfg), FeedbackStatus::Correct);
  }

  #[test]
  fn missing_word_is_partial() {
    let cfg = ScoringConfig::default();
    let s = check_similarity("I am happy", "I am very happy");
    assert!((0.4..0.8).contains(&s), "similarity {s}");
    assert_eq!(classify(s, &cfg), FeedbackStatus::Partial);
  }

  #[test]
  fn case_and_punctuation_are_ignored() {
    assert_eq!(check_similarity("i AM very happy!!", "I am very happy."), 1.0);
  }

  #[test]
  fn unrelated_answer_is_incorrect() {
    let cfg = ScoringConfig::default();
    let s = check_similarity("xyz", "The weather is nice today");
    assert!(s < 0.4);
    assert_eq!(classify(s, &cfg), FeedbackStatus::Incorrect);
  }

  #[test]
  fn empty_input_gives_no_feedback_yet() {
    let cfg = ScoringConfig::default();
    assert_eq!(feedback_status("   ", "Hello", &cfg), (FeedbackStatus::Empty, None));
  }

  #[test]
  fn score_formula_matches_reference_values() {
    let cfg = ScoringConfig::default();
    let score = compute_score(0.9, Duration::from_secs(2), &cfg);
    assert_eq!(score.accuracy, 81.0);
    assert_eq!(score.time, 10.0);
    assert_eq!(score.total, 91.0);

    let score = compute_score(1.0, Duration::from_secs(7), &cfg);
    assert_eq!(score.time, 8.0);
    assert_eq!(score.total, 98.0);
  }

  #[test]
  fn slow_answers_keep_the_time_floor() {
    let cfg = ScoringConfig::default();
    let score = compute_score(0.8, Duration::from_secs(600), &cfg);
    assert_eq!(score.time, 1.0);
    assert_eq!(score.total, 73.0);
  }

  #[test]
  fn time_weight_scales_the_penalty() {
    let cfg = ScoringConfig { time_weight: 6.0, ..ScoringConfig::default() };
    let score = compute_score(1.0, Duration::from_secs(3), &cfg);
    assert_eq!(score.time, 8.0);
  }

  #[test]
  fn mastery_requires_strictly_above_threshold() {
    let cfg = ScoringConfig::default();
    assert!(!is_mastered(0.9, &cfg));
    assert!(is_mastered(0.95, &cfg));
  }
}
