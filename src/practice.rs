//! Per-learner practice session.
//!
//! Phases: `Idle → AwaitingInput → Feedback(status)` (recomputed on every
//! keystroke) `→ Completed` on advance, then `AwaitingInput` again once the
//! next sentence arrives.
//!
//! Sentence requests take a ticket. Only the newest ticket may deliver a
//! sentence, so a slow response to an older request can never replace the
//! sentence currently on screen.

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::domain::Sentence;
use crate::error::PracticeError;
use crate::similarity::{compute_score, feedback_status, is_mastered, FeedbackStatus, ScoreBreakdown};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PracticePhase {
  Idle,
  AwaitingInput,
  Feedback(FeedbackStatus),
  Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PracticeStats {
  pub total_points: f64,
  pub completed: u32,
  pub correct: u32,
  pub mastered_words: u32,
}

/// Result of scoring one keystroke.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
  pub sentence_id: String,
  pub status: FeedbackStatus,
  pub similarity: Option<f64>,
  /// Present only the first time the item reaches `correct`.
  pub points: Option<ScoreBreakdown>,
  /// Vocabulary ids that reached mastery with this keystroke.
  pub mastered: Vec<String>,
}

struct PracticeItem {
  sentence: Sentence,
  shown_at: Instant,
  awarded: bool,
  mastered: bool,
}

pub struct PracticeSession {
  scoring: ScoringConfig,
  phase: PracticePhase,
  current: Option<PracticeItem>,
  latest_ticket: u64,
  fulfilled: bool,
  stats: PracticeStats,
}

impl PracticeSession {
  pub fn new(scoring: ScoringConfig) -> Self {
    Self {
      scoring,
      phase: PracticePhase::Idle,
      current: None,
      latest_ticket: 0,
      fulfilled: true,
      stats: PracticeStats::default(),
    }
  }

  pub fn phase(&self) -> PracticePhase {
    self.phase
  }

  pub fn current_sentence(&self) -> Option<&Sentence> {
    self.current.as_ref().map(|i| &i.sentence)
  }

  pub fn stats(&self) -> &PracticeStats {
    &self.stats
  }

  /// Start a sentence request. Invalidates every earlier ticket.
  pub fn request_sentence(&mut self) -> Ticket {
    self.latest_ticket += 1;
    self.fulfilled = false;
    Ticket(self.latest_ticket)
  }

  /// Deliver the sentence for `ticket`. Returns false (and changes nothing) if the
  /// ticket is outdated or was already fulfilled.
  pub fn offer_sentence(&mut self, ticket: Ticket, sentence: Sentence, now: Instant) -> bool {
    if ticket.0 != self.latest_ticket || self.fulfilled {
      debug!(target: "practice", ticket = ticket.0, latest = self.latest_ticket, sentence_id = %sentence.id, "Dropping stale sentence");
      return false;
    }
    self.fulfilled = true;
    self.current = Some(PracticeItem { sentence, shown_at: now, awarded: false, mastered: false });
    self.phase = PracticePhase::AwaitingInput;
    true
  }

  /// Score the full current input for `sentence_id`.
  pub fn input_changed(&mut self, sentence_id: &str, text: &str, now: Instant) -> Result<Feedback, PracticeError> {
    if self.phase == PracticePhase::Completed {
      return Err(PracticeError::NoActiveItem);
    }
    let item = self.current.as_mut().ok_or(PracticeError::NoActiveItem)?;
    if item.sentence.id != sentence_id {
      return Err(PracticeError::StaleSentence(sentence_id.to_string()));
    }

    let (status, similarity) = feedback_status(text, &item.sentence.english, &self.scoring);

    let mut points = None;
    if let (FeedbackStatus::Correct, Some(s), false) = (status, similarity, item.awarded) {
      let score = compute_score(s, now.saturating_duration_since(item.shown_at), &self.scoring);
      item.awarded = true;
      self.stats.total_points += score.total;
      self.stats.correct += 1;
      points = Some(score);
    }

    let mut mastered = Vec::new();
    if let (Some(s), false) = (similarity, item.mastered) {
      if is_mastered(s, &self.scoring) {
        item.mastered = true;
        mastered = item.sentence.words.clone();
        self.stats.mastered_words += mastered.len() as u32;
      }
    }

    self.phase = PracticePhase::Feedback(status);
    Ok(Feedback { sentence_id: sentence_id.to_string(), status, similarity, points, mastered })
  }

  /// Finish the current item. Returns its sentence id.
  pub fn advance(&mut self) -> Result<String, PracticeError> {
    let item = self.current.take().ok_or(PracticeError::NoActiveItem)?;
    self.phase = PracticePhase::Completed;
    self.stats.completed += 1;
    Ok(item.sentence.id)
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::domain::Difficulty;

  fn sentence(id: &str, english: &str) -> Sentence {
    Sentence {
      id: id.into(),
      difficulty: Difficulty::Beginner,
      chinese: "我很高兴。".into(),
      pinyin: "wǒ hěn gāo xìng".into(),
      english: english.into(),
      from_fallback: false,
      words: vec!["w-happy".into()],
    }
  }

  fn session_with(id: &str, english: &str, now: Instant) -> PracticeSession {
    let mut session = PracticeSession::new(ScoringConfig::default());
    let ticket = session.request_sentence();
    assert!(session.offer_sentence(ticket, sentence(id, english), now));
    session
  }

  #[test]
  fn starts_idle_and_waits_for_input() {
    let mut session = PracticeSession::new(ScoringConfig::default());
    assert_eq!(session.phase(), PracticePhase::Idle);
    let ticket = session.request_sentence();
    session.offer_sentence(ticket, sentence("s1", "I am very happy"), Instant::now());
    assert_eq!(session.phase(), PracticePhase::AwaitingInput);
    assert_eq!(session.current_sentence().map(|s| s.id.as_str()), Some("s1"));
  }

  #[test]
  fn feedback_is_recomputed_on_every_keystroke() {
    let t0 = Instant::now();
    let mut session = session_with("s1", "I am very happy", t0);

    let fb = session.input_changed("s1", "I am happy", t0).expect("feedback");
    assert_eq!(fb.status, FeedbackStatus::Partial);
    assert_eq!(fb.points, None);

    let fb = session.input_changed("s1", "", t0).expect("feedback");
    assert_eq!(fb.status, FeedbackStatus::Empty);
    assert_eq!(fb.similarity, None);
    assert_eq!(session.phase(), PracticePhase::Feedback(FeedbackStatus::Empty));
  }

  #[test]
  fn correct_answer_awards_points_once() {
    let t0 = Instant::now();
    let mut session = session_with("s1", "I am very happy", t0);

    let fb = session
      .input_changed("s1", "I am very happy", t0 + Duration::from_secs(2))
      .expect("feedback");
    assert_eq!(fb.status, FeedbackStatus::Correct);
    assert_eq!(fb.points.map(|p| p.total), Some(100.0));
    assert_eq!(fb.mastered, vec!["w-happy".to_string()]);

    let fb = session.input_changed("s1", "I am very happy!", t0).expect("feedback");
    assert_eq!(fb.status, FeedbackStatus::Correct);
    assert_eq!(fb.points, None);
    assert!(fb.mastered.is_empty());

    assert_eq!(session.stats().total_points, 100.0);
    assert_eq!(session.stats().correct, 1);
    assert_eq!(session.stats().mastered_words, 1);
  }

  #[test]
  fn outdated_ticket_cannot_replace_sentence() {
    let t0 = Instant::now();
    let mut session = PracticeSession::new(ScoringConfig::default());
    let first = session.request_sentence();
    let second = session.request_sentence();

    assert!(session.offer_sentence(second, sentence("new", "Hello"), t0));
    assert!(!session.offer_sentence(first, sentence("old", "Bye"), t0));
    assert!(!session.offer_sentence(second, sentence("dup", "Hi"), t0));
    assert_eq!(session.current_sentence().map(|s| s.id.as_str()), Some("new"));
  }

  #[test]
  fn input_for_other_sentence_is_rejected() {
    let t0 = Instant::now();
    let mut session = session_with("s1", "Hello", t0);
    assert_eq!(
      session.input_changed("s0", "Hello", t0),
      Err(PracticeError::StaleSentence("s0".into()))
    );
  }

  #[test]
  fn advance_completes_then_next_sentence_resets() {
    let t0 = Instant::now();
    let mut session = session_with("s1", "Hello", t0);
    assert_eq!(session.advance().as_deref(), Ok("s1"));
    assert_eq!(session.phase(), PracticePhase::Completed);
    assert_eq!(session.input_changed("s1", "Hello", t0), Err(PracticeError::NoActiveItem));
    assert_eq!(session.advance(), Err(PracticeError::NoActiveItem));

    let ticket = session.request_sentence();
    assert!(session.offer_sentence(ticket, sentence("s2", "Goodbye"), t0));
    assert_eq!(session.phase(), PracticePhase::AwaitingInput);
    assert_eq!(session.stats().completed, 1);
  }
}
