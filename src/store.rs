//! Vocabulary storage behind a small trait so the backend can be swapped:
//!   - `InMemoryVocabulary`: dev mode / tests, nothing touches disk
//!   - `FileVocabulary`: JSON file, rewritten atomically after every change

use std::{
  io::Write,
  path::{Path, PathBuf},
  sync::RwLock,
};

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{NewWord, VocabularyWord};
use crate::error::StoreError;
use crate::pinyin::{convert_numeric_pinyin_to_tonal, pinyin_matches, to_pinyin_diacritics};

pub trait VocabularyStore: Send + Sync {
  fn list(&self) -> Result<Vec<VocabularyWord>, StoreError>;
  fn add(&self, word: NewWord) -> Result<VocabularyWord, StoreError>;
  fn set_active(&self, id: &str, active: bool) -> Result<VocabularyWord, StoreError>;
  fn remove(&self, id: &str) -> Result<(), StoreError>;
  /// Bump the mastery counter of every listed entry; unknown ids are ignored.
  fn record_mastery(&self, ids: &[String]) -> Result<(), StoreError>;

  /// Entries eligible for sentence generation.
  fn active(&self) -> Result<Vec<VocabularyWord>, StoreError> {
    Ok(self.list()?.into_iter().filter(|w| w.active).collect())
  }
}

/// Validate a new entry and bring its pinyin into tone-mark form.
fn build_word(word: NewWord) -> Result<VocabularyWord, StoreError> {
  let chinese = word.chinese.trim().to_string();
  let english = word.english.trim().to_string();
  if chinese.is_empty() {
    return Err(StoreError::Invalid("chinese must not be empty".into()));
  }
  if english.is_empty() {
    return Err(StoreError::Invalid("english must not be empty".into()));
  }
  let pinyin = match word.pinyin.trim() {
    "" => to_pinyin_diacritics(&chinese),
    py => convert_numeric_pinyin_to_tonal(py),
  };
  Ok(VocabularyWord {
    id: Uuid::new_v4().to_string(),
    chinese,
    pinyin,
    english,
    active: word.active,
    mastery: 0,
  })
}

#[derive(Default)]
pub struct InMemoryVocabulary {
  words: RwLock<Vec<VocabularyWord>>,
}

impl InMemoryVocabulary {
  pub fn with_words(words: Vec<NewWord>) -> Result<Self, StoreError> {
    let words = words.into_iter().map(build_word).collect::<Result<Vec<_>, _>>()?;
    Ok(Self { words: RwLock::new(words) })
  }

  fn from_existing(words: Vec<VocabularyWord>) -> Self {
    Self { words: RwLock::new(words) }
  }

  /// Apply `f` to a copy of the list and `commit` it, both under the write lock.
  /// The copy replaces the live list only once `commit` succeeds, so a failed
  /// write leaves memory untouched and concurrent changes commit in lock order.
  fn mutate<T>(
    &self,
    f: impl FnOnce(&mut Vec<VocabularyWord>) -> Result<T, StoreError>,
    commit: impl FnOnce(&[VocabularyWord]) -> Result<(), StoreError>,
  ) -> Result<T, StoreError> {
    let mut words = self.words.write().map_err(|_| StoreError::Poisoned)?;
    let mut next = words.clone();
    let out = f(&mut next)?;
    commit(&next)?;
    *words = next;
    Ok(out)
  }
}

/// In-memory changes have nothing to commit.
fn no_commit(_: &[VocabularyWord]) -> Result<(), StoreError> {
  Ok(())
}

fn find_mut<'a>(words: &'a mut [VocabularyWord], id: &str) -> Result<&'a mut VocabularyWord, StoreError> {
  words
    .iter_mut()
    .find(|w| w.id == id)
    .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

fn add_word(words: &mut Vec<VocabularyWord>, word: NewWord) -> Result<VocabularyWord, StoreError> {
  let word = build_word(word)?;
  if words.iter().any(|w| w.chinese == word.chinese && pinyin_matches(&w.pinyin, &word.pinyin)) {
    return Err(StoreError::Invalid(format!("{} is already in the word list", word.chinese)));
  }
  words.push(word.clone());
  Ok(word)
}

fn set_word_active(words: &mut [VocabularyWord], id: &str, active: bool) -> Result<VocabularyWord, StoreError> {
  let w = find_mut(words, id)?;
  w.active = active;
  Ok(w.clone())
}

fn remove_word(words: &mut Vec<VocabularyWord>, id: &str) -> Result<(), StoreError> {
  let before = words.len();
  words.retain(|w| w.id != id);
  if words.len() == before {
    return Err(StoreError::NotFound(id.to_string()));
  }
  Ok(())
}

fn bump_mastery(words: &mut [VocabularyWord], ids: &[String]) -> Result<(), StoreError> {
  for w in words.iter_mut().filter(|w| ids.contains(&w.id)) {
    w.mastery = w.mastery.saturating_add(1);
  }
  Ok(())
}

impl VocabularyStore for InMemoryVocabulary {
  fn list(&self) -> Result<Vec<VocabularyWord>, StoreError> {
    Ok(self.words.read().map_err(|_| StoreError::Poisoned)?.clone())
  }

  fn add(&self, word: NewWord) -> Result<VocabularyWord, StoreError> {
    self.mutate(|words| add_word(words, word), no_commit)
  }

  fn set_active(&self, id: &str, active: bool) -> Result<VocabularyWord, StoreError> {
    self.mutate(|words| set_word_active(words, id, active), no_commit)
  }

  fn remove(&self, id: &str) -> Result<(), StoreError> {
    self.mutate(|words| remove_word(words, id), no_commit)
  }

  fn record_mastery(&self, ids: &[String]) -> Result<(), StoreError> {
    self.mutate(|words| bump_mastery(words, ids), no_commit)
  }
}

/// JSON-file backed vocabulary. The file is read once on open and rewritten after each change.
pub struct FileVocabulary {
  path: PathBuf,
  inner: InMemoryVocabulary,
}

impl FileVocabulary {
  /// Open (or create) the vocabulary file at `path`.
  #[instrument(level = "info", skip_all)]
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref().to_path_buf();
    let words = match std::fs::read_to_string(&path) {
      Ok(s) if s.trim().is_empty() => Vec::new(),
      Ok(s) => serde_json::from_str::<Vec<VocabularyWord>>(&s)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
      Err(e) => return Err(e.into()),
    };
    info!(target: "tingli_backend", path = %path.display(), words = words.len(), "Vocabulary file opened");
    Ok(Self { path, inner: InMemoryVocabulary::from_existing(words) })
  }

  fn persist(&self, words: &[VocabularyWord]) -> Result<(), StoreError> {
    let dir = match self.path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
      _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut tmp, words)?;
    tmp.flush()?;
    tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
    debug!(target: "tingli_backend", words = words.len(), "Vocabulary persisted");
    Ok(())
  }
}

impl VocabularyStore for FileVocabulary {
  fn list(&self) -> Result<Vec<VocabularyWord>, StoreError> {
    self.inner.list()
  }

  fn add(&self, word: NewWord) -> Result<VocabularyWord, StoreError> {
    self.inner.mutate(|words| add_word(words, word), |words| self.persist(words))
  }

  fn set_active(&self, id: &str, active: bool) -> Result<VocabularyWord, StoreError> {
    self.inner.mutate(|words| set_word_active(words, id, active), |words| self.persist(words))
  }

  fn remove(&self, id: &str) -> Result<(), StoreError> {
    self.inner.mutate(|words| remove_word(words, id), |words| self.persist(words))
  }

  fn record_mastery(&self, ids: &[String]) -> Result<(), StoreError> {
    self.inner.mutate(|words| bump_mastery(words, ids), |words| self.persist(words))
  }
}
