//! Application state: configuration, vocabulary backend and optional OpenAI client.
//!
//! The vocabulary backend is chosen once at startup:
//!   - `dev_mode = true`  → in-memory store seeded with a starter word list
//!   - `dev_mode = false` → JSON file at `settings.vocabulary_path`

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::config::{load_app_config_from_env, AppConfig};
use crate::domain::{Difficulty, Sentence};
use crate::error::StoreError;
use crate::openai::OpenAI;
use crate::seeds::seed_vocabulary;
use crate::sentences::generate_or_fallback;
use crate::store::{FileVocabulary, InMemoryVocabulary, VocabularyStore};

pub struct AppState {
    pub config: AppConfig,
    pub vocabulary: Arc<dyn VocabularyStore>,
    pub openai: Option<OpenAI>,
}

impl AppState {
    /// Build state from env: load config, open the vocabulary backend, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, StoreError> {
        let config = load_app_config_from_env().unwrap_or_default();

        let vocabulary: Arc<dyn VocabularyStore> = if config.settings.dev_mode {
            info!(target: "tingli_backend", "Dev mode: in-memory vocabulary with starter words");
            Arc::new(InMemoryVocabulary::with_words(seed_vocabulary())?)
        } else {
            Arc::new(FileVocabulary::open(&config.settings.vocabulary_path)?)
        };

        let openai = OpenAI::from_env(config.prompts.clone());
        if let Some(oa) = &openai {
            info!(target: "tingli_backend", base_url = %oa.base_url, model = %oa.model, tts_model = %oa.tts_model, "OpenAI enabled.");
        } else {
            info!(target: "tingli_backend", "OpenAI disabled (no OPENAI_API_KEY). Serving fallback sentences only.");
        }

        Ok(Self::with_parts(config, vocabulary, openai))
    }

    pub fn with_parts(config: AppConfig, vocabulary: Arc<dyn VocabularyStore>, openai: Option<OpenAI>) -> Self {
        Self { config, vocabulary, openai }
    }

    /// Run a vocabulary operation on the blocking pool.
    /// The file backend writes to disk under its lock, so store calls stay off the async workers.
    pub async fn vocabulary_call<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn VocabularyStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.vocabulary);
        tokio::task::spawn_blocking(move || f(store.as_ref())).await?
    }

    /// Next practice sentence from the active vocabulary; never fails.
    #[instrument(level = "info", skip(self), fields(%difficulty))]
    pub async fn next_sentence(&self, difficulty: Difficulty) -> Sentence {
        let words = self.vocabulary_call(|store| store.active()).await.unwrap_or_else(|e| {
            error!(target: "tingli_backend", error = %e, "Could not read vocabulary; generating without it");
            Vec::new()
        });
        generate_or_fallback(self.openai.as_ref(), &words, difficulty).await
    }

    /// Persist mastery for the given vocabulary ids in the background. Failures are logged, not surfaced.
    pub fn record_mastery(&self, ids: Vec<String>) {
        if ids.is_empty() {
            return;
        }
        let store = Arc::clone(&self.vocabulary);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = store.record_mastery(&ids) {
                error!(target: "tingli_backend", error = %e, words = ids.len(), "Failed to record mastery");
            }
        });
    }
}
