//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, Sentence};
use crate::practice::{Feedback, PracticeStats};
use crate::similarity::{FeedbackStatus, ScoreBreakdown};
use crate::speech::{Voice, VoiceChoice};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewSentence {
        #[serde(default)]
        difficulty: Difficulty,
    },
    /// Sent on every keystroke with the full current input.
    InputChanged {
        #[serde(rename = "sentenceId")]
        sentence_id: String,
        text: String,
    },
    /// Finish the current sentence and move on to the next one.
    Advance,
    Stats,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Sentence {
        sentence: Sentence,
    },
    Feedback {
        #[serde(flatten)]
        feedback: Feedback,
    },
    Completed {
        #[serde(rename = "sentenceId")]
        sentence_id: String,
        stats: PracticeStats,
    },
    Stats {
        stats: PracticeStats,
        /// Sentence currently being practiced, if any.
        #[serde(rename = "sentenceId")]
        sentence_id: Option<String>,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SentenceQuery {
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub user_input: String,
    pub reference: String,
    /// Time since the sentence was shown; points are only computed when present.
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOut {
    pub status: FeedbackStatus,
    pub similarity: Option<f64>,
    pub points: Option<ScoreBreakdown>,
    pub mastered: bool,
}

#[derive(Deserialize)]
pub struct TextIn {
    pub text: String,
}

#[derive(Serialize)]
pub struct PinyinOut {
    pub pinyin: String,
}

#[derive(Serialize)]
pub struct NormalizedOut {
    pub normalized: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveIn {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct VoiceIn {
    #[serde(default)]
    pub voices: Vec<Voice>,
}

pub type VoiceOut = VoiceChoice;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SpeechOut {
    Audio {
        ok: bool,
        #[serde(rename = "audioBase64")]
        audio_base64: String,
        mime: &'static str,
    },
    Failed {
        ok: bool,
        message: String,
    },
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
