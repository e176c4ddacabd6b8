//! WebSocket practice loop. Each connection owns one `PracticeSession`.
//!
//! Sentence generation runs in spawned tasks whose results come back over a
//! channel tagged with the request ticket; the session drops results for
//! outdated tickets, so rapid "next sentence" requests can't race.

use std::{sync::Arc, time::Instant};
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::domain::{Difficulty, Sentence};
use crate::practice::{PracticeSession, Ticket};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

type Delivery = (Ticket, Sentence);

/// What the loop should do after one select round.
enum Outgoing {
  Reply(ServerWsMessage),
  Pong(Vec<u8>),
  Nothing,
  Close,
}

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "tingli_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "tingli_backend", "WebSocket connected");
  let mut session = PracticeSession::new(state.config.scoring.clone());
  let mut difficulty = Difficulty::default();
  let (tx, mut rx) = mpsc::channel::<Delivery>(8);

  loop {
    let outgoing = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "tingli_backend", "WS received: {:?}", &msg);
            handle_client_ws(msg, &state, &mut session, &mut difficulty, &tx)
          }
          Err(e) => Outgoing::Reply(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
        },
        Some(Ok(Message::Ping(payload))) => Outgoing::Pong(payload),
        Some(Ok(Message::Close(_))) | None => Outgoing::Close,
        Some(Ok(_)) => Outgoing::Nothing,
        Some(Err(e)) => {
          error!(target: "tingli_backend", error = %e, "WS receive error");
          Outgoing::Close
        }
      },
      Some((ticket, sentence)) = rx.recv() => {
        if session.offer_sentence(ticket, sentence.clone(), Instant::now()) {
          info!(target: "practice", id = %sentence.id, from_fallback = sentence.from_fallback, "WS sentence served");
          Outgoing::Reply(ServerWsMessage::Sentence { sentence })
        } else {
          Outgoing::Nothing
        }
      }
    };

    let frame = match outgoing {
      Outgoing::Reply(reply) => {
        let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });
        Message::Text(out)
      }
      Outgoing::Pong(payload) => Message::Pong(payload),
      Outgoing::Nothing => continue,
      Outgoing::Close => break,
    };

    if let Err(e) = socket.send(frame).await {
      error!(target: "tingli_backend", error = %e, "WS send error");
      break;
    }
  }
  info!(target: "tingli_backend", completed = session.stats().completed, points = session.stats().total_points, "WebSocket disconnected");
}

fn handle_client_ws(
  msg: ClientWsMessage,
  state: &Arc<AppState>,
  session: &mut PracticeSession,
  difficulty: &mut Difficulty,
  tx: &mpsc::Sender<Delivery>,
) -> Outgoing {
  let reply = match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewSentence { difficulty: requested } => {
      *difficulty = requested;
      spawn_generation(state, session.request_sentence(), requested, tx);
      return Outgoing::Nothing;
    }

    ClientWsMessage::InputChanged { sentence_id, text } => {
      match session.input_changed(&sentence_id, &text, Instant::now()) {
        Ok(feedback) => {
          debug!(target: "practice", phase = ?session.phase(), similarity = ?feedback.similarity, "Input scored");
          state.record_mastery(feedback.mastered.clone());
          if let Some(points) = &feedback.points {
            info!(target: "practice", id = %sentence_id, total = points.total, "Points awarded");
          }
          ServerWsMessage::Feedback { feedback }
        }
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::Advance => match session.advance() {
      Ok(sentence_id) => {
        spawn_generation(state, session.request_sentence(), *difficulty, tx);
        ServerWsMessage::Completed { sentence_id, stats: session.stats().clone() }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::Stats => ServerWsMessage::Stats {
      stats: session.stats().clone(),
      sentence_id: session.current_sentence().map(|s| s.id.clone()),
    },
  };
  Outgoing::Reply(reply)
}

fn spawn_generation(state: &Arc<AppState>, ticket: Ticket, difficulty: Difficulty, tx: &mpsc::Sender<Delivery>) {
  let state = Arc::clone(state);
  let tx = tx.clone();
  tokio::spawn(async move {
    let sentence = state.next_sentence(difficulty).await;
    if tx.send((ticket, sentence)).await.is_err() {
      debug!(target: "practice", "Connection closed before sentence arrived");
    }
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{AppConfig, ScoringConfig};
  use crate::store::InMemoryVocabulary;

  struct Harness {
    state: Arc<AppState>,
    session: PracticeSession,
    difficulty: Difficulty,
    tx: mpsc::Sender<Delivery>,
    rx: mpsc::Receiver<Delivery>,
  }

  impl Harness {
    fn new() -> Self {
      let state = AppState::with_parts(AppConfig::default(), Arc::new(InMemoryVocabulary::default()), None);
      let (tx, rx) = mpsc::channel(8);
      Self {
        state: Arc::new(state),
        session: PracticeSession::new(ScoringConfig::default()),
        difficulty: Difficulty::default(),
        tx,
        rx,
      }
    }

    fn send(&mut self, msg: ClientWsMessage) -> Outgoing {
      handle_client_ws(msg, &self.state, &mut self.session, &mut self.difficulty, &self.tx)
    }

    /// Wait for the spawned generation and hand it to the session.
    async fn deliver(&mut self) -> Sentence {
      let (ticket, sentence) = self.rx.recv().await.expect("sentence");
      assert!(self.session.offer_sentence(ticket, sentence.clone(), Instant::now()));
      sentence
    }
  }

  #[tokio::test]
  async fn advance_requests_next_sentence_at_last_difficulty() {
    let mut h = Harness::new();
    let out = h.send(ClientWsMessage::NewSentence { difficulty: Difficulty::Advanced });
    assert!(matches!(out, Outgoing::Nothing));
    let first = h.deliver().await;
    assert_eq!(first.difficulty, Difficulty::Advanced);

    match h.send(ClientWsMessage::Advance) {
      Outgoing::Reply(ServerWsMessage::Completed { sentence_id, stats }) => {
        assert_eq!(sentence_id, first.id);
        assert_eq!(stats.completed, 1);
      }
      _ => panic!("expected a completed reply"),
    }
    let next = h.deliver().await;
    assert_eq!(next.difficulty, Difficulty::Advanced);
    assert_ne!(next.id, first.id);
  }

  #[tokio::test]
  async fn outdated_sentence_id_gets_error_reply() {
    let mut h = Harness::new();
    h.send(ClientWsMessage::NewSentence { difficulty: Difficulty::Beginner });
    let current = h.deliver().await;

    let out = h.send(ClientWsMessage::InputChanged { sentence_id: "old".into(), text: "hello".into() });
    assert!(matches!(out, Outgoing::Reply(ServerWsMessage::Error { .. })));

    match h.send(ClientWsMessage::InputChanged { sentence_id: current.id.clone(), text: current.english.clone() }) {
      Outgoing::Reply(ServerWsMessage::Feedback { feedback }) => {
        assert_eq!(feedback.sentence_id, current.id);
        assert!(feedback.points.is_some());
      }
      _ => panic!("expected feedback after an error reply"),
    }
  }

  #[tokio::test]
  async fn input_before_any_sentence_is_an_error_not_a_close() {
    let mut h = Harness::new();
    let out = h.send(ClientWsMessage::InputChanged { sentence_id: "x".into(), text: "hi".into() });
    assert!(matches!(out, Outgoing::Reply(ServerWsMessage::Error { .. })));
    match h.send(ClientWsMessage::Stats) {
      Outgoing::Reply(ServerWsMessage::Stats { sentence_id, stats }) => {
        assert_eq!(sentence_id, None);
        assert_eq!(stats.completed, 0);
      }
      _ => panic!("expected stats"),
    }
    assert!(matches!(h.send(ClientWsMessage::Ping), Outgoing::Reply(ServerWsMessage::Pong)));
  }
}
