//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::state::AppState;
use crate::store::DrillRecord;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "linglab_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "linglab_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target = "linglab_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "linglab_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "linglab_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state, msg))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListExercises => {
      let exercises = list_exercises(state).await;
      tracing::info!(target: "exercise", count = exercises.len(), "WS exercise list served");
      ServerWsMessage::ExerciseList { exercises }
    }

    ClientWsMessage::StartExercise { exercise_id } => match start_exercise(state, &exercise_id).await {
      Ok(attempt) => {
        tracing::info!(target: "exercise", %exercise_id, attempt_id = %attempt.attempt_id, "WS attempt started");
        ServerWsMessage::Exercise { attempt }
      }
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::SubmitAnswer { attempt_id, item_id, answer } => {
      match submit_answer(state, &attempt_id, &item_id, answer.as_deref()).await {
        Ok(result) => ServerWsMessage::AnswerResult { result },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::ShowScore { attempt_id } => match show_score(state, &attempt_id).await {
      Ok(score) => {
        tracing::info!(target: "exercise", %attempt_id, summary = %score.score.summary, "WS score served");
        ServerWsMessage::Score { score }
      }
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::Reset { attempt_id } => match do_reset(state, Some(&attempt_id)).await {
      Ok(n) => ServerWsMessage::ResetDone { attempts_reset: n },
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::ResetAll => match do_reset(state, None).await {
      Ok(n) => ServerWsMessage::ResetDone { attempts_reset: n },
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::BuildParagraph { fields } => {
      let paragraphs = do_build(&fields).await;
      ServerWsMessage::Paragraphs { paragraphs }
    }

    ClientWsMessage::Speak { request } => {
      let speech = do_speak(state, &request).await;
      ServerWsMessage::Speech { speech }
    }

    ClientWsMessage::PauseSpeech => {
      let (active, paused) = do_pause_speech(state).await;
      ServerWsMessage::SpeechState { active, paused }
    }

    ClientWsMessage::ResumeSpeech => {
      let (active, paused) = do_resume_speech(state).await;
      ServerWsMessage::SpeechState { active, paused }
    }

    ClientWsMessage::StopSpeech => {
      let (active, paused) = do_stop_speech(state).await;
      ServerWsMessage::SpeechState { active, paused }
    }

    ClientWsMessage::ListVoices => {
      let voices = do_list_voices(state).await;
      ServerWsMessage::Voices { voices }
    }

    ClientWsMessage::GetPref { key } => {
      let value = state.prefs.get(&key);
      ServerWsMessage::Pref { key, value }
    }

    ClientWsMessage::SetPref { key, value } => {
      state.prefs.set(&key, value.clone());
      ServerWsMessage::Pref { key, value: Some(value) }
    }

    ClientWsMessage::GetDrill { drill_key } => {
      let record = state.prefs.drill_record(&drill_key);
      ServerWsMessage::Drill { drill_key, record }
    }

    ClientWsMessage::RecordDrill { drill_key, complete, pct } => {
      let record = DrillRecord { complete, pct };
      state.prefs.record_drill(&drill_key, record.clone());
      ServerWsMessage::Drill { drill_key, record }
    }

    ClientWsMessage::GetRecommendation => ServerWsMessage::Recommendation {
      recommendation: state.prefs.last_recommendation(),
    },

    ClientWsMessage::SaveRecommendation { recommendation } => {
      state.prefs.save_recommendation(&recommendation);
      ServerWsMessage::Recommendation { recommendation: Some(recommendation) }
    }
  }
}
