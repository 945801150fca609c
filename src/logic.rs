//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting attempts and evaluating answers (at-most-once per item)
//!   - Producing banded score summaries
//!   - Resetting one attempt or all of them
//!   - Building paragraphs from form fields
//!   - Speech playback through the optional synthesizer

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{error, info, instrument, warn};

use crate::builder::{build_paragraphs, BuilderOutput};
use crate::domain::ItemState;
use crate::engine::SubmitOutcome;
use crate::protocol::{to_out, AnswerOut, AttemptOut, ExerciseSummary, ScoreOut, SpeechOut};
use crate::speech::SpeechRequest;
use crate::state::AppState;

#[instrument(level = "debug", skip(state))]
pub async fn list_exercises(state: &AppState) -> Vec<ExerciseSummary> {
  state
    .list_exercises()
    .await
    .into_iter()
    .map(|def| ExerciseSummary {
      id: def.id.clone(),
      title: def.title.clone(),
      kind: def.kind.clone(),
      source: def.source.clone(),
      intro: def.intro.clone(),
      total_count: def.items.len() as u32,
      time_limit_secs: def.time_limit_secs,
    })
    .collect()
}

#[instrument(level = "info", skip(state), fields(%exercise_id))]
pub async fn start_exercise(state: &AppState, exercise_id: &str) -> Result<AttemptOut, String> {
  let attempt_id = state
    .start_attempt(exercise_id)
    .await
    .ok_or_else(|| format!("Unknown exerciseId: {}", exercise_id))?;
  let session = state
    .get_attempt(&attempt_id)
    .await
    .ok_or_else(|| format!("Attempt vanished: {}", attempt_id))?;
  Ok(to_out(&attempt_id, &session))
}

#[instrument(level = "info", skip(state, answer), fields(%attempt_id, %item_id))]
pub async fn submit_answer(
  state: &AppState,
  attempt_id: &str,
  item_id: &str,
  answer: Option<&str>,
) -> Result<AnswerOut, String> {
  let (outcome, correct_count) = state
    .submit_answer(attempt_id, item_id, answer)
    .await
    .ok_or_else(|| format!("Unknown attemptId: {}", attempt_id))?;

  let out = match outcome {
    SubmitOutcome::Evaluated { state: item_state, feedback } => AnswerOut {
      attempt_id: attempt_id.to_string(),
      item_id: item_id.to_string(),
      state: item_state,
      locked: true,
      feedback,
      correct_count,
    },
    SubmitOutcome::AlreadyLocked { state: item_state } => AnswerOut {
      attempt_id: attempt_id.to_string(),
      item_id: item_id.to_string(),
      state: item_state,
      locked: true,
      feedback: String::new(),
      correct_count,
    },
    SubmitOutcome::NoSelection { feedback } => AnswerOut {
      attempt_id: attempt_id.to_string(),
      item_id: item_id.to_string(),
      state: ItemState::Unanswered,
      locked: false,
      feedback,
      correct_count,
    },
    SubmitOutcome::UnknownItem => {
      return Err(format!("Unknown itemId: {}", item_id));
    }
  };
  info!(target: "exercise", %attempt_id, %item_id, state = ?out.state, correct = out.correct_count, "Answer evaluated");
  Ok(out)
}

#[instrument(level = "info", skip(state), fields(%attempt_id))]
pub async fn show_score(state: &AppState, attempt_id: &str) -> Result<ScoreOut, String> {
  let score = state
    .score(attempt_id)
    .await
    .ok_or_else(|| format!("Unknown attemptId: {}", attempt_id))?;
  let time_left_secs = state
    .get_attempt(attempt_id)
    .await
    .and_then(|s| s.countdown.as_ref().and_then(|c| c.remaining_secs()));
  Ok(ScoreOut { attempt_id: attempt_id.to_string(), score, time_left_secs })
}

/// Reset one attempt, or every attempt when no id is given.
#[instrument(level = "info", skip(state))]
pub async fn do_reset(state: &AppState, attempt_id: Option<&str>) -> Result<usize, String> {
  match attempt_id {
    Some(id) => {
      if state.reset_attempt(id).await {
        Ok(1)
      } else {
        Err(format!("Unknown attemptId: {}", id))
      }
    }
    None => Ok(state.reset_all_attempts().await),
  }
}

/// Paragraph building is pure; the async signature just matches its siblings.
#[instrument(level = "info", skip(fields), fields(field_count = fields.len()))]
pub async fn do_build(fields: &std::collections::HashMap<String, String>) -> BuilderOutput {
  build_paragraphs(fields)
}

/// Start playback of one utterance. Cancels whatever was playing first; when
/// the synthesizer is missing or failing, degrades to a no-op plus a one-time
/// notice.
#[instrument(level = "info", skip(state, req), fields(text_len = req.text.len(), lang = %req.language_tag))]
pub async fn do_speak(state: &AppState, req: &SpeechRequest) -> SpeechOut {
  if req.text.trim().is_empty() {
    return SpeechOut {
      utterance: None,
      audio_base64: None,
      notice: Some("Nothing to read aloud yet.".into()),
    };
  }

  let synth = match &state.speech {
    Some(s) => s.clone(),
    None => {
      let notice = state.channel.write().await.unavailable_notice();
      return SpeechOut { utterance: None, audio_base64: None, notice: notice.map(Into::into) };
    }
  };

  // Cancel-before-speak under the lock, then synthesize without holding it.
  let utterance = state.channel.write().await.begin(req);
  let voice_id = utterance.voice.as_ref().map(|v| v.id.clone()).unwrap_or_else(|| "alloy".into());

  match synth.synthesize(&req.text, &voice_id, req.rate).await {
    Ok(bytes) => {
      let mut channel = state.channel.write().await;
      // A newer speak may have superseded this one while synthesizing.
      if channel.current().map(|u| u.id.as_str()) != Some(utterance.id.as_str()) {
        info!(target: "linglab_backend", utterance_id = %utterance.id, "Utterance superseded before playback");
        return SpeechOut { utterance: None, audio_base64: None, notice: None };
      }
      SpeechOut {
        utterance: Some(utterance),
        audio_base64: Some(BASE64.encode(&bytes)),
        notice: None,
      }
    }
    Err(e) => {
      error!(target: "linglab_backend", error = %e, "Speech synthesis failed; degrading to no-op");
      let mut channel = state.channel.write().await;
      channel.cancel();
      let notice = channel.unavailable_notice();
      SpeechOut { utterance: None, audio_base64: None, notice: notice.map(Into::into) }
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn do_pause_speech(state: &AppState) -> (bool, bool) {
  let mut channel = state.channel.write().await;
  channel.pause();
  (channel.current().is_some(), channel.current().map(|u| u.paused).unwrap_or(false))
}

#[instrument(level = "info", skip(state))]
pub async fn do_resume_speech(state: &AppState) -> (bool, bool) {
  let mut channel = state.channel.write().await;
  channel.resume();
  (channel.current().is_some(), channel.current().map(|u| u.paused).unwrap_or(false))
}

#[instrument(level = "info", skip(state))]
pub async fn do_stop_speech(state: &AppState) -> (bool, bool) {
  let mut channel = state.channel.write().await;
  channel.cancel();
  (false, false)
}

/// Current voice inventory, refreshed from the synthesizer when possible.
/// The list is best-effort and may change between calls; failures keep
/// whatever we had (seed voices at minimum).
#[instrument(level = "info", skip(state))]
pub async fn do_list_voices(state: &AppState) -> Vec<crate::speech::Voice> {
  if let Some(synth) = &state.speech {
    match synth.list_voices().await {
      Ok(voices) if !voices.is_empty() => {
        state.channel.write().await.set_voices(voices);
      }
      Ok(_) => {
        warn!(target: "linglab_backend", "Synthesizer returned an empty voice list; keeping current voices");
      }
      Err(e) => {
        warn!(target: "linglab_backend", error = %e, "Voice refresh failed; keeping current voices");
      }
    }
  }
  state.channel.read().await.voices().to_vec()
}
