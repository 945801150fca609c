//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, http::StatusCode, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;
use crate::store::Recommendation;

fn not_found(message: String) -> impl IntoResponse {
  (StatusCode::NOT_FOUND, Json(serde_json::json!({ "message": message })))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_exercises(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let exercises = list_exercises(&state).await;
  info!(target: "exercise", count = exercises.len(), "HTTP exercise list served");
  Json(exercises)
}

#[instrument(level = "info", skip(state, body), fields(%body.exercise_id))]
pub async fn http_start_attempt(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartIn>,
) -> impl IntoResponse {
  match start_exercise(&state, &body.exercise_id).await {
    Ok(attempt) => {
      info!(target: "exercise", exercise_id = %body.exercise_id, attempt_id = %attempt.attempt_id, "HTTP attempt started");
      Json(attempt).into_response()
    }
    Err(e) => not_found(e).into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.attempt_id, %body.item_id))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> impl IntoResponse {
  match submit_answer(&state, &body.attempt_id, &body.item_id, body.answer.as_deref()).await {
    Ok(out) => Json(out).into_response(),
    Err(e) => not_found(e).into_response(),
  }
}

#[instrument(level = "info", skip(state), fields(%q.attempt_id))]
pub async fn http_get_score(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ScoreQuery>,
) -> impl IntoResponse {
  match show_score(&state, &q.attempt_id).await {
    Ok(out) => {
      info!(target: "exercise", attempt_id = %q.attempt_id, summary = %out.score.summary, "HTTP score served");
      Json(out).into_response()
    }
    Err(e) => not_found(e).into_response(),
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_reset(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ResetIn>,
) -> impl IntoResponse {
  match do_reset(&state, body.attempt_id.as_deref()).await {
    Ok(n) => Json(ResetOut { attempts_reset: n }).into_response(),
    Err(e) => not_found(e).into_response(),
  }
}

#[instrument(level = "info", skip(body), fields(field_count = body.fields.len()))]
pub async fn http_post_build(Json(body): Json<BuildIn>) -> impl IntoResponse {
  Json(do_build(&body.fields).await)
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_post_speak(
  State(state): State<Arc<AppState>>,
  Json(body): Json<crate::speech::SpeechRequest>,
) -> impl IntoResponse {
  Json(do_speak(&state, &body).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_pause(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (active, paused) = do_pause_speech(&state).await;
  Json(serde_json::json!({ "active": active, "paused": paused }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_resume(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (active, paused) = do_resume_speech(&state).await;
  Json(serde_json::json!({ "active": active, "paused": paused }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_stop(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (active, paused) = do_stop_speech(&state).await;
  Json(serde_json::json!({ "active": active, "paused": paused }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_voices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(do_list_voices(&state).await)
}

#[instrument(level = "info", skip(state), fields(%q.key))]
pub async fn http_get_pref(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PrefQuery>,
) -> impl IntoResponse {
  let value = state.prefs.get(&q.key);
  Json(PrefOut { key: q.key, value })
}

#[instrument(level = "info", skip(state, body), fields(%body.key))]
pub async fn http_set_pref(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PrefIn>,
) -> impl IntoResponse {
  state.prefs.set(&body.key, body.value.clone());
  Json(PrefOut { key: body.key, value: Some(body.value) })
}

#[instrument(level = "info", skip(state), fields(%q.drill_key))]
pub async fn http_get_drill(
  State(state): State<Arc<AppState>>,
  Query(q): Query<DrillQuery>,
) -> impl IntoResponse {
  let record = state.prefs.drill_record(&q.drill_key);
  Json(DrillOut { drill_key: q.drill_key, record })
}

#[instrument(level = "info", skip(state, body), fields(%body.drill_key, pct = body.pct))]
pub async fn http_record_drill(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DrillIn>,
) -> impl IntoResponse {
  let record = crate::store::DrillRecord { complete: body.complete, pct: body.pct };
  state.prefs.record_drill(&body.drill_key, record.clone());
  Json(DrillOut { drill_key: body.drill_key, record })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_recommendation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(RecommendationOut { recommendation: state.prefs.last_recommendation() })
}

#[instrument(level = "info", skip(state, body), fields(scenario = %body.scenario))]
pub async fn http_save_recommendation(
  State(state): State<Arc<AppState>>,
  Json(body): Json<Recommendation>,
) -> impl IntoResponse {
  state.prefs.save_recommendation(&body);
  Json(RecommendationOut { recommendation: Some(body) })
}
