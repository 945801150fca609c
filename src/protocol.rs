//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::BuilderOutput;
use crate::domain::{ExerciseKind, ExerciseSource, ItemState, OptionDef};
use crate::engine::{presented_options, ExerciseSession, ScoreSummary};
use crate::speech::{SpeechRequest, Utterance, Voice};
use crate::store::{DrillRecord, Recommendation};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListExercises,
    StartExercise {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
    },
    SubmitAnswer {
        #[serde(rename = "attemptId")]
        attempt_id: String,
        #[serde(rename = "itemId")]
        item_id: String,
        #[serde(default)]
        answer: Option<String>,
    },
    ShowScore {
        #[serde(rename = "attemptId")]
        attempt_id: String,
    },
    Reset {
        #[serde(rename = "attemptId")]
        attempt_id: String,
    },
    ResetAll,
    BuildParagraph {
        #[serde(default)]
        fields: HashMap<String, String>,
    },
    Speak {
        #[serde(flatten)]
        request: SpeechRequest,
    },
    PauseSpeech,
    ResumeSpeech,
    StopSpeech,
    ListVoices,
    GetPref {
        key: String,
    },
    SetPref {
        key: String,
        value: Value,
    },
    GetDrill {
        #[serde(rename = "drillKey")]
        drill_key: String,
    },
    RecordDrill {
        #[serde(rename = "drillKey")]
        drill_key: String,
        complete: bool,
        pct: u32,
    },
    GetRecommendation,
    SaveRecommendation {
        #[serde(flatten)]
        recommendation: Recommendation,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    ExerciseList {
        exercises: Vec<ExerciseSummary>,
    },
    Exercise {
        attempt: AttemptOut,
    },
    AnswerResult {
        #[serde(flatten)]
        result: AnswerOut,
    },
    Score {
        #[serde(flatten)]
        score: ScoreOut,
    },
    ResetDone {
        #[serde(rename = "attemptsReset")]
        attempts_reset: usize,
    },
    Paragraphs {
        #[serde(flatten)]
        paragraphs: BuilderOutput,
    },
    Speech {
        #[serde(flatten)]
        speech: SpeechOut,
    },
    SpeechState {
        active: bool,
        paused: bool,
    },
    Voices {
        voices: Vec<Voice>,
    },
    Pref {
        key: String,
        value: Option<Value>,
    },
    Drill {
        #[serde(rename = "drillKey")]
        drill_key: String,
        record: DrillRecord,
    },
    Recommendation {
        recommendation: Option<Recommendation>,
    },
    Error {
        message: String,
    },
}

/// One row in the exercise listing.
#[derive(Debug, Serialize)]
pub struct ExerciseSummary {
    pub id: String,
    pub title: String,
    pub kind: ExerciseKind,
    pub source: ExerciseSource,
    pub intro: String,
    #[serde(rename = "totalCount")]
    pub total_count: u32,
    #[serde(rename = "timeLimitSecs")]
    pub time_limit_secs: Option<u64>,
}

/// One item as presented to the learner. Expected answers stay server-side;
/// only prompt, options, hint, and live state go out.
#[derive(Debug, Serialize)]
pub struct ItemOut {
    pub id: String,
    pub prompt: String,
    pub options: Vec<OptionDef>,
    pub state: ItemState,
    pub locked: bool,
    pub feedback: String,
    pub hint: String,
}

/// DTO used by both WS and HTTP for attempt delivery.
#[derive(Debug, Serialize)]
pub struct AttemptOut {
    #[serde(rename = "attemptId")]
    pub attempt_id: String,
    #[serde(rename = "exerciseId")]
    pub exercise_id: String,
    pub title: String,
    pub kind: ExerciseKind,
    pub intro: String,
    pub items: Vec<ItemOut>,
    #[serde(rename = "correctCount")]
    pub correct_count: u32,
    #[serde(rename = "totalCount")]
    pub total_count: u32,
    #[serde(rename = "timeLeftSecs")]
    pub time_left_secs: Option<u64>,
}

/// Convert a live attempt to the public DTO, shuffling presentation where the
/// exercise kind calls for it.
pub fn to_out(attempt_id: &str, session: &ExerciseSession) -> AttemptOut {
    let def = session.def();
    let items = def
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let (state, feedback) = session.item_state(idx).unwrap_or((ItemState::Unanswered, ""));
            ItemOut {
                id: item.id.clone(),
                prompt: item.prompt.clone(),
                options: presented_options(item, &def.kind),
                state,
                locked: state.is_locked(),
                feedback: feedback.to_string(),
                hint: item.hint.clone(),
            }
        })
        .collect();

    AttemptOut {
        attempt_id: attempt_id.to_string(),
        exercise_id: def.id.clone(),
        title: def.title.clone(),
        kind: def.kind.clone(),
        intro: def.intro.clone(),
        items,
        correct_count: session.correct_count(),
        total_count: session.total_count(),
        time_left_secs: session.countdown.as_ref().and_then(|c| c.remaining_secs()),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartIn {
    #[serde(rename = "exerciseId")]
    pub exercise_id: String,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "attemptId")]
    pub attempt_id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerOut {
    #[serde(rename = "attemptId")]
    pub attempt_id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    pub state: ItemState,
    pub locked: bool,
    pub feedback: String,
    #[serde(rename = "correctCount")]
    pub correct_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    #[serde(rename = "attemptId")]
    pub attempt_id: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreOut {
    #[serde(rename = "attemptId")]
    pub attempt_id: String,
    #[serde(flatten)]
    pub score: ScoreSummary,
    #[serde(rename = "timeLeftSecs")]
    pub time_left_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ResetIn {
    /// Absent means page-level reset-all.
    #[serde(rename = "attemptId", default)]
    pub attempt_id: Option<String>,
}

#[derive(Serialize)]
pub struct ResetOut {
    #[serde(rename = "attemptsReset")]
    pub attempts_reset: usize,
}

#[derive(Debug, Deserialize)]
pub struct BuildIn {
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// Speech reply: absent audio with a notice means the capability is missing;
/// absent audio without a notice means it already told you once.
#[derive(Debug, Serialize)]
pub struct SpeechOut {
    pub utterance: Option<Utterance>,
    #[serde(rename = "audioBase64")]
    pub audio_base64: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrefIn {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct PrefQuery {
    pub key: String,
}

#[derive(Serialize)]
pub struct PrefOut {
    pub key: String,
    pub value: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DrillIn {
    #[serde(rename = "drillKey")]
    pub drill_key: String,
    pub complete: bool,
    pub pct: u32,
}

#[derive(Debug, Deserialize)]
pub struct DrillQuery {
    #[serde(rename = "drillKey")]
    pub drill_key: String,
}

#[derive(Serialize)]
pub struct DrillOut {
    #[serde(rename = "drillKey")]
    pub drill_key: String,
    pub record: DrillRecord,
}

#[derive(Serialize)]
pub struct RecommendationOut {
    pub recommendation: Option<Recommendation>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
