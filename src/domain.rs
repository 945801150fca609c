//! Domain models used by the backend: exercise kinds/sources, items, score bands.

use serde::{Deserialize, Serialize};

/// What kind of exercise is presented to the learner?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
  /// Pick one option per item (quiz with radio/button choices).
  MultipleChoice,
  /// Drag a candidate onto a target; grades as option-key selection.
  Matching,
  /// Type or select the missing word; grades as free text.
  FillInBlank,
  /// Arrange shuffled segments; the chosen order is submitted as text.
  SentenceOrder,
}
impl Default for ExerciseKind {
  fn default() -> Self { ExerciseKind::MultipleChoice }
}

/// Where did the exercise definition come from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseSource {
  LocalBank, // from user-provided TOML bank
  Seed,      // built-in seeds (always present)
}

/// One selectable option. The `key` is the stable grading identity; the
/// `label` is display copy and never participates in matching.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptionDef {
  pub key: String,
  pub label: String,
}

/// One gradable unit within an exercise.
///
/// Option-based items (`options` non-empty) grade the submitted option key
/// against `expected`. Free-text items grade the submitted text against any
/// entry in `accept`, trimmed and case-folded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseItem {
  pub id: String,
  pub prompt: String,
  #[serde(default)] pub options: Vec<OptionDef>,
  #[serde(default)] pub expected: String,
  #[serde(default)] pub accept: Vec<String>,
  #[serde(default)] pub hint: String,
  #[serde(default)] pub explanation: String,
}

impl ExerciseItem {
  pub fn is_option_based(&self) -> bool {
    !self.options.is_empty()
  }
}

/// Answered-state machine for one item. The only transitions are
/// Unanswered -> Correct | Incorrect (first evaluation) and the reset edge
/// back to Unanswered. A locked item ignores further submissions.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
  Unanswered,
  Correct,
  Incorrect,
}

impl ItemState {
  pub fn is_locked(self) -> bool {
    !matches!(self, ItemState::Unanswered)
  }
}

impl Default for ItemState {
  fn default() -> Self { ItemState::Unanswered }
}

/// Percentage cutoffs for the qualitative feedback tiers. Source pages tuned
/// these slightly differently, so they stay per-exercise configuration with
/// one global default.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScoreBands {
  pub excellent: u32,
  pub strong: u32,
  pub good: u32,
}

impl Default for ScoreBands {
  fn default() -> Self {
    Self { excellent: 90, strong: 75, good: 55 }
  }
}

impl ScoreBands {
  pub fn tier(&self, pct: u32) -> ScoreTier {
    if pct >= self.excellent {
      ScoreTier::Excellent
    } else if pct >= self.strong {
      ScoreTier::Strong
    } else if pct >= self.good {
      ScoreTier::Good
    } else {
      ScoreTier::KeepPracticing
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
  Excellent,
  Strong,
  Good,
  KeepPracticing,
}

impl ScoreTier {
  pub fn message(self) -> &'static str {
    match self {
      ScoreTier::Excellent => "Excellent! You have mastered this one.",
      ScoreTier::Strong => "Strong work. Nearly perfect.",
      ScoreTier::Good => "Good base. Review the misses and try again.",
      ScoreTier::KeepPracticing => "Keep practicing. Run it once more.",
    }
  }
}

/// Full exercise definition kept in the registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseDef {
  pub id: String,
  pub title: String,
  pub kind: ExerciseKind,
  pub source: ExerciseSource,
  #[serde(default)] pub intro: String,
  pub items: Vec<ExerciseItem>,
  #[serde(default)] pub bands: Option<ScoreBands>,
  /// Optional countdown for timed drills, in whole seconds.
  #[serde(default)] pub time_limit_secs: Option<u64>,
}
