//! Scored-exercise engine: one `ExerciseSession` per learner attempt.
//!
//! Flow:
//! 1) An attempt is created from an `ExerciseDef` (item states all Unanswered).
//! 2) Each submission is evaluated at most once per item; the first answer
//!    locks the item until reset.
//! 3) The running `correct_count` moves only in lockstep with item
//!    transitions, so `0 <= correct_count <= total` always holds.
//! 4) Reset returns the whole attempt to its initial state (idempotent).

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::domain::{ExerciseDef, ExerciseItem, ExerciseKind, ItemState, OptionDef, ScoreBands, ScoreTier};
use crate::timer::Countdown;
use crate::util::normalize_answer;

const FEEDBACK_CORRECT: &str = "✅ Correct!";
const FEEDBACK_NO_SELECTION: &str = "Choose an option first.";

/// Outcome of one submission against one item.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
  /// First evaluation of this item; state transitioned.
  Evaluated { state: ItemState, feedback: String },
  /// Item was already locked; nothing changed.
  AlreadyLocked { state: ItemState },
  /// Nothing was selected/typed; not an answer, not an error.
  NoSelection { feedback: String },
  UnknownItem,
}

/// Banded score summary produced on demand.
#[derive(Clone, Debug, Serialize)]
pub struct ScoreSummary {
  pub correct: u32,
  pub total: u32,
  pub pct: u32,
  pub summary: String,
  pub tier: ScoreTier,
  pub message: String,
}

/// Live state of one attempt at one exercise.
#[derive(Clone)]
pub struct ExerciseSession {
  def: ExerciseDef,
  states: Vec<ItemState>,
  feedback: Vec<String>,
  correct_count: u32,
  pub countdown: Option<Countdown>,
}

impl ExerciseSession {
  pub fn new(def: ExerciseDef) -> Self {
    let n = def.items.len();
    let mut countdown = def.time_limit_secs.map(Countdown::new);
    if let Some(c) = countdown.as_mut() {
      c.start();
    }
    Self {
      def,
      states: vec![ItemState::Unanswered; n],
      feedback: vec![String::new(); n],
      correct_count: 0,
      countdown,
    }
  }

  pub fn def(&self) -> &ExerciseDef {
    &self.def
  }

  pub fn total_count(&self) -> u32 {
    self.def.items.len() as u32
  }

  pub fn correct_count(&self) -> u32 {
    self.correct_count
  }

  pub fn item_state(&self, idx: usize) -> Option<(ItemState, &str)> {
    Some((*self.states.get(idx)?, self.feedback[idx].as_str()))
  }

  /// Evaluate a submission for one item, at most once.
  ///
  /// `answer` is an option key for option-based items, free text otherwise.
  /// An empty/absent answer is "not yet answered" and leaves the item open.
  pub fn submit(&mut self, item_id: &str, answer: Option<&str>) -> SubmitOutcome {
    let idx = match self.def.items.iter().position(|i| i.id == item_id) {
      Some(i) => i,
      None => return SubmitOutcome::UnknownItem,
    };

    if self.states[idx].is_locked() {
      return SubmitOutcome::AlreadyLocked { state: self.states[idx] };
    }

    let answer = answer.map(str::trim).unwrap_or("");
    if answer.is_empty() {
      return SubmitOutcome::NoSelection { feedback: FEEDBACK_NO_SELECTION.into() };
    }

    let item = &self.def.items[idx];
    let correct = if item.is_option_based() {
      answer == item.expected
    } else {
      let got = normalize_answer(answer);
      item.accept.iter().any(|a| normalize_answer(a) == got)
    };

    let (state, feedback) = if correct {
      (ItemState::Correct, FEEDBACK_CORRECT.to_string())
    } else {
      (ItemState::Incorrect, incorrect_feedback(item))
    };

    self.states[idx] = state;
    self.feedback[idx] = feedback.clone();
    if state == ItemState::Correct {
      self.correct_count += 1;
    }
    debug_assert!(self.correct_count <= self.total_count());

    SubmitOutcome::Evaluated { state, feedback }
  }

  /// Banded summary, e.g. `"3/5 (60%)"` in the good-base tier.
  /// `fallback_bands` applies when the exercise carries no bands of its own.
  pub fn score_summary(&self, fallback_bands: ScoreBands) -> ScoreSummary {
    let correct = self.correct_count;
    let total = self.total_count();
    let pct = if total == 0 {
      0
    } else {
      ((correct as f64 / total as f64) * 100.0).round() as u32
    };
    let bands = self.def.bands.unwrap_or(fallback_bands);
    let tier = bands.tier(pct);
    ScoreSummary {
      correct,
      total,
      pct,
      summary: format!("{}/{} ({}%)", correct, total, pct),
      tier,
      message: tier.message().to_string(),
    }
  }

  /// Return the attempt to its initial state: every item Unanswered and
  /// answerable, feedback cleared, count zeroed, countdown cancelled.
  /// Safe to call on an already-reset attempt.
  pub fn reset(&mut self) {
    for s in &mut self.states {
      *s = ItemState::Unanswered;
    }
    for f in &mut self.feedback {
      f.clear();
    }
    self.correct_count = 0;
    if let Some(c) = self.countdown.as_mut() {
      c.cancel();
    }
  }
}

fn incorrect_feedback(item: &ExerciseItem) -> String {
  let mut out = String::from("❌ Not quite.");
  if !item.hint.is_empty() {
    out.push(' ');
    out.push_str(&item.hint);
  }
  if !item.explanation.is_empty() {
    out.push(' ');
    out.push_str(&item.explanation);
  }
  out
}

/// Options in presentation order. Matching sets are shuffled so the pairing
/// isn't given away by position; quiz options keep their authored order.
pub fn presented_options(item: &ExerciseItem, kind: &ExerciseKind) -> Vec<OptionDef> {
  let mut opts = item.options.clone();
  if *kind == ExerciseKind::Matching {
    opts.shuffle(&mut rand::thread_rng());
  }
  opts
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ExerciseSource, OptionDef};

  fn mcq(n: usize) -> ExerciseDef {
    let items = (0..n)
      .map(|i| ExerciseItem {
        id: format!("q{i}"),
        prompt: format!("question {i}"),
        options: vec![
          OptionDef { key: "a".into(), label: "right".into() },
          OptionDef { key: "b".into(), label: "wrong".into() },
        ],
        expected: "a".into(),
        accept: vec![],
        hint: "think again".into(),
        explanation: String::new(),
      })
      .collect();
    ExerciseDef {
      id: "t".into(),
      title: "test".into(),
      kind: ExerciseKind::MultipleChoice,
      source: ExerciseSource::Seed,
      intro: String::new(),
      items,
      bands: None,
      time_limit_secs: None,
    }
  }

  fn free_text() -> ExerciseDef {
    ExerciseDef {
      id: "ft".into(),
      title: "blanks".into(),
      kind: ExerciseKind::FillInBlank,
      source: ExerciseSource::Seed,
      intro: String::new(),
      items: vec![ExerciseItem {
        id: "b0".into(),
        prompt: "interested ___".into(),
        options: vec![],
        expected: String::new(),
        accept: vec!["in".into()],
        hint: String::new(),
        explanation: String::new(),
      }],
      bands: None,
      time_limit_secs: None,
    }
  }

  #[test]
  fn at_most_one_scoring_event_per_item() {
    let mut s = ExerciseSession::new(mcq(1));
    let first = s.submit("q0", Some("a"));
    assert!(matches!(first, SubmitOutcome::Evaluated { state: ItemState::Correct, .. }));
    assert_eq!(s.correct_count(), 1);

    // Four more clicks on the same option: no further scoring events.
    for _ in 0..4 {
      let again = s.submit("q0", Some("a"));
      assert_eq!(again, SubmitOutcome::AlreadyLocked { state: ItemState::Correct });
    }
    assert_eq!(s.correct_count(), 1);

    // Even a different option cannot flip a locked item.
    let flip = s.submit("q0", Some("b"));
    assert_eq!(flip, SubmitOutcome::AlreadyLocked { state: ItemState::Correct });
    assert_eq!(s.correct_count(), 1);
  }

  #[test]
  fn incorrect_does_not_move_the_counter() {
    let mut s = ExerciseSession::new(mcq(2));
    s.submit("q0", Some("b"));
    assert_eq!(s.correct_count(), 0);
    let (state, feedback) = s.item_state(0).expect("item");
    assert_eq!(state, ItemState::Incorrect);
    assert!(feedback.starts_with("❌"));
    assert!(feedback.contains("think again"));
  }

  #[test]
  fn no_selection_leaves_item_open() {
    let mut s = ExerciseSession::new(mcq(1));
    assert!(matches!(s.submit("q0", None), SubmitOutcome::NoSelection { .. }));
    assert!(matches!(s.submit("q0", Some("   ")), SubmitOutcome::NoSelection { .. }));
    let (state, _) = s.item_state(0).expect("item");
    assert_eq!(state, ItemState::Unanswered);
    // Still answerable afterwards.
    assert!(matches!(s.submit("q0", Some("a")), SubmitOutcome::Evaluated { .. }));
  }

  #[test]
  fn free_text_matching_trims_and_folds_case() {
    let mut s = ExerciseSession::new(free_text());
    let out = s.submit("b0", Some("  IN "));
    assert!(matches!(out, SubmitOutcome::Evaluated { state: ItemState::Correct, .. }));
  }

  #[test]
  fn unknown_item_is_reported() {
    let mut s = ExerciseSession::new(mcq(1));
    assert_eq!(s.submit("nope", Some("a")), SubmitOutcome::UnknownItem);
  }

  #[test]
  fn worked_example_three_of_five_lands_in_good_tier() {
    let mut s = ExerciseSession::new(mcq(5));
    // Arbitrary order: 3 correct, 2 incorrect.
    s.submit("q3", Some("a"));
    s.submit("q1", Some("b"));
    s.submit("q0", Some("a"));
    s.submit("q4", Some("b"));
    s.submit("q2", Some("a"));

    let score = s.score_summary(ScoreBands::default());
    assert_eq!(score.summary, "3/5 (60%)");
    assert_eq!(score.tier, ScoreTier::Good);
    assert!(score.correct <= score.total);
  }

  #[test]
  fn reset_is_complete_and_idempotent() {
    let mut s = ExerciseSession::new(mcq(3));
    s.submit("q0", Some("a"));
    s.submit("q1", Some("b"));

    for _ in 0..2 {
      s.reset();
      assert_eq!(s.correct_count(), 0);
      for i in 0..3 {
        let (state, feedback) = s.item_state(i).expect("item");
        assert_eq!(state, ItemState::Unanswered);
        assert!(feedback.is_empty());
      }
    }
    // Items are answerable again after reset.
    assert!(matches!(s.submit("q1", Some("a")), SubmitOutcome::Evaluated { .. }));
    assert_eq!(s.correct_count(), 1);
  }

  #[test]
  fn reset_cancels_a_running_countdown() {
    let mut def = mcq(1);
    def.time_limit_secs = Some(120);
    let mut s = ExerciseSession::new(def);
    assert!(s.countdown.as_ref().map(|c| c.is_running()).unwrap_or(false));
    s.reset();
    assert!(!s.countdown.as_ref().map(|c| c.is_running()).unwrap_or(false));
  }

  #[test]
  fn matching_options_are_shuffled_but_complete() {
    let def = mcq(1);
    let mut item = def.items[0].clone();
    item.options = (0..8)
      .map(|i| OptionDef { key: format!("k{i}"), label: format!("l{i}") })
      .collect();
    let shown = presented_options(&item, &ExerciseKind::Matching);
    assert_eq!(shown.len(), 8);
    let mut keys: Vec<_> = shown.iter().map(|o| o.key.clone()).collect();
    keys.sort();
    assert_eq!(keys, (0..8).map(|i| format!("k{i}")).collect::<Vec<_>>());
  }
}
