//! Application state: exercise registry, live attempts, speech channel, and
//! the preference store.
//!
//! This module owns:
//!   - the exercise definition store (by id, plus listing order)
//!   - per-learner attempt sessions (by attempt id)
//!   - the single speech playback channel and the optional synthesizer client
//!   - the preference store
//!
//! Definitions come from the TOML bank when provided and from built-in seeds
//! otherwise; seeds never overwrite bank entries with the same id.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::{load_bank_config_from_env, ExerciseCfg, ItemCfg};
use crate::domain::{ExerciseDef, ExerciseItem, ExerciseSource, OptionDef, ScoreBands};
use crate::engine::{ExerciseSession, ScoreSummary, SubmitOutcome};
use crate::seeds::{seed_exercises, seed_voices};
use crate::speech::{SpeechChannel, SpeechSynth};
use crate::store::PrefStore;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub by_id: Arc<RwLock<HashMap<String, ExerciseDef>>>,
    pub listing: Arc<RwLock<Vec<String>>>,
    pub attempts: Arc<RwLock<HashMap<String, ExerciseSession>>>,
    pub default_bands: ScoreBands,
    pub speech: Option<SpeechSynth>,
    pub channel: Arc<RwLock<SpeechChannel>>,
    pub prefs: Arc<PrefStore>,
}

impl AppState {
    /// Build state from env: load the bank, seed exercises, init speech and
    /// the preference store.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg_opt = load_bank_config_from_env();
        let default_bands = cfg_opt
            .as_ref()
            .and_then(|c| c.default_bands)
            .unwrap_or_default();

        let mut id_map = HashMap::<String, ExerciseDef>::new();
        let mut listing = Vec::<String>::new();

        // Insert bank exercises (if any) first.
        if let Some(cfg) = &cfg_opt {
            for ec in &cfg.exercises {
                match exercise_from_cfg(ec) {
                    Some(def) => {
                        listing.push(def.id.clone());
                        id_map.insert(def.id.clone(), def);
                    }
                    None => {
                        error!(target: "exercise", title = %ec.title, "Skipping bank exercise: no gradable items.");
                    }
                }
            }
        }

        // Always insert built-in seeds, but don't overwrite existing ids.
        for def in seed_exercises() {
            if !id_map.contains_key(&def.id) {
                listing.push(def.id.clone());
                id_map.insert(def.id.clone(), def);
            }
        }

        // Inventory summary by source.
        let (bank, seed) = id_map.values().fold((0usize, 0usize), |(b, s), d| match d.source {
            ExerciseSource::LocalBank => (b + 1, s),
            ExerciseSource::Seed => (b, s + 1),
        });
        info!(target: "exercise", local_bank = bank, seed = seed, "Startup exercise inventory");

        // Build optional speech synthesizer client (if API key present).
        let speech = SpeechSynth::from_env();
        if let Some(s) = &speech {
            info!(target: "linglab_backend", base_url = %s.base_url, model = %s.model, "Speech synthesis enabled.");
        } else {
            info!(target: "linglab_backend", "Speech synthesis disabled (no TTS_API_KEY). Playback requests will no-op with a notice.");
        }

        let prefs = Arc::new(PrefStore::open_from_env());

        Self {
            by_id: Arc::new(RwLock::new(id_map)),
            listing: Arc::new(RwLock::new(listing)),
            attempts: Arc::new(RwLock::new(HashMap::new())),
            default_bands,
            speech,
            channel: Arc::new(RwLock::new(SpeechChannel::new(seed_voices()))),
            prefs,
        }
    }

    /// Exercise definitions in listing order.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_exercises(&self) -> Vec<ExerciseDef> {
        let by_id = self.by_id.read().await;
        let listing = self.listing.read().await;
        listing.iter().filter_map(|id| by_id.get(id).cloned()).collect()
    }

    /// Read-only access to a definition by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_exercise(&self, id: &str) -> Option<ExerciseDef> {
        let by_id = self.by_id.read().await;
        by_id.get(id).cloned()
    }

    /// Create a fresh attempt for an exercise; returns its attempt id.
    #[instrument(level = "info", skip(self), fields(%exercise_id))]
    pub async fn start_attempt(&self, exercise_id: &str) -> Option<String> {
        let def = self.get_exercise(exercise_id).await?;
        let attempt_id = Uuid::new_v4().to_string();
        let session = ExerciseSession::new(def);
        self.attempts.write().await.insert(attempt_id.clone(), session);
        info!(target: "exercise", %exercise_id, %attempt_id, "Attempt started");
        Some(attempt_id)
    }

    /// Snapshot of one live attempt.
    #[instrument(level = "debug", skip(self), fields(%attempt_id))]
    pub async fn get_attempt(&self, attempt_id: &str) -> Option<ExerciseSession> {
        let attempts = self.attempts.read().await;
        attempts.get(attempt_id).cloned()
    }

    /// Evaluate one submission. Returns the outcome plus the running count.
    #[instrument(level = "info", skip(self, answer), fields(%attempt_id, %item_id))]
    pub async fn submit_answer(
        &self,
        attempt_id: &str,
        item_id: &str,
        answer: Option<&str>,
    ) -> Option<(SubmitOutcome, u32)> {
        let mut attempts = self.attempts.write().await;
        let session = attempts.get_mut(attempt_id)?;
        let outcome = session.submit(item_id, answer);
        Some((outcome, session.correct_count()))
    }

    /// Banded score summary for one attempt.
    #[instrument(level = "info", skip(self), fields(%attempt_id))]
    pub async fn score(&self, attempt_id: &str) -> Option<ScoreSummary> {
        let attempts = self.attempts.read().await;
        Some(attempts.get(attempt_id)?.score_summary(self.default_bands))
    }

    /// Reset one attempt back to its initial state. False if unknown.
    #[instrument(level = "info", skip(self), fields(%attempt_id))]
    pub async fn reset_attempt(&self, attempt_id: &str) -> bool {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(attempt_id) {
            Some(session) => {
                session.reset();
                true
            }
            None => {
                warn!(target: "exercise", %attempt_id, "Reset requested for unknown attempt");
                false
            }
        }
    }

    /// Page-level "reset all": explicitly iterates every live attempt.
    #[instrument(level = "info", skip(self))]
    pub async fn reset_all_attempts(&self) -> usize {
        let mut attempts = self.attempts.write().await;
        let n = attempts.len();
        for session in attempts.values_mut() {
            session.reset();
        }
        n
    }
}

/// Build an `ExerciseDef` from one bank entry. Items missing both an option
/// key and acceptable answers are skipped; an exercise with no gradable items
/// is rejected entirely.
fn exercise_from_cfg(ec: &ExerciseCfg) -> Option<ExerciseDef> {
    let id = ec.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let kind = ec.kind.clone().unwrap_or_default();

    let mut items = Vec::new();
    for (idx, ic) in ec.items.iter().enumerate() {
        match item_from_cfg(ic, idx) {
            Some(item) => items.push(item),
            None => {
                error!(target: "exercise", exercise = %id, item = idx, "Skipping bank item: no expected answer.");
            }
        }
    }
    if items.is_empty() {
        return None;
    }

    Some(ExerciseDef {
        id,
        title: ec.title.clone(),
        kind,
        source: ExerciseSource::LocalBank,
        intro: ec.intro.clone().unwrap_or_default(),
        items,
        bands: ec.bands,
        time_limit_secs: ec.time_limit_secs,
    })
}

fn item_from_cfg(ic: &ItemCfg, idx: usize) -> Option<ExerciseItem> {
    let options: Vec<OptionDef> = ic
        .options
        .iter()
        .map(|o| OptionDef { key: o.key.clone(), label: o.label.clone() })
        .collect();
    let expected = ic.expected.clone().unwrap_or_default();

    let option_based = !options.is_empty() && !expected.is_empty();
    let free_text = options.is_empty() && !ic.accept.is_empty();
    if !option_based && !free_text {
        return None;
    }

    Some(ExerciseItem {
        id: ic.id.clone().unwrap_or_else(|| format!("item{idx}")),
        prompt: ic.prompt.clone(),
        options,
        expected: if option_based { expected } else { String::new() },
        accept: ic.accept.clone(),
        hint: ic.hint.clone().unwrap_or_default(),
        explanation: ic.explanation.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionCfg;
    use crate::domain::ExerciseKind;

    #[test]
    fn bank_items_need_a_gradable_answer() {
        let bad = ItemCfg {
            id: None,
            prompt: "no answer".into(),
            options: vec![],
            expected: None,
            accept: vec![],
            hint: None,
            explanation: None,
        };
        assert!(item_from_cfg(&bad, 0).is_none());

        let good = ItemCfg {
            id: None,
            prompt: "pick".into(),
            options: vec![OptionCfg { key: "a".into(), label: "A".into() }],
            expected: Some("a".into()),
            accept: vec![],
            hint: None,
            explanation: None,
        };
        let item = item_from_cfg(&good, 3).expect("gradable");
        assert_eq!(item.id, "item3");
        assert!(item.is_option_based());
    }

    #[test]
    fn exercise_with_only_bad_items_is_rejected() {
        let ec = ExerciseCfg {
            id: Some("x".into()),
            title: "broken".into(),
            kind: None,
            intro: None,
            bands: None,
            time_limit_secs: None,
            items: vec![ItemCfg {
                id: None,
                prompt: "no answer".into(),
                options: vec![],
                expected: None,
                accept: vec![],
                hint: None,
                explanation: None,
            }],
        };
        assert!(exercise_from_cfg(&ec).is_none());
    }

    #[test]
    fn default_kind_is_multiple_choice() {
        let ec = ExerciseCfg {
            id: None,
            title: "quiz".into(),
            kind: None,
            intro: None,
            bands: None,
            time_limit_secs: None,
            items: vec![ItemCfg {
                id: Some("q1".into()),
                prompt: "pick".into(),
                options: vec![OptionCfg { key: "a".into(), label: "A".into() }],
                expected: Some("a".into()),
                accept: vec![],
                hint: None,
                explanation: None,
            }],
        };
        let def = exercise_from_cfg(&ec).expect("built");
        assert_eq!(def.kind, ExerciseKind::MultipleChoice);
        assert_eq!(def.source, ExerciseSource::LocalBank);
    }
}
