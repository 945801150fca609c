//! Preference store: small scalar preferences and completion flags under
//! page-specific keys (accent choice, saved name, demo link, drill records,
//! last recommendation).
//!
//! Persistence is a single JSON object in one file. Every read is defensive:
//! a missing file, malformed JSON, or a malformed value under a key all fall
//! back to defaults. A failed write degrades to "don't persist" and the
//! in-memory value still serves the session. There is no schema versioning.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

const DRILL_PREFIX: &str = "drill:";
const RECO_KEY: &str = "last_reco";

/// Per-drill completion record, shape `{complete: bool, pct: number}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DrillRecord {
  #[serde(default)] pub complete: bool,
  #[serde(default)] pub pct: u32,
}

/// Last-recommendation record shown on the landing page.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
  pub reco: String,
  pub name: String,
  pub href: String,
  pub scenario: String,
  pub when: String,
}

pub struct PrefStore {
  path: PathBuf,
  entries: RwLock<HashMap<String, Value>>,
}

impl PrefStore {
  /// Open the store at PREFS_PATH (default `./data/prefs.json`), loading
  /// whatever parses; anything else starts empty.
  pub fn open_from_env() -> Self {
    let path = std::env::var("PREFS_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from("./data/prefs.json"));
    Self::open(path)
  }

  pub fn open(path: PathBuf) -> Self {
    let entries = match std::fs::read_to_string(&path) {
      Ok(s) => match serde_json::from_str::<HashMap<String, Value>>(&s) {
        Ok(map) => {
          info!(target: "linglab_backend", path = %path.display(), keys = map.len(), "Loaded preference store");
          map
        }
        Err(e) => {
          warn!(target: "linglab_backend", path = %path.display(), error = %e, "Malformed preference file; starting empty");
          HashMap::new()
        }
      },
      Err(_) => HashMap::new(), // first run: nothing persisted yet
    };
    Self { path, entries: RwLock::new(entries) }
  }

  /// Raw value under a key, if present and readable.
  pub fn get(&self, key: &str) -> Option<Value> {
    self.entries.read().ok()?.get(key).cloned()
  }

  pub fn get_string(&self, key: &str) -> Option<String> {
    match self.get(key)? {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  /// Store a value and flush. Write failures are logged and otherwise
  /// ignored; the in-memory value still serves this session.
  pub fn set(&self, key: &str, value: Value) {
    if let Ok(mut map) = self.entries.write() {
      map.insert(key.to_string(), value);
      self.flush(&map);
    }
  }

  pub fn record_drill(&self, drill_key: &str, rec: DrillRecord) {
    match serde_json::to_value(&rec) {
      Ok(v) => self.set(&format!("{DRILL_PREFIX}{drill_key}"), v),
      Err(e) => warn!(target: "linglab_backend", error = %e, "Failed to serialize drill record"),
    }
  }

  /// Completion record for one drill; missing or malformed yields defaults.
  pub fn drill_record(&self, drill_key: &str) -> DrillRecord {
    self
      .get(&format!("{DRILL_PREFIX}{drill_key}"))
      .and_then(|v| serde_json::from_value(v).ok())
      .unwrap_or_default()
  }

  pub fn save_recommendation(&self, reco: &Recommendation) {
    match serde_json::to_value(reco) {
      Ok(v) => self.set(RECO_KEY, v),
      Err(e) => warn!(target: "linglab_backend", error = %e, "Failed to serialize recommendation"),
    }
  }

  pub fn last_recommendation(&self) -> Option<Recommendation> {
    self.get(RECO_KEY).and_then(|v| serde_json::from_value(v).ok())
  }

  fn flush(&self, map: &HashMap<String, Value>) {
    if let Some(parent) = self.path.parent() {
      if !parent.as_os_str().is_empty() {
        if let Err(e) = std::fs::create_dir_all(parent) {
          warn!(target: "linglab_backend", path = %self.path.display(), error = %e, "Preference dir unavailable; not persisting");
          return;
        }
      }
    }
    let body = match serde_json::to_string_pretty(map) {
      Ok(b) => b,
      Err(e) => {
        warn!(target: "linglab_backend", error = %e, "Failed to serialize preferences");
        return;
      }
    };
    if let Err(e) = std::fs::write(&self.path, body) {
      warn!(target: "linglab_backend", path = %self.path.display(), error = %e, "Failed to write preferences; not persisting");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn set_then_get_roundtrips_through_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prefs.json");

    let store = PrefStore::open(path.clone());
    store.set("accent", json!("en-GB"));
    store.set("display_name", json!("Mia"));

    // A fresh store instance sees the persisted values.
    let reopened = PrefStore::open(path);
    assert_eq!(reopened.get_string("accent"), Some("en-GB".into()));
    assert_eq!(reopened.get_string("display_name"), Some("Mia".into()));
  }

  #[test]
  fn malformed_file_starts_empty_instead_of_failing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prefs.json");
    std::fs::write(&path, "{not json at all").expect("write");

    let store = PrefStore::open(path);
    assert_eq!(store.get("anything"), None);
    // And it remains usable.
    store.set("k", json!(1));
    assert_eq!(store.get("k"), Some(json!(1)));
  }

  #[test]
  fn missing_and_malformed_records_yield_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = PrefStore::open(dir.path().join("prefs.json"));

    assert_eq!(store.drill_record("past_simple"), DrillRecord::default());

    // A value of the wrong shape under the key also degrades to defaults.
    store.set("drill:past_simple", json!("oops"));
    assert_eq!(store.drill_record("past_simple"), DrillRecord::default());

    store.record_drill("past_simple", DrillRecord { complete: true, pct: 80 });
    assert_eq!(store.drill_record("past_simple"), DrillRecord { complete: true, pct: 80 });
  }

  #[test]
  fn recommendation_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = PrefStore::open(dir.path().join("prefs.json"));
    assert_eq!(store.last_recommendation(), None);

    let reco = Recommendation {
      reco: "Try the preposition drill next.".into(),
      name: "Mia".into(),
      href: "/drills/prepositions".into(),
      scenario: "after_quiz".into(),
      when: "2026-08-06T12:00:00Z".into(),
    };
    store.save_recommendation(&reco);
    assert_eq!(store.last_recommendation(), Some(reco));
  }

  #[test]
  fn unwritable_path_degrades_to_in_memory() {
    // A directory where the file should be makes every flush fail.
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prefs.json");
    std::fs::create_dir_all(&path).expect("dir in the way");

    let store = PrefStore::open(path);
    store.set("accent", json!("en-AU"));
    assert_eq!(store.get_string("accent"), Some("en-AU".into()));
  }
}
