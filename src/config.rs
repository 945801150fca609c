//! Loading the exercise bank (exercises + optional band overrides) from TOML.
//!
//! See `BankConfig` for the expected schema.

use serde::Deserialize;
use tracing::{info, error};

use crate::domain::{ExerciseKind, ScoreBands};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BankConfig {
  #[serde(default)]
  pub exercises: Vec<ExerciseCfg>,
  /// Overrides the built-in 90/75/55 band cutoffs for exercises that don't
  /// carry their own.
  #[serde(default)]
  pub default_bands: Option<ScoreBands>,
}

/// Exercise entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ExerciseCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub kind: Option<ExerciseKind>,
  #[serde(default)] pub intro: Option<String>,
  #[serde(default)] pub bands: Option<ScoreBands>,
  #[serde(default)] pub time_limit_secs: Option<u64>,
  #[serde(default)] pub items: Vec<ItemCfg>,
}

/// Item entry accepted in TOML configuration.
/// Option-based items fill `options` + `expected`; free-text items fill
/// `accept`. Exactly one of the branches should be used.
#[derive(Clone, Debug, Deserialize)]
pub struct ItemCfg {
  #[serde(default)] pub id: Option<String>,
  pub prompt: String,
  #[serde(default)] pub options: Vec<OptionCfg>,
  #[serde(default)] pub expected: Option<String>,
  #[serde(default)] pub accept: Vec<String>,
  #[serde(default)] pub hint: Option<String>,
  #[serde(default)] pub explanation: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OptionCfg {
  pub key: String,
  pub label: String,
}

/// Attempt to load `BankConfig` from EXERCISE_CONFIG_PATH. On any parsing/IO
/// error, returns None and the built-in seeds carry the service.
pub fn load_bank_config_from_env() -> Option<BankConfig> {
  let path = std::env::var("EXERCISE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<BankConfig>(&s) {
      Ok(cfg) => {
        info!(target: "linglab_backend", %path, "Loaded exercise bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "linglab_backend", %path, error = %e, "Failed to parse TOML exercise bank");
        None
      }
    },
    Err(e) => {
      error!(target: "linglab_backend", %path, error = %e, "Failed to read TOML exercise bank file");
      None
    }
  }
}
