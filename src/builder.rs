//! Paragraph builder: substitutes learner-supplied field values into fixed
//! sentence skeletons at three fluency levels.
//!
//! Flow:
//! 1) Each known field is cleaned per its rule row (trim, trailing
//!    terminator, leading pronoun, goal-intent normalization).
//! 2) Required fields fall back to a default when blank; optional fields are
//!    omitted from the output entirely.
//! 3) Every level renders its own skeleton per present field; the result is a
//!    deterministic pure function of the inputs.

use std::collections::HashMap;

use serde::Serialize;

use crate::util::fill_template;

pub const PLACEHOLDER: &str = "Fill in the information above to build your paragraph.";

const FIELD_NAME: &str = "name";
const FIELD_OCCUPATION: &str = "occupation";
const FIELD_HOMETOWN: &str = "hometown";
const FIELD_HOBBY: &str = "hobby";
const FIELD_GOAL: &str = "goal";

/// Per-field cleaning rule. Each normalization step is independently
/// togglable; the goal-intent step subsumes pronoun handling for that field.
struct FieldRule {
  name: &'static str,
  required: bool,
  default: &'static str,
  strip_terminator: bool,
  strip_pronoun: bool,
  goal_intent: bool,
}

macro_rules! rule {
  ($name:expr, $required:expr, $default:expr, $term:expr, $pronoun:expr, $goal:expr) => {
    FieldRule {
      name: $name,
      required: $required,
      default: $default,
      strip_terminator: $term,
      strip_pronoun: $pronoun,
      goal_intent: $goal,
    }
  };
}

const FIELD_RULES: &[FieldRule] = &[
  rule!(FIELD_NAME, true, "Alex", true, false, false),
  rule!(FIELD_OCCUPATION, false, "", true, true, false),
  rule!(FIELD_HOMETOWN, false, "", true, false, false),
  rule!(FIELD_HOBBY, false, "", true, false, false),
  rule!(FIELD_GOAL, false, "", true, false, true),
];

/// Sentence skeletons per level, in output order. A row renders only when its
/// field survived cleaning; `{value}` is the cleaned field value.
const BASIC_SENTENCES: &[(&str, &str)] = &[
  (FIELD_NAME, "My name is {value}."),
  (FIELD_OCCUPATION, "I am {value}."),
  (FIELD_HOMETOWN, "I live in {value}."),
  (FIELD_HOBBY, "I like {value}."),
  (FIELD_GOAL, "I want {value}."),
];

const INTERMEDIATE_SENTENCES: &[(&str, &str)] = &[
  (FIELD_NAME, "Hi, I'm {value}."),
  (FIELD_OCCUPATION, "These days I work as {value}."),
  (FIELD_HOMETOWN, "Home for me is {value}."),
  (FIELD_HOBBY, "In my free time I really enjoy {value}."),
  (FIELD_GOAL, "This year I plan {value}."),
];

const ADVANCED_SENTENCES: &[(&str, &str)] = &[
  (FIELD_NAME, "Allow me to introduce myself: my name is {value}."),
  (FIELD_OCCUPATION, "I earn my living as {value}."),
  (FIELD_HOMETOWN, "I call {value} home."),
  (FIELD_HOBBY, "Whenever I find a spare hour, it goes to {value}."),
  (FIELD_GOAL, "My current ambition is {value}."),
];

/// One cleaned input field, kept alongside its raw value for display.
#[derive(Clone, Debug, Serialize)]
pub struct CleanedField {
  pub name: String,
  pub raw: String,
  pub cleaned: String,
}

/// One paragraph per fluency level.
#[derive(Clone, Debug, Serialize)]
pub struct BuilderOutput {
  pub basic: String,
  pub intermediate: String,
  pub advanced: String,
}

/// Build all three paragraphs from raw form fields. Unknown field names are
/// ignored; the inputs are never mutated.
pub fn build_paragraphs(raw_fields: &HashMap<String, String>) -> BuilderOutput {
  let cleaned = clean_fields(raw_fields);

  let any_optional_present = FIELD_RULES
    .iter()
    .filter(|r| !r.required)
    .any(|r| cleaned.get(r.name).map(|v| !v.is_empty()).unwrap_or(false));
  if !any_optional_present {
    return BuilderOutput {
      basic: PLACEHOLDER.into(),
      intermediate: PLACEHOLDER.into(),
      advanced: PLACEHOLDER.into(),
    };
  }

  BuilderOutput {
    basic: render_level(BASIC_SENTENCES, &cleaned),
    intermediate: render_level(INTERMEDIATE_SENTENCES, &cleaned),
    advanced: render_level(ADVANCED_SENTENCES, &cleaned),
  }
}

/// Clean every known field per its rule row; apply required-field defaults.
pub fn clean_fields(raw_fields: &HashMap<String, String>) -> HashMap<&'static str, String> {
  let mut out = HashMap::new();
  for rule in FIELD_RULES {
    let raw = raw_fields.get(rule.name).map(String::as_str).unwrap_or("");
    let mut v = raw.trim().to_string();
    if rule.strip_terminator {
      v = strip_trailing_terminator(&v);
    }
    if rule.strip_pronoun {
      v = strip_leading_pronoun(&v);
    }
    if rule.goal_intent {
      v = normalize_goal_intent(&v);
    }
    if v.is_empty() && rule.required {
      v = rule.default.to_string();
    }
    out.insert(rule.name, v);
  }
  out
}

fn render_level(sentences: &[(&str, &str)], cleaned: &HashMap<&'static str, String>) -> String {
  let parts: Vec<String> = sentences
    .iter()
    .filter_map(|&(field, tpl)| {
      let value = cleaned.get(field)?;
      if value.is_empty() {
        return None;
      }
      Some(fill_template(tpl, &[("value", value)]))
    })
    .collect();
  parts.join(" ")
}

/// Drop trailing sentence terminators so the value can sit mid-sentence.
fn strip_trailing_terminator(s: &str) -> String {
  s.trim_end_matches(['.', '!', '?']).trim_end().to_string()
}

/// Drop a leading first-person pronoun phrase so the value continues a
/// different carrier sentence ("I'm a nurse" -> "a nurse").
fn strip_leading_pronoun(s: &str) -> String {
  let lower = s.to_lowercase();
  for prefix in ["i am ", "i'm ", "i "] {
    if lower.starts_with(prefix) {
      return s[prefix.len()..].trim_start().to_string();
    }
  }
  s.to_string()
}

/// Normalize goal phrasing to a bare "to + verb" fragment:
/// "I want to learn English" / "My goal is to learn English" -> "to learn English".
fn normalize_goal_intent(s: &str) -> String {
  let lower = s.to_lowercase();
  let stripped = [
    "i want to ",
    "i would like to ",
    "i'd like to ",
    "my goal is to ",
    "i want ",
    "my goal is ",
  ]
  .iter()
  .find_map(|prefix| lower.starts_with(prefix).then(|| s[prefix.len()..].trim_start().to_string()))
  .unwrap_or_else(|| s.to_string());

  if stripped.is_empty() {
    return stripped;
  }
  let lower = stripped.to_lowercase();
  if lower == "to" || lower.starts_with("to ") {
    stripped
  } else {
    format!("to {}", stripped)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn identical_inputs_yield_byte_identical_output() {
    let input = fields(&[("name", "Mia"), ("hobby", "chess."), ("goal", "I want to travel")]);
    let a = build_paragraphs(&input);
    let b = build_paragraphs(&input);
    assert_eq!(a.basic, b.basic);
    assert_eq!(a.intermediate, b.intermediate);
    assert_eq!(a.advanced, b.advanced);
  }

  #[test]
  fn all_optional_blank_falls_back_to_placeholder() {
    let out = build_paragraphs(&fields(&[("name", "Mia")]));
    assert_eq!(out.basic, PLACEHOLDER);
    assert_eq!(out.intermediate, PLACEHOLDER);
    assert_eq!(out.advanced, PLACEHOLDER);

    let empty = build_paragraphs(&HashMap::new());
    assert_eq!(empty.basic, PLACEHOLDER);
  }

  #[test]
  fn required_name_gets_a_default() {
    let out = build_paragraphs(&fields(&[("hobby", "reading")]));
    assert!(out.basic.starts_with("My name is Alex."));
  }

  #[test]
  fn pronoun_and_terminator_stripping_fit_the_carrier_sentence() {
    let out = build_paragraphs(&fields(&[("name", "Sam"), ("occupation", "I'm a nurse.")]));
    assert!(out.basic.contains("I am a nurse."), "got: {}", out.basic);
    assert!(out.intermediate.contains("These days I work as a nurse."));
  }

  #[test]
  fn goal_phrasing_normalizes_to_a_to_fragment() {
    for raw in ["I want to learn English", "I'd like to learn English", "My goal is to learn English.", "learn English"] {
      let out = build_paragraphs(&fields(&[("name", "Sam"), ("goal", raw)]));
      assert!(out.basic.ends_with("I want to learn English."), "raw={raw} got: {}", out.basic);
      assert!(out.advanced.ends_with("My current ambition is to learn English."));
    }
  }

  #[test]
  fn blank_optionals_are_omitted_without_dangling_punctuation() {
    let out = build_paragraphs(&fields(&[("name", "Sam"), ("hometown", "Leeds")]));
    assert_eq!(out.basic, "My name is Sam. I live in Leeds.");
    assert!(!out.intermediate.contains("  "));
    assert!(!out.intermediate.contains(".."));
  }

  #[test]
  fn cleaning_keeps_raw_inputs_untouched() {
    let input = fields(&[("name", "  Ada.  "), ("goal", "I want to fly")]);
    let before = input.clone();
    let _ = build_paragraphs(&input);
    assert_eq!(input, before);

    let cleaned = clean_fields(&input);
    assert_eq!(cleaned.get("name").map(String::as_str), Some("Ada"));
    assert_eq!(cleaned.get("goal").map(String::as_str), Some("to fly"));
  }
}
