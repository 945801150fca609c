//! Seed data and small utilities related to default content.

use crate::domain::{ExerciseDef, ExerciseItem, ExerciseKind, ExerciseSource, OptionDef};
use crate::speech::Voice;

fn opt(key: &str, label: &str) -> OptionDef {
  OptionDef { key: key.into(), label: label.into() }
}

/// Minimal set of built-in exercises that guarantee the app is useful even
/// without an external bank file.
pub fn seed_exercises() -> Vec<ExerciseDef> {
  vec![
    ExerciseDef {
      id: "ex_past_simple".into(),
      title: "Past Simple Check".into(),
      kind: ExerciseKind::MultipleChoice,
      source: ExerciseSource::Seed,
      intro: "Choose the correct past form.".into(),
      items: vec![
        ExerciseItem {
          id: "q1".into(),
          prompt: "Yesterday I ___ to the market.".into(),
          options: vec![opt("a", "go"), opt("b", "went"), opt("c", "gone")],
          expected: "b".into(),
          accept: vec![],
          hint: "Irregular verb: go → went.".into(),
          explanation: "\"Went\" is the past simple of \"go\".".into(),
        },
        ExerciseItem {
          id: "q2".into(),
          prompt: "She ___ her homework before dinner.".into(),
          options: vec![opt("a", "finished"), opt("b", "finish"), opt("c", "finishes")],
          expected: "a".into(),
          accept: vec![],
          hint: "Regular verb + -ed.".into(),
          explanation: "Past simple of a regular verb adds -ed.".into(),
        },
        ExerciseItem {
          id: "q3".into(),
          prompt: "They ___ at home last night.".into(),
          options: vec![opt("a", "was"), opt("b", "be"), opt("c", "were")],
          expected: "c".into(),
          accept: vec![],
          hint: "\"They\" takes the plural past of \"be\".".into(),
          explanation: "\"Were\" pairs with plural subjects.".into(),
        },
      ],
      bands: None,
      time_limit_secs: None,
    },
    ExerciseDef {
      id: "ex_phrasal_match".into(),
      title: "Phrasal Verb Match".into(),
      kind: ExerciseKind::Matching,
      source: ExerciseSource::Seed,
      intro: "Drag each phrasal verb onto its meaning.".into(),
      items: vec![
        ExerciseItem {
          id: "m1".into(),
          prompt: "to stop trying".into(),
          options: vec![opt("give_up", "give up"), opt("look_after", "look after"), opt("turn_down", "turn down")],
          expected: "give_up".into(),
          accept: vec![],
          hint: String::new(),
          explanation: "\"Give up\" means to stop trying.".into(),
        },
        ExerciseItem {
          id: "m2".into(),
          prompt: "to take care of someone".into(),
          options: vec![opt("give_up", "give up"), opt("look_after", "look after"), opt("turn_down", "turn down")],
          expected: "look_after".into(),
          accept: vec![],
          hint: String::new(),
          explanation: "\"Look after\" means to take care of.".into(),
        },
        ExerciseItem {
          id: "m3".into(),
          prompt: "to refuse an offer".into(),
          options: vec![opt("give_up", "give up"), opt("look_after", "look after"), opt("turn_down", "turn down")],
          expected: "turn_down".into(),
          accept: vec![],
          hint: String::new(),
          explanation: "\"Turn down\" means to refuse.".into(),
        },
      ],
      bands: None,
      time_limit_secs: None,
    },
    ExerciseDef {
      id: "ex_prepositions".into(),
      title: "Preposition Blanks".into(),
      kind: ExerciseKind::FillInBlank,
      source: ExerciseSource::Seed,
      intro: "Type the missing preposition.".into(),
      items: vec![
        ExerciseItem {
          id: "b1".into(),
          prompt: "I'm interested ___ photography.".into(),
          options: vec![],
          expected: String::new(),
          accept: vec!["in".into()],
          hint: "interested + ?".into(),
          explanation: "\"Interested in\" is the fixed pairing.".into(),
        },
        ExerciseItem {
          id: "b2".into(),
          prompt: "She's good ___ chess.".into(),
          options: vec![],
          expected: String::new(),
          accept: vec!["at".into()],
          hint: "good + ?".into(),
          explanation: "\"Good at\" is the fixed pairing.".into(),
        },
      ],
      bands: None,
      time_limit_secs: Some(60),
    },
    ExerciseDef {
      id: "ex_word_order".into(),
      title: "Sentence Order".into(),
      kind: ExerciseKind::SentenceOrder,
      source: ExerciseSource::Seed,
      intro: "Arrange the words into a sentence.".into(),
      items: vec![
        ExerciseItem {
          id: "s1".into(),
          prompt: "never / coffee / drinks / he".into(),
          options: vec![],
          expected: String::new(),
          accept: vec!["he never drinks coffee".into()],
          hint: "Adverb of frequency goes before the main verb.".into(),
          explanation: "Subject + adverb + verb + object.".into(),
        },
        ExerciseItem {
          id: "s2".into(),
          prompt: "to / went / last year / Rome / we".into(),
          options: vec![],
          expected: String::new(),
          accept: vec!["we went to rome last year".into(), "last year we went to rome".into()],
          hint: "Time phrases sit at either end.".into(),
          explanation: "Both orders are natural English.".into(),
        },
      ],
      bands: None,
      time_limit_secs: None,
    },
  ]
}

/// A tiny, hand-curated voice table used when the synthesizer service
/// doesn't expose a voice list of its own.
pub fn seed_voices() -> Vec<Voice> {
  vec![
    Voice { id: "amber".into(), language_tag: "en-US".into() },
    Voice { id: "graham".into(), language_tag: "en-GB".into() },
    Voice { id: "sydney".into(), language_tag: "en-AU".into() },
    Voice { id: "clara".into(), language_tag: "es-ES".into() },
    Voice { id: "margot".into(), language_tag: "fr-FR".into() },
  ]
}
