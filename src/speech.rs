//! Speech synthesis: an external capability, consumed but never owned.
//!
//! Two halves:
//! - `SpeechSynth`: minimal HTTP client for an OpenAI-compatible TTS endpoint,
//!   built from env. Absent key -> absent capability, and every consumer
//!   degrades to a no-op plus a one-time notice.
//! - `SpeechChannel`: the single shared playback channel. Starting a new
//!   utterance cancels the previous one, so at most one is ever active.
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{instrument, info, error};
use uuid::Uuid;

pub const UNAVAILABLE_NOTICE: &str =
  "Speech playback is not available right now. Everything else keeps working.";

/// One synthesizer voice, identified by id and BCP-47-style language tag.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Voice {
  pub id: String,
  #[serde(alias = "language")]
  pub language_tag: String,
}

/// Transient playback request. Only one is live at a time system-wide.
#[derive(Clone, Debug, Deserialize)]
pub struct SpeechRequest {
  pub text: String,
  #[serde(default = "default_language_tag")]
  pub language_tag: String,
  #[serde(default = "default_rate")]
  pub rate: f32,
  #[serde(default = "default_pitch")]
  pub pitch: f32,
}

fn default_language_tag() -> String { "en-US".into() }
fn default_rate() -> f32 { 1.0 }
fn default_pitch() -> f32 { 1.0 }

/// Pick the best voice for a requested tag, by fallback chain:
/// exact tag -> tag equal after normalization (case, '_' vs '-') -> same base
/// language -> first available. Returns None only for an empty list.
pub fn select_voice<'a>(voices: &'a [Voice], language_tag: &str) -> Option<&'a Voice> {
  if let Some(v) = voices.iter().find(|v| v.language_tag == language_tag) {
    return Some(v);
  }
  let want = normalize_tag(language_tag);
  if let Some(v) = voices.iter().find(|v| normalize_tag(&v.language_tag) == want) {
    return Some(v);
  }
  let base = want.split('-').next().unwrap_or(&want).to_string();
  if let Some(v) = voices
    .iter()
    .find(|v| normalize_tag(&v.language_tag).split('-').next() == Some(base.as_str()))
  {
    return Some(v);
  }
  voices.first()
}

fn normalize_tag(tag: &str) -> String {
  tag.trim().replace('_', "-").to_lowercase()
}

// --- The playback channel (exclusivity + degradation bookkeeping) ---

#[derive(Clone, Debug, Serialize)]
pub struct Utterance {
  pub id: String,
  pub text: String,
  pub language_tag: String,
  pub voice: Option<Voice>,
  pub rate: f32,
  pub pitch: f32,
  pub paused: bool,
}

/// The one shared speech channel. No lock structure is needed beyond the
/// surrounding state lock; cancel-before-speak is a sequencing convention.
pub struct SpeechChannel {
  voices: Vec<Voice>,
  current: Option<Utterance>,
  notice_emitted: bool,
}

impl SpeechChannel {
  pub fn new(voices: Vec<Voice>) -> Self {
    Self { voices, current: None, notice_emitted: false }
  }

  pub fn voices(&self) -> &[Voice] {
    &self.voices
  }

  /// Replace the voice list (it is asynchronous and may change or be empty).
  pub fn set_voices(&mut self, voices: Vec<Voice>) {
    self.voices = voices;
  }

  /// Cancel whatever is playing and begin a new utterance.
  pub fn begin(&mut self, req: &SpeechRequest) -> Utterance {
    let voice = select_voice(&self.voices, &req.language_tag).cloned();
    let utt = Utterance {
      id: Uuid::new_v4().to_string(),
      text: req.text.clone(),
      language_tag: req.language_tag.clone(),
      voice,
      rate: req.rate,
      pitch: req.pitch,
      paused: false,
    };
    self.current = Some(utt.clone());
    utt
  }

  pub fn current(&self) -> Option<&Utterance> {
    self.current.as_ref()
  }

  /// Pause the active utterance. False when nothing is active.
  pub fn pause(&mut self) -> bool {
    match self.current.as_mut() {
      Some(u) => {
        u.paused = true;
        true
      }
      None => false,
    }
  }

  /// Resume a paused utterance. False when nothing is active.
  pub fn resume(&mut self) -> bool {
    match self.current.as_mut() {
      Some(u) => {
        u.paused = false;
        true
      }
      None => false,
    }
  }

  /// Stop playback entirely. Safe when nothing is active.
  pub fn cancel(&mut self) -> bool {
    self.current.take().is_some()
  }

  /// The capability-unavailable notice, surfaced exactly once per channel.
  pub fn unavailable_notice(&mut self) -> Option<&'static str> {
    if self.notice_emitted {
      None
    } else {
      self.notice_emitted = true;
      Some(UNAVAILABLE_NOTICE)
    }
  }
}

// --- The external synthesizer client ---

#[derive(Clone)]
pub struct SpeechSynth {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl SpeechSynth {
  /// Construct the client if we find TTS_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("TTS_API_KEY").ok()?;
    let base_url =
      std::env::var("TTS_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// Request synthesized audio bytes for one utterance.
  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), voice = %voice_id))]
  pub async fn synthesize(&self, text: &str, voice_id: &str, rate: f32) -> Result<Vec<u8>, String> {
    let url = format!("{}/audio/speech", self.base_url);
    let req = SpeechApiRequest {
      model: self.model.clone(),
      input: text.to_string(),
      voice: voice_id.to_string(),
      speed: rate,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "linglab-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      return Err(format!("TTS HTTP {}: {}", status, msg));
    }

    let bytes = res.bytes().await.map_err(|e| e.to_string())?;
    info!(audio_bytes = bytes.len(), "TTS audio received");
    Ok(bytes.to_vec())
  }

  /// Fetch the service's voice inventory. The list is best-effort: servers
  /// without the endpoint simply leave the seed voices in place.
  #[instrument(level = "info", skip(self))]
  pub async fn list_voices(&self) -> Result<Vec<Voice>, String> {
    let url = format!("{}/audio/voices", self.base_url);
    let res = self.client.get(&url)
      .header(USER_AGENT, "linglab-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      return Err(format!("TTS HTTP {}: {}", status, msg));
    }

    #[derive(Deserialize)]
    struct VoicesBody { voices: Vec<Voice> }
    let body: VoicesBody = res.json().await.map_err(|e| e.to_string())?;
    Ok(body.voices)
  }
}

#[derive(Serialize)]
struct SpeechApiRequest {
  model: String,
  input: String,
  voice: String,
  speed: f32,
}

/// Try to extract a clean error message from the service's error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn voices() -> Vec<Voice> {
    vec![
      Voice { id: "amber".into(), language_tag: "en-US".into() },
      Voice { id: "graham".into(), language_tag: "en-GB".into() },
      Voice { id: "margot".into(), language_tag: "fr-FR".into() },
    ]
  }

  fn req(text: &str) -> SpeechRequest {
    SpeechRequest { text: text.into(), language_tag: "en-GB".into(), rate: 1.0, pitch: 1.0 }
  }

  #[test]
  fn voice_selection_walks_the_fallback_chain() {
    let vs = voices();
    assert_eq!(select_voice(&vs, "en-GB").map(|v| v.id.as_str()), Some("graham"));
    // Normalization-tolerant match.
    assert_eq!(select_voice(&vs, "en_gb").map(|v| v.id.as_str()), Some("graham"));
    // Unknown region falls back to the base language.
    assert_eq!(select_voice(&vs, "en-NZ").map(|v| v.id.as_str()), Some("amber"));
    // Unknown language falls back to the first voice.
    assert_eq!(select_voice(&vs, "de-DE").map(|v| v.id.as_str()), Some("amber"));
    // Empty list never errors.
    assert_eq!(select_voice(&[], "en-US"), None);
  }

  #[test]
  fn new_speak_cancels_the_previous_utterance() {
    let mut ch = SpeechChannel::new(voices());
    let first = ch.begin(&req("first sentence"));
    let second = ch.begin(&req("second sentence"));
    assert_ne!(first.id, second.id);

    let active = ch.current().expect("one active");
    assert_eq!(active.id, second.id);
    assert_eq!(active.text, "second sentence");
  }

  #[test]
  fn pause_resume_cancel_lifecycle() {
    let mut ch = SpeechChannel::new(voices());
    assert!(!ch.pause(), "pause with nothing active is a no-op");
    ch.begin(&req("hello"));
    assert!(ch.pause());
    assert!(ch.current().expect("active").paused);
    assert!(ch.resume());
    assert!(!ch.current().expect("active").paused);
    assert!(ch.cancel());
    assert!(ch.current().is_none());
    assert!(!ch.cancel());
  }

  #[test]
  fn unavailable_notice_fires_exactly_once() {
    let mut ch = SpeechChannel::new(vec![]);
    assert_eq!(ch.unavailable_notice(), Some(UNAVAILABLE_NOTICE));
    assert_eq!(ch.unavailable_notice(), None);
    assert_eq!(ch.unavailable_notice(), None);
  }

  #[test]
  fn begin_with_no_voices_still_produces_an_utterance() {
    let mut ch = SpeechChannel::new(vec![]);
    let utt = ch.begin(&req("unvoiced"));
    assert!(utt.voice.is_none());
    assert!(ch.current().is_some());
  }
}
