//! Countdown state for timed drills.
//!
//! The frontend renders a ticking display; the backend only owns the
//! authoritative state: when the countdown started and how long it runs.
//! `start` while already running is a no-op (no double-scheduling), and
//! reset cancels the countdown outright.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Countdown {
  duration: Duration,
  started_at: Option<Instant>,
}

impl Countdown {
  pub fn new(secs: u64) -> Self {
    Self { duration: Duration::from_secs(secs), started_at: None }
  }

  /// Begin the countdown. Ignored if one is already running and not yet
  /// expired — callers may invoke this on every "start" click.
  pub fn start(&mut self) {
    if self.is_running() {
      return;
    }
    self.started_at = Some(Instant::now());
  }

  /// Stop and clear. Safe to call when not running.
  pub fn cancel(&mut self) {
    self.started_at = None;
  }

  pub fn is_running(&self) -> bool {
    self.remaining().map(|d| !d.is_zero()).unwrap_or(false)
  }

  pub fn is_expired(&self) -> bool {
    self.remaining().map(|d| d.is_zero()).unwrap_or(false)
  }

  /// Seconds left, rounded up so a display never shows 0 while time remains.
  /// None when the countdown was never started or has been cancelled.
  pub fn remaining_secs(&self) -> Option<u64> {
    self.remaining().map(|d| (d.as_millis() as u64).div_ceil(1000))
  }

  fn remaining(&self) -> Option<Duration> {
    let started = self.started_at?;
    Some(self.duration.saturating_sub(started.elapsed()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn start_is_idempotent_while_running() {
    let mut c = Countdown::new(60);
    c.start();
    let first = c.started_at;
    c.start();
    assert_eq!(c.started_at, first, "second start must not reschedule");
    assert!(c.is_running());
  }

  #[test]
  fn cancel_clears_and_is_safe_to_repeat() {
    let mut c = Countdown::new(60);
    c.start();
    c.cancel();
    assert!(!c.is_running());
    assert_eq!(c.remaining_secs(), None);
    c.cancel();
    assert!(!c.is_running());
  }

  #[test]
  fn zero_duration_expires_immediately() {
    let mut c = Countdown::new(0);
    c.start();
    assert!(c.is_expired());
    assert!(!c.is_running());
    // An expired countdown may be restarted; it just expires again.
    c.start();
    assert!(c.is_expired());
  }

  #[test]
  fn remaining_is_bounded_by_duration() {
    let mut c = Countdown::new(60);
    assert_eq!(c.remaining_secs(), None);
    c.start();
    let left = c.remaining_secs().expect("running");
    assert!(left <= 60 && left > 0);
  }
}
