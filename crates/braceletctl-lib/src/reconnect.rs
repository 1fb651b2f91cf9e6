//! Rescan pacing after link loss.
//!
//! The protocol layer's job ends at "link lost, state reset" — restarting
//! discovery belongs to the scanning collaborator. This module paces those
//! restarts with exponential backoff so a bracelet that is out of range or
//! powered down is not hammered with connection attempts.

use std::time::{Duration, Instant};

/// Backoff settings for rescan attempts.
#[derive(Debug, Clone)]
pub struct RescanConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling for the delay between retries.
    pub max_delay: Duration,
    /// Delay growth factor per failure (typically 2.0).
    pub multiplier: f64,
}

impl Default for RescanConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Rescan pacing state. Feed it attempt outcomes; ask it when the next
/// attempt is due.
#[derive(Debug)]
pub struct RescanPacer {
    config: RescanConfig,
    delay: Duration,
    next_attempt: Option<Instant>,
    failures: u32,
}

impl RescanPacer {
    pub fn new(config: RescanConfig) -> Self {
        Self {
            delay: config.initial_delay,
            config,
            next_attempt: None,
            failures: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RescanConfig::default())
    }

    /// Whether a rescan attempt is due. Always true before the first
    /// failure.
    pub fn should_attempt(&self) -> bool {
        match self.next_attempt {
            None => true,
            Some(due) => Instant::now() >= due,
        }
    }

    /// Time remaining until the next attempt is due (zero when due now).
    pub fn delay_remaining(&self) -> Duration {
        match self.next_attempt {
            None => Duration::ZERO,
            Some(due) => due.saturating_duration_since(Instant::now()),
        }
    }

    /// Record a failed attempt and grow the backoff.
    pub fn record_failure(&mut self) {
        self.failures += 1;
        self.next_attempt = Some(Instant::now() + self.delay);
        let grown = self.delay.as_secs_f64() * self.config.multiplier;
        self.delay = Duration::from_secs_f64(grown).min(self.config.max_delay);
    }

    /// Record a successful connection and reset the backoff.
    pub fn record_success(&mut self) {
        self.failures = 0;
        self.delay = self.config.initial_delay;
        self.next_attempt = None;
    }

    /// Consecutive failed attempts since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay that will separate the next failure from the attempt after it.
    pub fn current_delay(&self) -> Duration {
        self.delay
    }
}
