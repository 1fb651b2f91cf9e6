//! Bracelet state mirror — snapshots, optimistic patches, change fan-out.
//!
//! The store is the host's single mirror of the bracelet's state. STATUS
//! frames replace it wholesale (the device is the source of truth);
//! successful outbound commands patch it optimistically to hide latency.
//! Readers always get a coherent snapshot — both update paths go through
//! one interior lock. The store is owned by the session supervisor, built
//! at session start and reset on link loss; there is no process-wide
//! instance.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::Serialize;

use crate::protocol::DEFAULT_BRIGHTNESS;
use crate::session::LinkState;
use crate::types::{BraceletMode, LedStripEffectType};

// ── State record ──

/// Mirrored bracelet state.
///
/// `battery_percentage` is `None` until the first STATUS report arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BraceletState {
    pub mode: BraceletMode,
    pub battery_percentage: Option<u8>,
    pub power_on: bool,
    pub brightness: u8,
    pub current_effect: LedStripEffectType,
    pub gesture_count: u8,
}

impl Default for BraceletState {
    fn default() -> Self {
        BraceletState {
            mode: BraceletMode::Normal,
            battery_percentage: None,
            power_on: false,
            brightness: DEFAULT_BRIGHTNESS,
            current_effect: LedStripEffectType::None,
            gesture_count: 0,
        }
    }
}

impl BraceletState {
    /// A running effect requires a mode that can host it.
    pub fn is_consistent(&self) -> bool {
        self.current_effect == LedStripEffectType::None || self.mode.supports_effects()
    }
}

// ── Optimistic patches ──

/// Field-wise optimistic update, produced by a command encoder and applied
/// by the store once the transport write succeeded. Patches are advisory:
/// the next authoritative STATUS replace overwrites them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePatch {
    pub mode: Option<BraceletMode>,
    pub power_on: Option<bool>,
    pub brightness: Option<u8>,
    pub effect: Option<LedStripEffectType>,
}

impl StatePatch {
    /// Whether the patch changes nothing (read-only commands).
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.power_on.is_none()
            && self.brightness.is_none()
            && self.effect.is_none()
    }
}

// ── Events ──

/// Event fanned out to presentation subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BraceletEvent {
    /// The state mirror changed; carries the fresh snapshot.
    StateChanged(BraceletState),
    /// The link state machine moved.
    LinkChanged(LinkState),
}

/// Subscriber fan-out for state and link events.
///
/// Subscribers that dropped their receiver are pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<BraceletEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Register a subscriber and return its receiving end.
    pub fn subscribe(&self) -> Receiver<BraceletEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn publish(&self, event: BraceletEvent) {
        let mut subs = self.subscribers.lock().unwrap();
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

// ── Store ──

/// The authoritative in-memory mirror, updates serialized by an interior
/// lock so readers never observe a half-applied record.
#[derive(Debug, Default)]
pub struct StateStore {
    state: Mutex<BraceletState>,
}

impl StateStore {
    pub fn new() -> Self {
        StateStore::default()
    }

    /// Coherent copy of the current state.
    pub fn snapshot(&self) -> BraceletState {
        self.state.lock().unwrap().clone()
    }

    /// Apply an optimistic patch and publish the resulting snapshot.
    ///
    /// Leaving an effect-capable mode clears the running effect — the
    /// firmware stops the animation on any mode change, and the mirror
    /// must not claim an effect the strip is no longer playing.
    pub fn apply(&self, patch: &StatePatch, bus: &EventBus) {
        if patch.is_empty() {
            return;
        }
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            if let Some(mode) = patch.mode {
                state.mode = mode;
            }
            if let Some(power_on) = patch.power_on {
                state.power_on = power_on;
            }
            if let Some(brightness) = patch.brightness {
                state.brightness = brightness;
            }
            if let Some(effect) = patch.effect {
                state.current_effect = effect;
            }
            if !state.mode.supports_effects() {
                state.current_effect = LedStripEffectType::None;
            }
            state.clone()
        };
        bus.publish(BraceletEvent::StateChanged(snapshot));
    }

    /// Replace the record wholesale with an authoritative STATUS report.
    /// Always wins over earlier optimistic patches.
    pub fn replace(&self, new_state: BraceletState, bus: &EventBus) {
        {
            let mut state = self.state.lock().unwrap();
            *state = new_state.clone();
        }
        bus.publish(BraceletEvent::StateChanged(new_state));
    }

    /// Reset to session-start defaults (link loss, explicit disconnect).
    pub fn reset(&self, bus: &EventBus) {
        let defaults = BraceletState::default();
        {
            let mut state = self.state.lock().unwrap();
            *state = defaults.clone();
        }
        bus.publish(BraceletEvent::StateChanged(defaults));
    }
}
