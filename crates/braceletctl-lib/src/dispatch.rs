//! Inbound message dispatch — routes validated frames to their handlers.
//!
//! Dispatch is total over [`MessageType`]: every variant has a defined
//! handler, including "ignore" for types the bracelet never originates.
//! STATUS replaces the state mirror atomically; a malformed STATUS leaves
//! the previous record untouched — never a partial overwrite.

use std::fmt;

use crate::frame::Frame;
use crate::protocol::{
    STATUS_OFF_BATTERY, STATUS_OFF_BRIGHTNESS, STATUS_OFF_EFFECT, STATUS_OFF_GESTURE_COUNT,
    STATUS_OFF_MODE, STATUS_OFF_POWER, STATUS_PAYLOAD_LEN,
};
use crate::state::{BraceletState, EventBus, StateStore};
use crate::types::{BraceletMode, LedStripEffectType, MessageType};

/// Semantic errors for frames that passed framing validation.
///
/// Recoverable: the triggering frame is dropped and the last-known-good
/// state is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// STATUS payload does not match the fixed six-field layout, or a field
    /// carries an impossible value.
    MalformedStatus(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::MalformedStatus(reason) => write!(f, "malformed STATUS: {reason}"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// What a successful dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// STATUS handled, state mirror replaced.
    StatusReplaced,
    /// DEBUG text surfaced to logging.
    DebugLogged,
    /// Host-bound type received from the device; dropped by design.
    Ignored(MessageType),
}

/// Decode a STATUS payload into a fresh state record.
///
/// Positional layout, one byte per field: mode, battery, power, effect,
/// brightness, gesture count. The layout is a versioned wire contract —
/// exactly one revision per deployment, so length mismatches in either
/// direction fail closed rather than guessing a revision.
pub fn decode_status(payload: &[u8]) -> Result<BraceletState, DispatchError> {
    if payload.len() != STATUS_PAYLOAD_LEN {
        return Err(DispatchError::MalformedStatus(format!(
            "payload is {} bytes, layout requires {STATUS_PAYLOAD_LEN}",
            payload.len()
        )));
    }
    let mode = BraceletMode::from_code(payload[STATUS_OFF_MODE]).ok_or_else(|| {
        DispatchError::MalformedStatus(format!("unknown mode code {}", payload[STATUS_OFF_MODE]))
    })?;
    let battery = payload[STATUS_OFF_BATTERY];
    if battery > 100 {
        return Err(DispatchError::MalformedStatus(format!(
            "battery {battery}% out of range"
        )));
    }
    let power_on = match payload[STATUS_OFF_POWER] {
        0 => false,
        1 => true,
        other => {
            return Err(DispatchError::MalformedStatus(format!(
                "power byte {other} is neither 0 nor 1"
            )));
        }
    };
    let effect = LedStripEffectType::from_code(payload[STATUS_OFF_EFFECT]).ok_or_else(|| {
        DispatchError::MalformedStatus(format!(
            "unknown effect code {}",
            payload[STATUS_OFF_EFFECT]
        ))
    })?;

    let state = BraceletState {
        mode,
        battery_percentage: Some(battery),
        power_on,
        brightness: payload[STATUS_OFF_BRIGHTNESS],
        current_effect: effect,
        gesture_count: payload[STATUS_OFF_GESTURE_COUNT],
    };
    if !state.is_consistent() {
        return Err(DispatchError::MalformedStatus(format!(
            "effect {effect} reported in mode {mode}, which cannot host effects"
        )));
    }
    Ok(state)
}

/// Route one validated frame. Total over every message type.
pub fn dispatch(
    frame: &Frame,
    store: &StateStore,
    bus: &EventBus,
) -> Result<Dispatched, DispatchError> {
    match frame.message_type {
        MessageType::Status => {
            let state = decode_status(&frame.payload)?;
            store.replace(state, bus);
            Ok(Dispatched::StatusReplaced)
        }
        MessageType::Debug => {
            log::debug!("bracelet: {}", String::from_utf8_lossy(&frame.payload));
            Ok(Dispatched::DebugLogged)
        }
        // Host → device types; the bracelet never sends these. Dropped
        // without touching state.
        t @ (MessageType::LedStrip
        | MessageType::Mode
        | MessageType::Calibrate
        | MessageType::AddGesture
        | MessageType::RemoveGesture) => {
            log::debug!("ignoring host-bound {t} frame from device");
            Ok(Dispatched::Ignored(t))
        }
    }
}
