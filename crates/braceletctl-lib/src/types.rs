//! Closed wire enumerations — message types, bracelet modes, effects.
//!
//! Every enumeration maps to a fixed integer code on the wire. Lookups go
//! through explicit `from_code` tables that fail closed: an unknown code
//! yields `None` instead of panicking, so a newer firmware talking to an
//! older host degrades to a dropped frame rather than a crash.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

// ── Message types ──

/// Frame type tag, second byte of every wire frame.
///
/// Code 0 belonged to the retired INIT message and is never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// State report (device → host) or state request (host → device).
    Status,
    /// Free-form firmware debug text, surfaced to logging only.
    Debug,
    /// LED strip command: power, brightness, or whole-strip color.
    LedStrip,
    /// Mode change, optionally carrying extra data (e.g. an effect code).
    Mode,
    /// Start motion-sensor calibration.
    Calibrate,
    /// Record a new gesture bound to an effect.
    AddGesture,
    /// Remove the most recently recorded gesture.
    RemoveGesture,
}

impl MessageType {
    /// All message types, in wire-code order.
    pub const ALL: [MessageType; 7] = [
        MessageType::Status,
        MessageType::Debug,
        MessageType::LedStrip,
        MessageType::Mode,
        MessageType::Calibrate,
        MessageType::AddGesture,
        MessageType::RemoveGesture,
    ];

    /// Wire code for this message type.
    pub fn code(self) -> u8 {
        match self {
            MessageType::Status => 1,
            MessageType::Debug => 2,
            MessageType::LedStrip => 3,
            MessageType::Mode => 4,
            MessageType::Calibrate => 5,
            MessageType::AddGesture => 6,
            MessageType::RemoveGesture => 7,
        }
    }

    /// Look up a message type by wire code. Unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<MessageType> {
        match code {
            1 => Some(MessageType::Status),
            2 => Some(MessageType::Debug),
            3 => Some(MessageType::LedStrip),
            4 => Some(MessageType::Mode),
            5 => Some(MessageType::Calibrate),
            6 => Some(MessageType::AddGesture),
            7 => Some(MessageType::RemoveGesture),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Status => "STATUS",
            MessageType::Debug => "DEBUG",
            MessageType::LedStrip => "LEDSTRIP",
            MessageType::Mode => "MODE",
            MessageType::Calibrate => "CALIBRATE",
            MessageType::AddGesture => "ADD_GESTURE",
            MessageType::RemoveGesture => "REMOVE_GESTURE",
        };
        write!(f, "{name}")
    }
}

// ── Bracelet modes ──

/// Operating mode of the bracelet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BraceletMode {
    /// Direct color painting, no animation.
    Normal,
    /// Running LED strip effect.
    Effect,
    /// Effect triggered by a recorded gesture.
    GestureEffect,
    /// Gesture recording/recognition, strip idle.
    Gesture,
    /// Motion-reactive colors.
    Motion,
    /// Motion-reactive effect animation.
    MotionEffect,
}

impl BraceletMode {
    /// All modes, in wire-code order.
    pub const ALL: [BraceletMode; 6] = [
        BraceletMode::Normal,
        BraceletMode::Effect,
        BraceletMode::GestureEffect,
        BraceletMode::Gesture,
        BraceletMode::Motion,
        BraceletMode::MotionEffect,
    ];

    /// Wire code for this mode.
    pub fn code(self) -> u8 {
        match self {
            BraceletMode::Normal => 0,
            BraceletMode::Effect => 1,
            BraceletMode::GestureEffect => 2,
            BraceletMode::Gesture => 3,
            BraceletMode::Motion => 4,
            BraceletMode::MotionEffect => 5,
        }
    }

    /// Look up a mode by wire code. Unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<BraceletMode> {
        match code {
            0 => Some(BraceletMode::Normal),
            1 => Some(BraceletMode::Effect),
            2 => Some(BraceletMode::GestureEffect),
            3 => Some(BraceletMode::Gesture),
            4 => Some(BraceletMode::Motion),
            5 => Some(BraceletMode::MotionEffect),
            _ => None,
        }
    }

    /// Whether direct color painting is meaningful in this mode.
    pub fn can_change_color(self) -> bool {
        matches!(
            self,
            BraceletMode::Normal | BraceletMode::Effect | BraceletMode::Motion
        )
    }

    /// Whether this mode can host a running strip effect.
    pub fn supports_effects(self) -> bool {
        matches!(
            self,
            BraceletMode::Effect | BraceletMode::GestureEffect | BraceletMode::MotionEffect
        )
    }
}

impl fmt::Display for BraceletMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BraceletMode::Normal => "normal",
            BraceletMode::Effect => "effect",
            BraceletMode::GestureEffect => "gesture-effect",
            BraceletMode::Gesture => "gesture",
            BraceletMode::Motion => "motion",
            BraceletMode::MotionEffect => "motion-effect",
        };
        write!(f, "{name}")
    }
}

impl FromStr for BraceletMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(BraceletMode::Normal),
            "effect" => Ok(BraceletMode::Effect),
            "gesture-effect" | "gesture_effect" => Ok(BraceletMode::GestureEffect),
            "gesture" => Ok(BraceletMode::Gesture),
            "motion" => Ok(BraceletMode::Motion),
            "motion-effect" | "motion_effect" => Ok(BraceletMode::MotionEffect),
            other => Err(format!(
                "unknown mode '{other}' (expected one of: normal, effect, \
                 gesture-effect, gesture, motion, motion-effect)"
            )),
        }
    }
}

// ── LED strip effects ──

/// Animation running on the LED strip.
///
/// The first four codes shipped with the original firmware; TRAIL, COMPASS
/// and TEMPERATURE were appended later and must keep their codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedStripEffectType {
    None,
    Rainbow,
    Circle,
    Fade,
    Trail,
    Compass,
    Temperature,
}

impl LedStripEffectType {
    /// All effects, in wire-code order.
    pub const ALL: [LedStripEffectType; 7] = [
        LedStripEffectType::None,
        LedStripEffectType::Rainbow,
        LedStripEffectType::Circle,
        LedStripEffectType::Fade,
        LedStripEffectType::Trail,
        LedStripEffectType::Compass,
        LedStripEffectType::Temperature,
    ];

    /// Wire code for this effect.
    pub fn code(self) -> u8 {
        match self {
            LedStripEffectType::None => 0,
            LedStripEffectType::Rainbow => 1,
            LedStripEffectType::Circle => 2,
            LedStripEffectType::Fade => 3,
            LedStripEffectType::Trail => 4,
            LedStripEffectType::Compass => 5,
            LedStripEffectType::Temperature => 6,
        }
    }

    /// Look up an effect by wire code. Unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<LedStripEffectType> {
        match code {
            0 => Some(LedStripEffectType::None),
            1 => Some(LedStripEffectType::Rainbow),
            2 => Some(LedStripEffectType::Circle),
            3 => Some(LedStripEffectType::Fade),
            4 => Some(LedStripEffectType::Trail),
            5 => Some(LedStripEffectType::Compass),
            6 => Some(LedStripEffectType::Temperature),
            _ => None,
        }
    }
}

impl fmt::Display for LedStripEffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LedStripEffectType::None => "none",
            LedStripEffectType::Rainbow => "rainbow",
            LedStripEffectType::Circle => "circle",
            LedStripEffectType::Fade => "fade",
            LedStripEffectType::Trail => "trail",
            LedStripEffectType::Compass => "compass",
            LedStripEffectType::Temperature => "temperature",
        };
        write!(f, "{name}")
    }
}

impl FromStr for LedStripEffectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(LedStripEffectType::None),
            "rainbow" => Ok(LedStripEffectType::Rainbow),
            "circle" => Ok(LedStripEffectType::Circle),
            "fade" => Ok(LedStripEffectType::Fade),
            "trail" => Ok(LedStripEffectType::Trail),
            "compass" => Ok(LedStripEffectType::Compass),
            "temperature" => Ok(LedStripEffectType::Temperature),
            other => Err(format!(
                "unknown effect '{other}' (expected one of: none, rainbow, \
                 circle, fade, trail, compass, temperature)"
            )),
        }
    }
}

// ── LED strip command tags ──

/// First payload byte of a LEDSTRIP frame, selecting the sub-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedStripCommandType {
    Power,
    Brightness,
    Color,
}

impl LedStripCommandType {
    /// Wire code for this sub-command.
    pub fn code(self) -> u8 {
        match self {
            LedStripCommandType::Power => 0,
            LedStripCommandType::Brightness => 1,
            LedStripCommandType::Color => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Code tables round-trip ──

    #[test]
    fn message_type_codes_round_trip() {
        for t in MessageType::ALL {
            assert_eq!(MessageType::from_code(t.code()), Some(t));
        }
    }

    #[test]
    fn mode_codes_round_trip() {
        for m in BraceletMode::ALL {
            assert_eq!(BraceletMode::from_code(m.code()), Some(m));
        }
    }

    #[test]
    fn effect_codes_round_trip() {
        for e in LedStripEffectType::ALL {
            assert_eq!(LedStripEffectType::from_code(e.code()), Some(e));
        }
    }

    // ── Closed tables fail closed ──

    #[test]
    fn message_type_code_zero_is_retired() {
        assert_eq!(MessageType::from_code(0), None);
    }

    #[test]
    fn message_type_unknown_codes_rejected() {
        for code in 8..=255u8 {
            assert_eq!(MessageType::from_code(code), None, "code {code}");
        }
    }

    #[test]
    fn mode_unknown_codes_rejected() {
        for code in 6..=255u8 {
            assert_eq!(BraceletMode::from_code(code), None, "code {code}");
        }
    }

    #[test]
    fn effect_unknown_codes_rejected() {
        for code in 7..=255u8 {
            assert_eq!(LedStripEffectType::from_code(code), None, "code {code}");
        }
    }

    // ── Codes distinct ──

    #[test]
    fn message_type_codes_distinct() {
        let codes: Vec<u8> = MessageType::ALL.iter().map(|t| t.code()).collect();
        for i in 0..codes.len() {
            for j in (i + 1)..codes.len() {
                assert_ne!(codes[i], codes[j], "codes at index {i} and {j} collide");
            }
        }
    }

    #[test]
    fn ledstrip_command_codes_distinct() {
        assert_ne!(
            LedStripCommandType::Power.code(),
            LedStripCommandType::Brightness.code()
        );
        assert_ne!(
            LedStripCommandType::Power.code(),
            LedStripCommandType::Color.code()
        );
        assert_ne!(
            LedStripCommandType::Brightness.code(),
            LedStripCommandType::Color.code()
        );
    }

    // ── Mode predicates ──

    #[test]
    fn color_paintable_modes() {
        assert!(BraceletMode::Normal.can_change_color());
        assert!(BraceletMode::Effect.can_change_color());
        assert!(BraceletMode::Motion.can_change_color());
        assert!(!BraceletMode::Gesture.can_change_color());
        assert!(!BraceletMode::GestureEffect.can_change_color());
        assert!(!BraceletMode::MotionEffect.can_change_color());
    }

    #[test]
    fn effect_capable_modes() {
        assert!(BraceletMode::Effect.supports_effects());
        assert!(BraceletMode::GestureEffect.supports_effects());
        assert!(BraceletMode::MotionEffect.supports_effects());
        assert!(!BraceletMode::Normal.supports_effects());
        assert!(!BraceletMode::Gesture.supports_effects());
        assert!(!BraceletMode::Motion.supports_effects());
    }

    // ── FromStr ──

    #[test]
    fn mode_from_str_accepts_aliases() {
        assert_eq!("normal".parse::<BraceletMode>(), Ok(BraceletMode::Normal));
        assert_eq!(
            "gesture-effect".parse::<BraceletMode>(),
            Ok(BraceletMode::GestureEffect)
        );
        assert_eq!(
            "gesture_effect".parse::<BraceletMode>(),
            Ok(BraceletMode::GestureEffect)
        );
        assert_eq!(
            "  MOTION  ".parse::<BraceletMode>(),
            Ok(BraceletMode::Motion)
        );
    }

    #[test]
    fn mode_from_str_rejects_unknown() {
        assert!("disco".parse::<BraceletMode>().is_err());
    }

    #[test]
    fn effect_from_str_accepts_off_alias() {
        assert_eq!(
            "off".parse::<LedStripEffectType>(),
            Ok(LedStripEffectType::None)
        );
        assert_eq!(
            "Rainbow".parse::<LedStripEffectType>(),
            Ok(LedStripEffectType::Rainbow)
        );
    }

    #[test]
    fn effect_from_str_rejects_unknown() {
        assert!("sparkle".parse::<LedStripEffectType>().is_err());
    }

    // ── Display ──

    #[test]
    fn display_names() {
        assert_eq!(MessageType::AddGesture.to_string(), "ADD_GESTURE");
        assert_eq!(BraceletMode::MotionEffect.to_string(), "motion-effect");
        assert_eq!(LedStripEffectType::Temperature.to_string(), "temperature");
    }

    #[test]
    fn serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&BraceletMode::GestureEffect).unwrap(),
            "\"gesture_effect\""
        );
        assert_eq!(
            serde_json::to_string(&LedStripEffectType::Rainbow).unwrap(),
            "\"rainbow\""
        );
    }
}
