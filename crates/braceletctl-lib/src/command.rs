//! Command encoders — payload construction plus declarative optimistic
//! patches.
//!
//! Every encoder returns a [`CommandRequest`]: the encoded frame ready for a
//! transport write, and the [`StatePatch`] to apply to the mirror once that
//! write succeeded. Call sites never mutate shared state themselves; the
//! session applies the patch under the store's update discipline, and only
//! after the transport confirmed the write left the host.

use crate::frame::{self, FrameError};
use crate::state::StatePatch;
use crate::types::{BraceletMode, LedStripCommandType, LedStripEffectType, MessageType};

/// An encoded outbound command: wire bytes plus the optimistic mirror update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub frame: Vec<u8>,
    pub patch: StatePatch,
}

/// Request a fresh STATUS report. Read-only probe, no local mutation.
pub fn status_request() -> Result<CommandRequest, FrameError> {
    Ok(CommandRequest {
        frame: frame::encode(MessageType::Status, &[])?,
        patch: StatePatch::default(),
    })
}

/// Switch the bracelet mode, optionally carrying extra data.
///
/// Payload: `[mode]` when `extra` is empty, else `[mode, extra_len, extra...]`.
/// Extra data longer than [`crate::protocol::MAX_MODE_EXTRA_LEN`] is a
/// caller contract violation and is rejected by the codec.
pub fn mode_change(mode: BraceletMode, extra: &[u8]) -> Result<CommandRequest, FrameError> {
    let mut payload = Vec::with_capacity(1 + if extra.is_empty() { 0 } else { 1 + extra.len() });
    payload.push(mode.code());
    if !extra.is_empty() {
        payload.push(extra.len() as u8);
        payload.extend_from_slice(extra);
    }
    Ok(CommandRequest {
        frame: frame::encode(MessageType::Mode, &payload)?,
        patch: StatePatch {
            mode: Some(mode),
            ..Default::default()
        },
    })
}

/// Turn the LED strip on or off.
pub fn power(on: bool) -> Result<CommandRequest, FrameError> {
    let payload = [LedStripCommandType::Power.code(), u8::from(on)];
    Ok(CommandRequest {
        frame: frame::encode(MessageType::LedStrip, &payload)?,
        patch: StatePatch {
            power_on: Some(on),
            ..Default::default()
        },
    })
}

/// Set strip brightness. The `u8` parameter is the 0–255 contract.
pub fn brightness(level: u8) -> Result<CommandRequest, FrameError> {
    let payload = [LedStripCommandType::Brightness.code(), level];
    Ok(CommandRequest {
        frame: frame::encode(MessageType::LedStrip, &payload)?,
        patch: StatePatch {
            brightness: Some(level),
            ..Default::default()
        },
    })
}

/// Start an effect, or stop the running one with [`LedStripEffectType::None`].
///
/// Rides on a MODE frame: selecting an effect moves the bracelet to Effect
/// mode, selecting None reverts to Normal. The effect code travels as the
/// mode change's extra byte.
pub fn effect(kind: LedStripEffectType) -> Result<CommandRequest, FrameError> {
    let new_mode = if kind == LedStripEffectType::None {
        BraceletMode::Normal
    } else {
        BraceletMode::Effect
    };
    let mut request = mode_change(new_mode, &[kind.code()])?;
    request.patch.effect = Some(kind);
    Ok(request)
}

/// Paint the whole strip one color. 24-bit RGB, sent as a big-endian u32.
///
/// Fire-and-forget for the mirror: per-pixel color state lives on the
/// device only.
pub fn color(rgb: u32) -> Result<CommandRequest, FrameError> {
    let rgb_bytes = rgb.to_be_bytes();
    let payload = [
        LedStripCommandType::Color.code(),
        rgb_bytes[0],
        rgb_bytes[1],
        rgb_bytes[2],
        rgb_bytes[3],
    ];
    Ok(CommandRequest {
        frame: frame::encode(MessageType::LedStrip, &payload)?,
        patch: StatePatch::default(),
    })
}

/// Start motion-sensor calibration. Device-side effect only.
pub fn calibrate() -> Result<CommandRequest, FrameError> {
    Ok(CommandRequest {
        frame: frame::encode(MessageType::Calibrate, &[])?,
        patch: StatePatch::default(),
    })
}

/// Record a new gesture bound to the given effect.
pub fn add_gesture(effect: LedStripEffectType) -> Result<CommandRequest, FrameError> {
    Ok(CommandRequest {
        frame: frame::encode(MessageType::AddGesture, &[effect.code()])?,
        patch: StatePatch::default(),
    })
}

/// Remove the most recently recorded gesture.
pub fn remove_gesture() -> Result<CommandRequest, FrameError> {
    Ok(CommandRequest {
        frame: frame::encode(MessageType::RemoveGesture, &[])?,
        patch: StatePatch::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decode;

    fn xor(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0, |acc, b| acc ^ b)
    }

    // ── status request ──

    #[test]
    fn status_request_empty_payload_no_patch() {
        let req = status_request().unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.message_type, MessageType::Status);
        assert!(frame.payload.is_empty());
        assert!(req.patch.is_empty());
    }

    // ── power ──

    #[test]
    fn power_on_exact_bytes() {
        let req = power(true).unwrap();
        let mut expected = vec![0x3F, MessageType::LedStrip.code(), 2, 0, 1];
        expected.push(xor(&expected));
        assert_eq!(req.frame, expected);
        assert_eq!(req.patch.power_on, Some(true));
        assert_eq!(req.patch.mode, None);
    }

    #[test]
    fn power_off_payload() {
        let req = power(false).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.payload, vec![0, 0]);
        assert_eq!(req.patch.power_on, Some(false));
    }

    // ── brightness ──

    #[test]
    fn brightness_payload_and_patch() {
        let req = brightness(200).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.message_type, MessageType::LedStrip);
        assert_eq!(frame.payload, vec![1, 200]);
        assert_eq!(req.patch.brightness, Some(200));
    }

    #[test]
    fn brightness_extremes() {
        assert_eq!(decode(&brightness(0).unwrap().frame).unwrap().payload, vec![1, 0]);
        assert_eq!(
            decode(&brightness(255).unwrap().frame).unwrap().payload,
            vec![1, 255]
        );
    }

    // ── mode change ──

    #[test]
    fn mode_change_without_extra() {
        let req = mode_change(BraceletMode::Gesture, &[]).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.message_type, MessageType::Mode);
        assert_eq!(frame.payload, vec![BraceletMode::Gesture.code()]);
        assert_eq!(req.patch.mode, Some(BraceletMode::Gesture));
        assert_eq!(req.patch.effect, None);
    }

    #[test]
    fn mode_change_with_extra_carries_length() {
        let req = mode_change(BraceletMode::Effect, &[7, 8, 9]).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.payload, vec![BraceletMode::Effect.code(), 3, 7, 8, 9]);
    }

    #[test]
    fn mode_change_oversized_extra_rejected() {
        let extra = vec![0u8; 254];
        assert!(matches!(
            mode_change(BraceletMode::Effect, &extra),
            Err(FrameError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn mode_change_max_extra_accepted() {
        let extra = vec![0u8; crate::protocol::MAX_MODE_EXTRA_LEN];
        let req = mode_change(BraceletMode::Effect, &extra).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.payload.len(), 255);
    }

    // ── effect ──

    #[test]
    fn effect_selects_effect_mode() {
        let req = effect(LedStripEffectType::Rainbow).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.message_type, MessageType::Mode);
        assert_eq!(
            frame.payload,
            vec![BraceletMode::Effect.code(), 1, LedStripEffectType::Rainbow.code()]
        );
        assert_eq!(req.patch.mode, Some(BraceletMode::Effect));
        assert_eq!(req.patch.effect, Some(LedStripEffectType::Rainbow));
    }

    #[test]
    fn effect_none_reverts_to_normal_mode() {
        let req = effect(LedStripEffectType::None).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(
            frame.payload,
            vec![BraceletMode::Normal.code(), 1, LedStripEffectType::None.code()]
        );
        assert_eq!(req.patch.mode, Some(BraceletMode::Normal));
        assert_eq!(req.patch.effect, Some(LedStripEffectType::None));
    }

    // ── color ──

    #[test]
    fn color_big_endian_bytes() {
        let req = color(0x00AB_CDEF).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.message_type, MessageType::LedStrip);
        assert_eq!(frame.payload, vec![2, 0x00, 0xAB, 0xCD, 0xEF]);
        assert!(req.patch.is_empty(), "color is fire-and-forget");
    }

    #[test]
    fn color_full_width_value() {
        let req = color(0xFF00_FF00).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.payload, vec![2, 0xFF, 0x00, 0xFF, 0x00]);
    }

    // ── gestures / calibration ──

    #[test]
    fn calibrate_empty_payload() {
        let req = calibrate().unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.message_type, MessageType::Calibrate);
        assert!(frame.payload.is_empty());
        assert!(req.patch.is_empty());
    }

    #[test]
    fn add_gesture_carries_effect_code() {
        let req = add_gesture(LedStripEffectType::Circle).unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.message_type, MessageType::AddGesture);
        assert_eq!(frame.payload, vec![LedStripEffectType::Circle.code()]);
        assert!(req.patch.is_empty());
    }

    #[test]
    fn remove_gesture_empty_payload() {
        let req = remove_gesture().unwrap();
        let frame = decode(&req.frame).unwrap();
        assert_eq!(frame.message_type, MessageType::RemoveGesture);
        assert!(frame.payload.is_empty());
        assert!(req.patch.is_empty());
    }

    // ── every encoder emits a decodable frame ──

    #[test]
    fn all_encoders_emit_valid_frames() {
        let requests = [
            status_request().unwrap(),
            mode_change(BraceletMode::Motion, &[]).unwrap(),
            power(true).unwrap(),
            brightness(128).unwrap(),
            effect(LedStripEffectType::Fade).unwrap(),
            color(0x0012_3456).unwrap(),
            calibrate().unwrap(),
            add_gesture(LedStripEffectType::Trail).unwrap(),
            remove_gesture().unwrap(),
        ];
        for req in &requests {
            decode(&req.frame).expect("encoder produced an undecodable frame");
        }
    }
}
