//! Protocol constants for the Color Matching Bracelet.
//!
//! All values decoded from the bracelet firmware and the original companion
//! app. The framing format and the STATUS payload layout are the two
//! compatibility-sensitive contracts here: the firmware rejects frames whose
//! checksum does not fold to the trailing byte, and the host rejects STATUS
//! reports that do not match the fixed six-field layout.
//!
//! ## Protocol revisions
//!
//! Message type and effect codes were assigned incrementally across firmware
//! revisions. Codes already shipped never move; new members are appended.
//! Code 0 carried the retired INIT message in the earliest revision and must
//! stay unassigned.

// ── Framing ──

/// Frame start marker — every wire frame begins with this byte ('?').
pub const START_MARKER: u8 = 0x3F;

/// Bytes of framing around the payload: start, type, length, checksum.
pub const FRAME_OVERHEAD: usize = 4;

/// Maximum payload size — the length field is a single byte.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// MODE frames carry `[mode, extra_len, extra...]`, so the extra data
/// loses two payload bytes to the mode code and its own length byte.
pub const MAX_MODE_EXTRA_LEN: usize = MAX_PAYLOAD_LEN - 2;

// ── STATUS payload layout ──

/// STATUS payload size: mode, battery, power, effect, brightness,
/// gesture count — one byte each, in that order.
pub const STATUS_PAYLOAD_LEN: usize = 6;

/// Byte offsets of the STATUS payload fields.
pub const STATUS_OFF_MODE: usize = 0;
pub const STATUS_OFF_BATTERY: usize = 1;
pub const STATUS_OFF_POWER: usize = 2;
pub const STATUS_OFF_EFFECT: usize = 3;
pub const STATUS_OFF_BRIGHTNESS: usize = 4;
pub const STATUS_OFF_GESTURE_COUNT: usize = 5;

// ── Bracelet BLE identifiers ──

/// GATT service UUID advertised by the bracelet.
pub const BRACELET_SERVICE_UUID: &str = "1cf4fab1-d642-4153-a6f2-bf40db8d6f73";

/// Advertised device name. Scanning filters on the name — UUID filtering
/// proved unreliable on several Android BLE stacks, and bridges inherit
/// the same workaround.
pub const BRACELET_DEVICE_NAME: &str = "Color Matching Bracelet";

// ── Defaults ──

/// Brightness the strip boots with (full).
pub const DEFAULT_BRIGHTNESS: u8 = 255;

/// Consecutive transport write failures before the session declares
/// the link lost.
pub const WRITE_FAILURE_THRESHOLD: u32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_marker_is_question_mark() {
        assert_eq!(START_MARKER, b'?');
    }

    #[test]
    fn frame_overhead_accounts_for_all_framing_bytes() {
        // start + type + length + checksum
        assert_eq!(FRAME_OVERHEAD, 4);
    }

    #[test]
    fn max_payload_fits_length_byte() {
        assert_eq!(MAX_PAYLOAD_LEN, u8::MAX as usize);
    }

    #[test]
    fn mode_extra_leaves_room_for_mode_and_length() {
        assert_eq!(MAX_MODE_EXTRA_LEN, MAX_PAYLOAD_LEN - 2);
    }

    #[test]
    fn status_offsets_cover_payload_exactly() {
        let offsets = [
            STATUS_OFF_MODE,
            STATUS_OFF_BATTERY,
            STATUS_OFF_POWER,
            STATUS_OFF_EFFECT,
            STATUS_OFF_BRIGHTNESS,
            STATUS_OFF_GESTURE_COUNT,
        ];
        for (i, off) in offsets.iter().enumerate() {
            assert_eq!(*off, i, "STATUS field {i} at unexpected offset");
        }
        assert_eq!(offsets.len(), STATUS_PAYLOAD_LEN);
    }

    #[test]
    fn service_uuid_well_formed() {
        let parts: Vec<&str> = BRACELET_SERVICE_UUID.split('-').collect();
        assert_eq!(parts.len(), 5);
        let lens: Vec<usize> = parts.iter().map(|p| p.len()).collect();
        assert_eq!(lens, vec![8, 4, 4, 4, 12]);
        assert!(
            BRACELET_SERVICE_UUID
                .chars()
                .all(|c| c.is_ascii_hexdigit() || c == '-')
        );
    }
}
