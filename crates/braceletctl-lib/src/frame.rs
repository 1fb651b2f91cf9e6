//! Frame codec — wire framing, checksum validation.
//!
//! One frame on the wire:
//!
//! ```text
//! +------+------+-----+--------------+----------+
//! | 0x3F | type | len | payload[len] | checksum |
//! +------+------+-----+--------------+----------+
//! ```
//!
//! The checksum is the XOR fold of every preceding byte (start marker, type,
//! length and payload). Encoding and decoding are pure transforms; decode
//! failures are per-frame and never fatal to the session — callers count
//! them and discard the buffer.

use std::fmt;

use crate::protocol::{FRAME_OVERHEAD, MAX_PAYLOAD_LEN, START_MARKER};
use crate::types::MessageType;

/// One validated wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message_type: MessageType,
    pub payload: Vec<u8>,
}

/// Framing errors. All recoverable: log, count, drop the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer shorter than the minimal frame (start, type, length, checksum).
    TooShort { len: usize },
    /// First byte is not the start marker; the whole buffer is dropped,
    /// no partial recovery is attempted.
    BadStart { byte: u8 },
    /// The type byte maps to no known message type.
    UnknownType { code: u8 },
    /// Buffer length disagrees with the declared payload length.
    TruncatedPayload { expected: usize, actual: usize },
    /// Trailing checksum byte does not match the XOR fold.
    ChecksumMismatch { expected: u8, actual: u8 },
    /// Encode-side contract violation: payload longer than the length
    /// byte can describe.
    PayloadTooLarge { len: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::TooShort { len } => {
                write!(f, "frame too short: {len} bytes, need at least {FRAME_OVERHEAD}")
            }
            FrameError::BadStart { byte } => {
                write!(f, "bad start marker: 0x{byte:02X}, expected 0x{START_MARKER:02X}")
            }
            FrameError::UnknownType { code } => write!(f, "unknown message type code {code}"),
            FrameError::TruncatedPayload { expected, actual } => {
                write!(f, "truncated payload: frame declares {expected} bytes, buffer has {actual}")
            }
            FrameError::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: computed 0x{expected:02X}, frame carries 0x{actual:02X}")
            }
            FrameError::PayloadTooLarge { len } => {
                write!(f, "payload too large: {len} bytes, limit {MAX_PAYLOAD_LEN}")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// XOR fold over a byte slice.
fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Encode a frame for transmission.
///
/// Rejects payloads longer than [`MAX_PAYLOAD_LEN`] before building any
/// bytes — the length field is a single byte and silent truncation would
/// corrupt the checksum contract.
pub fn encode(message_type: MessageType, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge { len: payload.len() });
    }
    let mut buf = Vec::with_capacity(FRAME_OVERHEAD + payload.len());
    buf.push(START_MARKER);
    buf.push(message_type.code());
    buf.push(payload.len() as u8);
    buf.extend_from_slice(payload);
    buf.push(checksum(&buf));
    Ok(buf)
}

/// Decode and validate one frame from a raw notify buffer.
///
/// The buffer must hold exactly one frame — the bracelet delivers one frame
/// per notification and this layer does not reassemble split or coalesced
/// buffers. Validation order: size, start marker, type, declared length,
/// checksum.
pub fn decode(raw: &[u8]) -> Result<Frame, FrameError> {
    if raw.len() < FRAME_OVERHEAD {
        return Err(FrameError::TooShort { len: raw.len() });
    }
    if raw[0] != START_MARKER {
        return Err(FrameError::BadStart { byte: raw[0] });
    }
    let message_type =
        MessageType::from_code(raw[1]).ok_or(FrameError::UnknownType { code: raw[1] })?;
    let len = raw[2] as usize;
    let expected = FRAME_OVERHEAD + len;
    if raw.len() != expected {
        return Err(FrameError::TruncatedPayload {
            expected,
            actual: raw.len(),
        });
    }
    let body_end = expected - 1;
    let computed = checksum(&raw[..body_end]);
    if computed != raw[body_end] {
        return Err(FrameError::ChecksumMismatch {
            expected: computed,
            actual: raw[body_end],
        });
    }
    Ok(Frame {
        message_type,
        payload: raw[3..body_end].to_vec(),
    })
}
