//! Unified error type for the braceletctl-lib crate.
//!
//! [`BraceletError`] wraps module-specific errors (`FrameError`,
//! `DispatchError`, `TransportError`, `SessionError`) and domain-specific
//! error kinds (`Config`, `Color`). `From` impls allow `?` to propagate
//! across module boundaries seamlessly.

use std::fmt;

use crate::dispatch::DispatchError;
use crate::frame::FrameError;
use crate::session::SessionError;
use crate::transport::TransportError;

/// Unified error type for braceletctl-lib operations.
#[derive(Debug)]
pub enum BraceletError {
    /// Wire framing error (encode contract or decode validation).
    Frame(FrameError),
    /// Semantic error in a validated frame.
    Dispatch(DispatchError),
    /// Transport connect/read/write error.
    Transport(TransportError),
    /// Session gating or send error.
    Session(SessionError),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration parse or validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
}

impl fmt::Display for BraceletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BraceletError::Frame(e) => write!(f, "{e}"),
            BraceletError::Dispatch(e) => write!(f, "{e}"),
            BraceletError::Transport(e) => write!(f, "{e}"),
            BraceletError::Session(e) => write!(f, "{e}"),
            BraceletError::Io(e) => write!(f, "I/O error: {e}"),
            BraceletError::Config(e) => write!(f, "Config error: {e}"),
            BraceletError::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for BraceletError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BraceletError::Frame(e) => Some(e),
            BraceletError::Dispatch(e) => Some(e),
            BraceletError::Transport(e) => Some(e),
            BraceletError::Session(e) => Some(e),
            BraceletError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FrameError> for BraceletError {
    fn from(e: FrameError) -> Self {
        BraceletError::Frame(e)
    }
}

impl From<DispatchError> for BraceletError {
    fn from(e: DispatchError) -> Self {
        BraceletError::Dispatch(e)
    }
}

impl From<TransportError> for BraceletError {
    fn from(e: TransportError) -> Self {
        BraceletError::Transport(e)
    }
}

impl From<SessionError> for BraceletError {
    fn from(e: SessionError) -> Self {
        BraceletError::Session(e)
    }
}

impl From<std::io::Error> for BraceletError {
    fn from(e: std::io::Error) -> Self {
        BraceletError::Io(e)
    }
}

/// Crate-level Result alias using [`BraceletError`].
pub type Result<T> = std::result::Result<T, BraceletError>;
