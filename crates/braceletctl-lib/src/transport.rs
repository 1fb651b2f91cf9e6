//! Transport boundary — fire-and-forget byte delivery to the bracelet.
//!
//! The protocol layer never talks BLE itself. It writes opaque frame
//! buffers through [`Transport`] and receives inbound buffers from whatever
//! reader the transport provides. The shipped implementation is a TCP
//! client for a BLE-serial bridge; tests use [`mock::MockTransport`].
//!
//! Inbound buffers are assumed to carry exactly one frame each, matching
//! the bracelet's one-frame-per-notification behavior. A bridge that splits
//! or coalesces frames is out of contract — the codec will reject such
//! buffers and the session will count and drop them.

use std::fmt;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;

use crate::protocol::{FRAME_OVERHEAD, MAX_PAYLOAD_LEN};

// ── Error type ──

/// Transport failures. Surfaced as results, never fatal to the process;
/// the session treats repeated write failures as a link-loss trigger.
#[derive(Debug)]
pub enum TransportError {
    ConnectFailed(String),
    WriteFailed(String),
    ReadFailed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectFailed(e) => write!(f, "connect failed: {e}"),
            TransportError::WriteFailed(e) => write!(f, "write failed: {e}"),
            TransportError::ReadFailed(e) => write!(f, "read failed: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

// ── Trait ──

/// Outbound half of the link. One buffer per call, fire-and-forget:
/// a send either reaches the transport or fails synchronously — there is
/// no acknowledgment wait at this layer.
pub trait Transport {
    fn send(&self, frame: &[u8]) -> Result<()>;

    /// Human-readable peer description for logging.
    fn peer(&self) -> String;
}

// ── TCP bridge client ──

/// Largest buffer one notification can carry.
const READ_BUF_LEN: usize = FRAME_OVERHEAD + MAX_PAYLOAD_LEN;

/// TCP client for a BLE-serial bridge that forwards raw frames to and from
/// the bracelet.
pub struct TcpTransport {
    stream: Mutex<TcpStream>,
    peer: String,
}

impl TcpTransport {
    /// Connect to the bridge, with a per-address timeout.
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let resolved = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::ConnectFailed(format!("{addr}: {e}")))?
            .next()
            .ok_or_else(|| {
                TransportError::ConnectFailed(format!("{addr}: no addresses resolved"))
            })?;
        let stream = TcpStream::connect_timeout(&resolved, timeout)
            .map_err(|e| TransportError::ConnectFailed(format!("{addr}: {e}")))?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::ConnectFailed(format!("set_nodelay: {e}")))?;
        Ok(TcpTransport {
            stream: Mutex::new(stream),
            peer: addr.to_string(),
        })
    }

    /// Clone the stream for the inbound reader loop.
    pub fn reader(&self) -> Result<TcpReader> {
        let stream = self
            .stream
            .lock()
            .unwrap()
            .try_clone()
            .map_err(|e| TransportError::ReadFailed(format!("clone stream: {e}")))?;
        Ok(TcpReader { stream })
    }

    /// Shut the connection down, unblocking any reader.
    pub fn shutdown(&self) {
        let _ = self.stream.lock().unwrap().shutdown(Shutdown::Both);
    }
}

impl Transport for TcpTransport {
    fn send(&self, frame: &[u8]) -> Result<()> {
        let mut stream = self.stream.lock().unwrap();
        stream
            .write_all(frame)
            .and_then(|()| stream.flush())
            .map_err(|e| TransportError::WriteFailed(format!("{}: {e}", self.peer)))
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}

/// Inbound half of the TCP bridge link.
pub struct TcpReader {
    stream: TcpStream,
}

impl TcpReader {
    /// Deliver inbound buffers to `on_buffer` until the peer closes the
    /// connection (clean return) or the read fails.
    ///
    /// Each successful read is handed over as one notification buffer.
    pub fn run(mut self, mut on_buffer: impl FnMut(&[u8])) -> Result<()> {
        let mut buf = [0u8; READ_BUF_LEN];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => on_buffer(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::ReadFailed(e.to_string())),
            }
        }
    }
}

// ── Mock transport for testing ──

/// In-memory transport for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records every sent frame; sends can be failure-injected.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        /// Frames handed to `send`, in order. Failed sends are not recorded.
        pub sent: Mutex<Vec<Vec<u8>>>,
        /// When true, every `send` fails.
        pub fail_sends: AtomicBool,
    }

    impl MockTransport {
        pub fn new() -> Self {
            MockTransport::default()
        }

        /// Copy of all frames sent so far.
        pub fn sent_frames(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }

        /// Number of frames sent so far.
        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        /// Toggle failure injection for subsequent sends.
        pub fn set_fail_sends(&self, fail: bool) {
            self.fail_sends.store(fail, Ordering::SeqCst);
        }
    }

    impl Transport for MockTransport {
        fn send(&self, frame: &[u8]) -> Result<()> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(TransportError::WriteFailed(
                    "mock: send failure injected".into(),
                ));
            }
            self.sent.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        fn peer(&self) -> String {
            "mock://bracelet".into()
        }
    }
}
