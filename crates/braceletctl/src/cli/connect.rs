//! Shared bridge session bootstrap for CLI commands.
//!
//! Every device-touching subcommand goes through [`BridgeSession`]: connect
//! to the bridge, walk the session to `ServicesReady`, and pump inbound
//! notifications from a reader thread. The bridge owns BLE discovery and
//! characteristic setup, so the link is command-ready as soon as its TCP
//! port accepts.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use braceletctl_lib::BraceletError;
use braceletctl_lib::error::Result;
use braceletctl_lib::session::BraceletSession;
use braceletctl_lib::state::{BraceletEvent, BraceletState};
use braceletctl_lib::transport::{TcpTransport, Transport};

/// Per-address TCP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// How long [`BridgeSession::refresh_state`] waits for a STATUS report.
const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// A live session over the TCP bridge, with its inbound reader thread.
pub struct BridgeSession {
    session: Arc<BraceletSession<TcpTransport>>,
    events: Receiver<BraceletEvent>,
    reader: Option<JoinHandle<()>>,
}

impl BridgeSession {
    /// Connect to the bridge and bring the session to `ServicesReady`.
    pub fn open(addr: &str) -> Result<Self> {
        let transport =
            TcpTransport::connect(addr, CONNECT_TIMEOUT).map_err(BraceletError::from)?;
        log::debug!("bridge link up at {}", transport.peer());
        let session = Arc::new(BraceletSession::new(transport));

        session.begin_connect();
        session.link_established();
        session.services_ready();

        let events = session.subscribe();
        let reader = session.transport().reader().map_err(BraceletError::from)?;
        let pump = {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                if let Err(e) = reader.run(|buf| session.handle_notify(buf)) {
                    log::warn!("bridge read loop ended: {e}");
                }
                session.link_lost();
            })
        };

        Ok(BridgeSession {
            session,
            events,
            reader: Some(pump),
        })
    }

    pub fn session(&self) -> &BraceletSession<TcpTransport> {
        &self.session
    }

    /// Event stream subscribed before any command was sent.
    pub fn events(&self) -> &Receiver<BraceletEvent> {
        &self.events
    }

    /// Request a STATUS report and wait for the authoritative state.
    ///
    /// Falls back to the current mirror snapshot if the bracelet does not
    /// answer within the timeout — the caller still gets a coherent record,
    /// just a possibly stale one.
    pub fn refresh_state(&self) -> Result<BraceletState> {
        self.session
            .send_status_request()
            .map_err(BraceletError::from)?;

        let deadline = Instant::now() + STATUS_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(BraceletEvent::StateChanged(state)) => return Ok(state),
                Ok(BraceletEvent::LinkChanged(_)) => continue,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("no STATUS reply within {STATUS_TIMEOUT:?}, using last known state");
                    return Ok(self.session.current_state());
                }
            }
        }
    }

    /// Shut the bridge connection down and join the reader thread.
    pub fn close(mut self) {
        self.session.transport().shutdown();
        if let Some(pump) = self.reader.take() {
            let _ = pump.join();
        }
    }
}

/// Run one command against a fresh bridge session, then tear it down.
pub fn with_session<F>(addr: &str, f: F) -> Result<()>
where
    F: FnOnce(&BraceletSession<TcpTransport>) -> braceletctl_lib::session::Result<()>,
{
    let bridge = BridgeSession::open(addr)?;
    let result = f(bridge.session()).map_err(BraceletError::from);
    bridge.close();
    result
}
