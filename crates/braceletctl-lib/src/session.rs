//! Connection/session supervisor — link lifecycle, send gating, inbound
//! serialization.
//!
//! One session per process. The supervisor owns the state mirror for the
//! session's lifetime; collaborators read it through [`current_state`]
//! snapshots, never through a shared reference, so a reconnect can never
//! leave them aliasing a stale record.
//!
//! Outbound commands are gated on [`LinkState::ServicesReady`] — before the
//! write characteristic is resolved a send fails with
//! [`SessionError::NotReady`] instead of queuing silently. Inbound
//! notifications are serialized: frame N+1 is not decoded before frame N's
//! dispatch finished.
//!
//! [`current_state`]: BraceletSession::current_state

use std::fmt;
use std::sync::Mutex;
use std::sync::mpsc::Receiver;

use serde::Serialize;

use crate::command::{self, CommandRequest};
use crate::dispatch::{self, DispatchError};
use crate::frame::{self, FrameError};
use crate::protocol::WRITE_FAILURE_THRESHOLD;
use crate::state::{BraceletEvent, BraceletState, EventBus, StateStore};
use crate::transport::{Transport, TransportError};
use crate::types::{BraceletMode, LedStripEffectType};

// ── Link state machine ──

/// Link lifecycle: `Disconnected → Connecting → Connected → ServicesReady`,
/// looping back to `Disconnected` on link loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    /// Write/notify characteristics resolved; sends are permitted.
    ServicesReady,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::ServicesReady => "ready",
        };
        write!(f, "{name}")
    }
}

// ── Error type ──

/// Errors surfaced to callers of the session's send methods.
#[derive(Debug)]
pub enum SessionError {
    /// Send attempted before the link reached `ServicesReady`.
    NotReady(LinkState),
    /// The transport rejected the write.
    Transport(TransportError),
    /// Command encoding failed (caller contract violation).
    Frame(FrameError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotReady(state) => {
                write!(f, "link not ready for commands (currently {state})")
            }
            SessionError::Transport(e) => write!(f, "{e}"),
            SessionError::Frame(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Transport(e) => Some(e),
            SessionError::Frame(e) => Some(e),
            SessionError::NotReady(_) => None,
        }
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        SessionError::Transport(e)
    }
}

impl From<FrameError> for SessionError {
    fn from(e: FrameError) -> Self {
        SessionError::Frame(e)
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

// ── Frame statistics ──

/// Per-session counters for dropped inbound frames. Framing and semantic
/// errors are never fatal — they land here and the buffer is discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub frames_ok: u64,
    pub too_short: u64,
    pub bad_start: u64,
    pub unknown_type: u64,
    pub truncated_payload: u64,
    pub checksum_mismatch: u64,
    pub malformed_status: u64,
}

impl FrameStats {
    /// Total dropped frames across all error kinds.
    pub fn dropped(&self) -> u64 {
        self.too_short
            + self.bad_start
            + self.unknown_type
            + self.truncated_payload
            + self.checksum_mismatch
            + self.malformed_status
    }

    fn note_frame_error(&mut self, e: &FrameError) {
        match e {
            FrameError::TooShort { .. } => self.too_short += 1,
            FrameError::BadStart { .. } => self.bad_start += 1,
            FrameError::UnknownType { .. } => self.unknown_type += 1,
            FrameError::TruncatedPayload { .. } => self.truncated_payload += 1,
            FrameError::ChecksumMismatch { .. } => self.checksum_mismatch += 1,
            // Encode-side error; decode never produces it.
            FrameError::PayloadTooLarge { .. } => {}
        }
    }
}

// ── Session ──

struct LinkInner {
    state: LinkState,
    write_failures: u32,
}

/// The session supervisor. Owns the state mirror and the transport handle
/// for one connection lifetime.
pub struct BraceletSession<T: Transport> {
    transport: T,
    store: StateStore,
    bus: EventBus,
    link: Mutex<LinkInner>,
    /// Held across decode + dispatch so inbound frames are handled strictly
    /// in arrival order.
    inbound: Mutex<FrameStats>,
}

impl<T: Transport> BraceletSession<T> {
    /// Build a session around a transport. Starts `Disconnected` with a
    /// default state mirror.
    pub fn new(transport: T) -> Self {
        BraceletSession {
            transport,
            store: StateStore::new(),
            bus: EventBus::new(),
            link: Mutex::new(LinkInner {
                state: LinkState::Disconnected,
                write_failures: 0,
            }),
            inbound: Mutex::new(FrameStats::default()),
        }
    }

    /// The underlying transport (e.g. for shutdown on exit).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ── Accessors ──

    /// Snapshot of the mirrored bracelet state.
    pub fn current_state(&self) -> BraceletState {
        self.store.snapshot()
    }

    /// Current link state.
    pub fn link_state(&self) -> LinkState {
        self.link.lock().unwrap().state
    }

    /// Whether the link is established (`Connected` or `ServicesReady`).
    pub fn is_connected(&self) -> bool {
        matches!(
            self.link_state(),
            LinkState::Connected | LinkState::ServicesReady
        )
    }

    /// Subscribe to state-change and link-state-change events.
    pub fn subscribe(&self) -> Receiver<BraceletEvent> {
        self.bus.subscribe()
    }

    /// Counters for inbound frames handled and dropped this session.
    pub fn frame_stats(&self) -> FrameStats {
        *self.inbound.lock().unwrap()
    }

    // ── Link lifecycle ──

    /// `Disconnected → Connecting`: discovery/connect started.
    pub fn begin_connect(&self) {
        self.transition(LinkState::Disconnected, LinkState::Connecting);
    }

    /// `Connecting → Connected`: the link is up, characteristics not yet
    /// resolved.
    pub fn link_established(&self) {
        self.transition(LinkState::Connecting, LinkState::Connected);
    }

    /// `Connected → ServicesReady`: write/notify characteristics located;
    /// commands may flow.
    pub fn services_ready(&self) {
        self.transition(LinkState::Connected, LinkState::ServicesReady);
    }

    fn transition(&self, from: LinkState, to: LinkState) {
        {
            let mut link = self.link.lock().unwrap();
            if link.state != from {
                log::warn!("ignoring {from}→{to} transition while {}", link.state);
                return;
            }
            link.state = to;
        }
        log::debug!("link {from} → {to}");
        self.bus.publish(BraceletEvent::LinkChanged(to));
    }

    /// Link lost or explicitly torn down. Resets the state mirror and the
    /// failure counters atomically, then signals `Disconnected` — rescan is
    /// the external scanning collaborator's job.
    pub fn link_lost(&self) {
        {
            let mut link = self.link.lock().unwrap();
            if link.state == LinkState::Disconnected {
                return;
            }
            link.state = LinkState::Disconnected;
            link.write_failures = 0;
            // Reset while still holding the link lock: an in-flight send
            // that raced us re-checks the link state before applying its
            // optimistic patch, so no stale state survives the teardown.
            self.store.reset(&self.bus);
        }
        log::info!("link lost, state reset");
        self.bus.publish(BraceletEvent::LinkChanged(LinkState::Disconnected));
    }

    // ── Outbound commands ──

    /// Request a fresh STATUS report.
    pub fn send_status_request(&self) -> Result<()> {
        self.submit(command::status_request()?)
    }

    /// Switch mode, optionally carrying extra data.
    pub fn send_mode_change(&self, mode: BraceletMode, extra: &[u8]) -> Result<()> {
        self.submit(command::mode_change(mode, extra)?)
    }

    /// Turn the LED strip on or off.
    pub fn send_power(&self, on: bool) -> Result<()> {
        self.submit(command::power(on)?)
    }

    /// Set strip brightness (0–255).
    pub fn send_brightness(&self, level: u8) -> Result<()> {
        self.submit(command::brightness(level)?)
    }

    /// Start an effect, or stop the running one with
    /// [`LedStripEffectType::None`].
    pub fn send_effect(&self, kind: LedStripEffectType) -> Result<()> {
        self.submit(command::effect(kind)?)
    }

    /// Paint the whole strip one 24-bit RGB color.
    pub fn send_color(&self, rgb: u32) -> Result<()> {
        self.submit(command::color(rgb)?)
    }

    /// Start motion-sensor calibration.
    pub fn send_calibrate(&self) -> Result<()> {
        self.submit(command::calibrate()?)
    }

    /// Record a new gesture bound to an effect.
    pub fn send_add_gesture(&self, effect: LedStripEffectType) -> Result<()> {
        self.submit(command::add_gesture(effect)?)
    }

    /// Remove the most recently recorded gesture.
    pub fn send_remove_gesture(&self) -> Result<()> {
        self.submit(command::remove_gesture()?)
    }

    /// Gate, write, then apply the optimistic patch.
    ///
    /// The patch is applied only after the transport accepted the write —
    /// never for a frame that didn't leave the host — and only if the link
    /// is still ready, so a teardown that raced the write wins.
    fn submit(&self, request: CommandRequest) -> Result<()> {
        {
            let link = self.link.lock().unwrap();
            if link.state != LinkState::ServicesReady {
                return Err(SessionError::NotReady(link.state));
            }
        }

        match self.transport.send(&request.frame) {
            Ok(()) => {
                let link = self.link.lock().unwrap();
                if link.state == LinkState::ServicesReady {
                    self.store.apply(&request.patch, &self.bus);
                }
                drop(link);
                self.note_write_success();
                Ok(())
            }
            Err(e) => {
                log::warn!("transport write failed: {e}");
                self.note_write_failure();
                Err(e.into())
            }
        }
    }

    fn note_write_success(&self) {
        self.link.lock().unwrap().write_failures = 0;
    }

    /// Repeated transport failure is a link-loss trigger.
    fn note_write_failure(&self) {
        let lost = {
            let mut link = self.link.lock().unwrap();
            link.write_failures += 1;
            link.write_failures >= WRITE_FAILURE_THRESHOLD
                && link.state != LinkState::Disconnected
        };
        if lost {
            log::warn!("{WRITE_FAILURE_THRESHOLD} consecutive write failures, declaring link lost");
            self.link_lost();
        }
    }

    // ── Inbound notifications ──

    /// Handle one raw notify buffer from the transport.
    ///
    /// Decode and dispatch run under a single lock: the next buffer is not
    /// looked at before this one's dispatch completed. All failures are
    /// counted and the buffer is dropped; the link stays open.
    pub fn handle_notify(&self, raw: &[u8]) {
        let mut stats = self.inbound.lock().unwrap();
        let frame = match frame::decode(raw) {
            Ok(frame) => frame,
            Err(e) => {
                stats.note_frame_error(&e);
                log::warn!("dropping inbound buffer ({} bytes): {e}", raw.len());
                return;
            }
        };
        match dispatch::dispatch(&frame, &self.store, &self.bus) {
            Ok(_) => stats.frames_ok += 1,
            Err(e @ DispatchError::MalformedStatus(_)) => {
                stats.malformed_status += 1;
                log::warn!("dropping {} frame: {e}", frame.message_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode;
    use crate::transport::mock::MockTransport;
    use crate::types::MessageType;

    fn ready_session() -> BraceletSession<MockTransport> {
        let session = BraceletSession::new(MockTransport::new());
        session.begin_connect();
        session.link_established();
        session.services_ready();
        session
    }

    // ── Link state machine ──

    #[test]
    fn new_session_is_disconnected() {
        let session = BraceletSession::new(MockTransport::new());
        assert_eq!(session.link_state(), LinkState::Disconnected);
        assert!(!session.is_connected());
        assert_eq!(session.current_state(), BraceletState::default());
    }

    #[test]
    fn full_lifecycle_transitions() {
        let session = BraceletSession::new(MockTransport::new());
        session.begin_connect();
        assert_eq!(session.link_state(), LinkState::Connecting);
        assert!(!session.is_connected());

        session.link_established();
        assert_eq!(session.link_state(), LinkState::Connected);
        assert!(session.is_connected());

        session.services_ready();
        assert_eq!(session.link_state(), LinkState::ServicesReady);
        assert!(session.is_connected());

        session.link_lost();
        assert_eq!(session.link_state(), LinkState::Disconnected);
        assert!(!session.is_connected());
    }

    #[test]
    fn out_of_order_transitions_ignored() {
        let session = BraceletSession::new(MockTransport::new());
        session.services_ready();
        assert_eq!(session.link_state(), LinkState::Disconnected);
        session.link_established();
        assert_eq!(session.link_state(), LinkState::Disconnected);
    }

    #[test]
    fn link_lost_while_disconnected_is_noop() {
        let session = BraceletSession::new(MockTransport::new());
        let rx = session.subscribe();
        session.link_lost();
        assert!(rx.try_recv().is_err(), "no events for a no-op teardown");
    }

    #[test]
    fn transitions_publish_link_events() {
        let session = BraceletSession::new(MockTransport::new());
        let rx = session.subscribe();
        session.begin_connect();
        session.link_established();
        session.services_ready();

        let states: Vec<LinkState> = rx
            .try_iter()
            .filter_map(|e| match e {
                BraceletEvent::LinkChanged(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                LinkState::Connecting,
                LinkState::Connected,
                LinkState::ServicesReady
            ]
        );
    }

    // ── Send gating (scenario: send before ready) ──

    #[test]
    fn send_while_disconnected_is_not_ready() {
        let session = BraceletSession::new(MockTransport::new());
        let err = session.send_power(true).unwrap_err();
        assert!(matches!(err, SessionError::NotReady(LinkState::Disconnected)));
        assert_eq!(session.transport().sent_count(), 0);
    }

    #[test]
    fn send_while_connecting_is_not_ready_and_writes_nothing() {
        let session = BraceletSession::new(MockTransport::new());
        session.begin_connect();
        let before = session.current_state();

        let err = session.send_power(true).unwrap_err();
        assert!(matches!(err, SessionError::NotReady(LinkState::Connecting)));
        assert_eq!(session.transport().sent_count(), 0, "no transport write");
        assert_eq!(session.current_state(), before, "state unchanged");
    }

    #[test]
    fn send_while_connected_but_services_unresolved_is_not_ready() {
        let session = BraceletSession::new(MockTransport::new());
        session.begin_connect();
        session.link_established();
        let err = session.send_brightness(10).unwrap_err();
        assert!(matches!(err, SessionError::NotReady(LinkState::Connected)));
    }

    // ── Optimistic updates ──

    #[test]
    fn successful_send_applies_patch() {
        let session = ready_session();
        session.send_power(true).unwrap();
        assert!(session.current_state().power_on);
        assert_eq!(session.transport().sent_count(), 1);
    }

    #[test]
    fn failed_send_applies_no_patch() {
        let session = ready_session();
        session.transport().set_fail_sends(true);
        let err = session.send_power(true).unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert!(!session.current_state().power_on);
    }

    #[test]
    fn send_effect_updates_mode_and_effect() {
        let session = ready_session();
        session.send_effect(LedStripEffectType::Rainbow).unwrap();
        let state = session.current_state();
        assert_eq!(state.mode, BraceletMode::Effect);
        assert_eq!(state.current_effect, LedStripEffectType::Rainbow);
        assert!(state.is_consistent());
    }

    #[test]
    fn send_effect_none_reverts_to_normal() {
        let session = ready_session();
        session.send_effect(LedStripEffectType::Rainbow).unwrap();
        session.send_effect(LedStripEffectType::None).unwrap();
        let state = session.current_state();
        assert_eq!(state.mode, BraceletMode::Normal);
        assert_eq!(state.current_effect, LedStripEffectType::None);
    }

    #[test]
    fn send_color_leaves_mirror_untouched() {
        let session = ready_session();
        let before = session.current_state();
        session.send_color(0x00FF_8800).unwrap();
        assert_eq!(session.current_state(), before);
        assert_eq!(session.transport().sent_count(), 1);
    }

    #[test]
    fn send_mode_change_oversized_extra_is_frame_error() {
        let session = ready_session();
        let extra = vec![0u8; 300];
        let err = session
            .send_mode_change(BraceletMode::Effect, &extra)
            .unwrap_err();
        assert!(matches!(err, SessionError::Frame(_)));
        assert_eq!(session.transport().sent_count(), 0);
    }

    // ── Write failure escalation ──

    #[test]
    fn repeated_write_failures_drop_the_link() {
        let session = ready_session();
        session.transport().set_fail_sends(true);
        for _ in 0..WRITE_FAILURE_THRESHOLD {
            let _ = session.send_power(true);
        }
        assert_eq!(session.link_state(), LinkState::Disconnected);
        assert_eq!(session.current_state(), BraceletState::default());
    }

    #[test]
    fn write_success_resets_failure_counter() {
        let session = ready_session();
        // Two failures, then recovery — the counter must restart.
        session.transport().set_fail_sends(true);
        let _ = session.send_power(true);
        let _ = session.send_power(true);
        session.transport().set_fail_sends(false);
        session.send_power(true).unwrap();

        session.transport().set_fail_sends(true);
        let _ = session.send_power(true);
        let _ = session.send_power(true);
        assert_eq!(
            session.link_state(),
            LinkState::ServicesReady,
            "two failures after a success must not drop the link"
        );
    }

    // ── Inbound handling ──

    #[test]
    fn status_notify_replaces_state() {
        let session = ready_session();
        let frame = encode(MessageType::Status, &[1, 80, 1, 2, 200, 3]).unwrap();
        session.handle_notify(&frame);

        let state = session.current_state();
        assert_eq!(state.mode, BraceletMode::Effect);
        assert_eq!(state.battery_percentage, Some(80));
        assert!(state.power_on);
        assert_eq!(state.current_effect, LedStripEffectType::Circle);
        assert_eq!(state.brightness, 200);
        assert_eq!(state.gesture_count, 3);
        assert_eq!(session.frame_stats().frames_ok, 1);
    }

    #[test]
    fn corrupted_notify_leaves_state_unchanged() {
        let session = ready_session();
        let good = encode(MessageType::Status, &[1, 80, 1, 2, 200, 3]).unwrap();
        session.handle_notify(&good);
        let before = session.current_state();

        let mut corrupted = good.clone();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        session.handle_notify(&corrupted);

        assert_eq!(session.current_state(), before);
        let stats = session.frame_stats();
        assert_eq!(stats.checksum_mismatch, 1);
        assert_eq!(stats.frames_ok, 1);
        assert!(session.is_connected(), "one bad frame never drops the link");
    }

    #[test]
    fn frame_errors_counted_by_kind() {
        let session = ready_session();
        session.handle_notify(&[0x3F, 1]); // too short
        session.handle_notify(&[0x00, 1, 0, 0x3E]); // bad start
        session.handle_notify(&[0x3F, 0, 0, 0x3F]); // retired type code
        session.handle_notify(&[0x3F, 1, 5, 0, 0]); // truncated
        let mut bad_checksum = encode(MessageType::Debug, b"x").unwrap();
        let last = bad_checksum.len() - 1;
        bad_checksum[last] ^= 1;
        session.handle_notify(&bad_checksum);

        let stats = session.frame_stats();
        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.bad_start, 1);
        assert_eq!(stats.unknown_type, 1);
        assert_eq!(stats.truncated_payload, 1);
        assert_eq!(stats.checksum_mismatch, 1);
        assert_eq!(stats.dropped(), 5);
        assert_eq!(stats.frames_ok, 0);
    }

    #[test]
    fn malformed_status_counted_and_state_retained() {
        let session = ready_session();
        let good = encode(MessageType::Status, &[1, 80, 1, 2, 200, 3]).unwrap();
        session.handle_notify(&good);
        let before = session.current_state();

        // Valid framing, impossible battery value.
        let bad = encode(MessageType::Status, &[1, 200, 1, 2, 200, 3]).unwrap();
        session.handle_notify(&bad);

        assert_eq!(session.current_state(), before);
        assert_eq!(session.frame_stats().malformed_status, 1);
    }

    // ── Authority ──

    #[test]
    fn status_replace_overrides_optimistic_patch() {
        let session = ready_session();
        session.send_brightness(10).unwrap();
        assert_eq!(session.current_state().brightness, 10);

        // Device reports a different brightness — it wins.
        let frame = encode(MessageType::Status, &[0, 90, 1, 0, 250, 0]).unwrap();
        session.handle_notify(&frame);
        assert_eq!(session.current_state().brightness, 250);
    }

    // ── Teardown (scenario: link lost with effect running) ──

    #[test]
    fn link_lost_resets_state_and_connectivity() {
        let session = ready_session();
        session.send_effect(LedStripEffectType::Rainbow).unwrap();
        assert_eq!(
            session.current_state().current_effect,
            LedStripEffectType::Rainbow
        );

        session.link_lost();
        let state = session.current_state();
        assert_eq!(state, BraceletState::default());
        assert_eq!(state.current_effect, LedStripEffectType::None);
        assert!(!session.is_connected());
    }

    #[test]
    fn link_lost_emits_reset_state_before_disconnect_event() {
        let session = ready_session();
        session.send_power(true).unwrap();
        let rx = session.subscribe();
        session.link_lost();

        let events: Vec<BraceletEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                BraceletEvent::StateChanged(BraceletState::default()),
                BraceletEvent::LinkChanged(LinkState::Disconnected),
            ],
            "state must be reset before disconnect is signaled"
        );
    }

    #[test]
    fn sends_after_link_lost_are_not_ready() {
        let session = ready_session();
        session.link_lost();
        assert!(matches!(
            session.send_status_request(),
            Err(SessionError::NotReady(LinkState::Disconnected))
        ));
    }
}
