//! `monitor` subcommand — watch bracelet state, reconnecting until Ctrl+C.

use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::{Duration, Instant};

use super::{BraceletEvent, BraceletState, BridgeSession, Config, LinkState, RescanPacer, Result, RUNNING};

/// Poll granularity for shutdown and backoff checks.
const TICK: Duration = Duration::from_millis(200);

fn running() -> bool {
    RUNNING.load(Ordering::SeqCst)
}

fn state_line(state: &BraceletState) -> String {
    let battery = match state.battery_percentage {
        Some(pct) => format!("{pct}%"),
        None => "?".into(),
    };
    format!(
        "mode={} power={} brightness={} effect={} battery={battery} gestures={}",
        state.mode,
        if state.power_on { "on" } else { "off" },
        state.brightness,
        state.current_effect,
        state.gesture_count,
    )
}

/// Pump events for one connected session until the link drops or Ctrl+C.
fn watch(config: &Config, bridge: &BridgeSession) {
    let poll_interval = Duration::from_secs(config.status_poll_secs);
    let mut next_poll = Instant::now();

    while running() {
        if Instant::now() >= next_poll {
            if bridge.session().send_status_request().is_err() {
                // The session flags the link loss itself after repeated
                // failures; just stop polling early.
                log::debug!("status poll failed, waiting for link verdict");
            }
            next_poll = Instant::now() + poll_interval;
        }

        match bridge.events().recv_timeout(TICK) {
            Ok(BraceletEvent::StateChanged(state)) => println!("{}", state_line(&state)),
            Ok(BraceletEvent::LinkChanged(LinkState::Disconnected)) => return,
            Ok(BraceletEvent::LinkChanged(link)) => println!("link {link}"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

pub fn cmd_monitor(config: &Config, addr: &str) -> Result<()> {
    let mut pacer = RescanPacer::new(config.rescan_config());
    println!("Watching bracelet via {addr} (Ctrl+C to stop)");

    while running() {
        if !pacer.should_attempt() {
            thread::sleep(pacer.delay_remaining().min(TICK));
            continue;
        }

        match BridgeSession::open(addr) {
            Ok(bridge) => {
                pacer.record_success();
                println!("connected");
                watch(config, &bridge);
                bridge.close();
                if running() {
                    println!("link lost, rescanning");
                    pacer.record_failure();
                }
            }
            Err(e) => {
                pacer.record_failure();
                log::warn!(
                    "connect failed: {e} (attempt {}, retry in {:.1}s)",
                    pacer.failures(),
                    pacer.current_delay().as_secs_f64()
                );
            }
        }
    }

    println!("stopped");
    Ok(())
}
