//! `status` subcommand — query and show the bracelet's current state.

use super::{BridgeSession, Result, StatusOutput, kv, kv_width};

pub fn cmd_status(addr: &str, json: bool) -> Result<()> {
    let bridge = BridgeSession::open(addr)?;
    let state = bridge.refresh_state()?;
    let link = bridge.session().link_state();
    let stats = bridge.session().frame_stats();
    bridge.close();

    if json {
        let output = StatusOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            bridge: addr.to_string(),
            link,
            state,
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?);
        return Ok(());
    }

    let keys = [
        "Bridge",
        "Link",
        "Mode",
        "Battery",
        "Power",
        "Brightness",
        "Effect",
        "Gestures",
        "Frames",
    ];
    let w = kv_width(&keys);
    kv("Bridge", addr, w);
    kv("Link", link, w);
    kv("Mode", state.mode, w);
    match state.battery_percentage {
        Some(pct) => kv("Battery", format!("{pct}%"), w),
        None => kv("Battery", "unknown (no STATUS yet)", w),
    }
    kv("Power", if state.power_on { "on" } else { "off" }, w);
    kv("Brightness", state.brightness, w);
    kv("Effect", state.current_effect, w);
    kv("Gestures", state.gesture_count, w);
    kv(
        "Frames",
        format!("{} ok, {} dropped", stats.frames_ok, stats.dropped()),
        w,
    );
    Ok(())
}
