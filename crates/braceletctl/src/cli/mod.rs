//! CLI subcommands — bracelet state, LED control, gesture management.

mod config_cmd;
mod connect;
mod effect;
mod gesture;
mod monitor;
mod status;
mod strip;

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use braceletctl_lib::color;
pub(super) use braceletctl_lib::config::Config;
pub(super) use braceletctl_lib::error::Result;
pub(super) use braceletctl_lib::reconnect::RescanPacer;
pub(super) use braceletctl_lib::session::{FrameStats, LinkState};
pub(super) use braceletctl_lib::state::{BraceletEvent, BraceletState};
pub(super) use braceletctl_lib::types::{BraceletMode, LedStripEffectType};
pub(super) use connect::BridgeSession;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
pub(super) fn kv_width(keys: &[&str]) -> usize {
    keys.iter().map(|k| k.len()).max().unwrap_or(0) + PADDING
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{key:<width$}{value}", width = w);
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub bridge: String,
    pub link: LinkState,
    pub state: BraceletState,
    pub stats: FrameStats,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Subcommand)]
pub enum Command {
    /// Query and show the bracelet's current state
    Status,

    /// Turn the LED strip on or off
    Power {
        /// "on" or "off"
        state: String,
    },

    /// Set LED strip brightness
    Brightness {
        /// Brightness level (0-255)
        level: u8,
    },

    /// Paint the whole strip one color
    Color {
        /// Color as #RRGGBB or a name (default: from config)
        spec: Option<String>,
    },

    /// Start an LED strip effect, or "none" to stop it
    Effect {
        /// Effect name: none, rainbow, circle, fade, trail, compass, temperature
        name: String,
    },

    /// Switch the bracelet mode
    Mode {
        /// Mode name: normal, effect, gesture-effect, gesture, motion, motion-effect
        name: String,
    },

    /// Start motion-sensor calibration
    Calibrate,

    /// Manage recorded gestures
    Gesture {
        #[command(subcommand)]
        action: GestureAction,
    },

    /// Watch bracelet state, reconnecting until Ctrl+C
    Monitor,

    /// Show current configuration and file paths
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
pub enum GestureAction {
    /// Record a new gesture bound to an effect
    Add {
        /// Effect the gesture triggers
        effect: String,
    },
    /// Remove the most recently recorded gesture
    Remove,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

/// Effective bridge address: CLI override, else config.
fn bridge_addr(config: &Config, addr_override: Option<&str>) -> String {
    addr_override
        .map(str::to_string)
        .unwrap_or_else(|| config.bridge_addr.clone())
}

pub fn run(cmd: Command, json: bool, addr_override: Option<&str>) -> Result<()> {
    let config = Config::load();
    let addr = bridge_addr(&config, addr_override);

    match cmd {
        Command::Status => status::cmd_status(&addr, json),
        Command::Power { state } => {
            if json {
                warn_json_unsupported("power");
            }
            strip::cmd_power(&addr, &state)
        }
        Command::Brightness { level } => {
            if json {
                warn_json_unsupported("brightness");
            }
            strip::cmd_brightness(&addr, level)
        }
        Command::Color { spec } => {
            if json {
                warn_json_unsupported("color");
            }
            strip::cmd_color(&config, &addr, spec.as_deref())
        }
        Command::Effect { name } => {
            if json {
                warn_json_unsupported("effect");
            }
            effect::cmd_effect(&addr, &name)
        }
        Command::Mode { name } => {
            if json {
                warn_json_unsupported("mode");
            }
            effect::cmd_mode(&addr, &name)
        }
        Command::Calibrate => {
            if json {
                warn_json_unsupported("calibrate");
            }
            gesture::cmd_calibrate(&addr)
        }
        Command::Gesture { action } => {
            if json {
                warn_json_unsupported("gesture");
            }
            gesture::cmd_gesture(&addr, action)
        }
        Command::Monitor => {
            if json {
                warn_json_unsupported("monitor");
            }
            monitor::cmd_monitor(&config, &addr)
        }
        Command::Config { init } => config_cmd::cmd_config(&config, json, init),
    }
}
