//! `power`, `brightness` and `color` subcommands — direct LED strip control.

use braceletctl_lib::BraceletError;

use super::connect::with_session;
use super::{Config, Result, color};

pub fn cmd_power(addr: &str, state: &str) -> Result<()> {
    let on = match state.trim().to_lowercase().as_str() {
        "on" => true,
        "off" => false,
        other => {
            return Err(BraceletError::Config(format!(
                "expected 'on' or 'off', got '{other}'"
            )));
        }
    };
    with_session(addr, |session| session.send_power(on))?;
    println!("Power {}", if on { "on" } else { "off" });
    Ok(())
}

pub fn cmd_brightness(addr: &str, level: u8) -> Result<()> {
    with_session(addr, |session| session.send_brightness(level))?;
    println!("Brightness {level}");
    Ok(())
}

/// Paint the whole strip. Falls back to the configured default color when
/// no argument is given.
pub fn cmd_color(config: &Config, addr: &str, spec: Option<&str>) -> Result<()> {
    let spec = spec.unwrap_or(&config.default_color);
    let rgb = color::parse_color(spec)?;
    with_session(addr, |session| session.send_color(rgb))?;
    println!("Color {}", color::format_color(rgb));
    Ok(())
}
