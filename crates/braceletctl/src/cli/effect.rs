//! `effect` and `mode` subcommands.

use braceletctl_lib::BraceletError;

use super::connect::with_session;
use super::{BraceletMode, LedStripEffectType, Result};

pub fn cmd_effect(addr: &str, name: &str) -> Result<()> {
    let kind: LedStripEffectType = name.parse().map_err(BraceletError::Config)?;
    with_session(addr, |session| session.send_effect(kind))?;
    if kind == LedStripEffectType::None {
        println!("Effect stopped, back to normal mode");
    } else {
        println!("Effect {kind}");
    }
    Ok(())
}

pub fn cmd_mode(addr: &str, name: &str) -> Result<()> {
    let mode: BraceletMode = name.parse().map_err(BraceletError::Config)?;
    with_session(addr, |session| session.send_mode_change(mode, &[]))?;
    println!("Mode {mode}");
    Ok(())
}
