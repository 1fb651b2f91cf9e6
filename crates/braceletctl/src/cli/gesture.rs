//! `calibrate` and `gesture` subcommands — motion features.

use braceletctl_lib::BraceletError;

use super::connect::with_session;
use super::{GestureAction, LedStripEffectType, Result};

pub fn cmd_calibrate(addr: &str) -> Result<()> {
    with_session(addr, |session| session.send_calibrate())?;
    println!("Calibration started — keep the bracelet still");
    Ok(())
}

pub fn cmd_gesture(addr: &str, action: GestureAction) -> Result<()> {
    match action {
        GestureAction::Add { effect } => {
            let kind: LedStripEffectType = effect.parse().map_err(BraceletError::Config)?;
            with_session(addr, |session| session.send_add_gesture(kind))?;
            println!("Recording gesture for effect {kind} — move the bracelet now");
        }
        GestureAction::Remove => {
            with_session(addr, |session| session.send_remove_gesture())?;
            println!("Last recorded gesture removed");
        }
    }
    Ok(())
}
