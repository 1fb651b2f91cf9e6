//! braceletctl CLI — control the Color Matching Bracelet through a
//! BLE-serial bridge.

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

mod cli;

/// Shared shutdown flag — set by Ctrl+C handler.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Parser)]
#[command(
    name = "braceletctl",
    version,
    about = "Control the Color Matching Bracelet LED wearable"
)]
struct Args {
    /// Output as JSON (for status and config)
    #[arg(long, global = true)]
    json: bool,

    /// Bridge address override (host:port), takes precedence over config
    #[arg(long, global = true)]
    addr: Option<String>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let args = Args::parse();

    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::SeqCst);
    })
    .ok();

    if let Err(e) = cli::run(args.command, args.json, args.addr.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
