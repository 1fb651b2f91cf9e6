//! `config` subcommand — show current configuration and file paths.

use super::{Config, ConfigOutput, Result, kv, kv_width};

pub fn cmd_config(config: &Config, json: bool, init: bool) -> Result<()> {
    if init {
        config.save()?;
    }
    let path = Config::path();
    let exists = path.as_ref().is_some_and(|p| p.exists());

    if json {
        let output = ConfigOutput {
            config_file: path.map(|p| p.display().to_string()),
            config_file_exists: exists,
            settings: config.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?);
        return Ok(());
    }

    let keys = [
        "Config file",
        "Bridge address",
        "Device name",
        "Status poll",
        "Reconnect",
        "Default color",
    ];
    let w = kv_width(&keys);
    match path {
        Some(p) => kv(
            "Config file",
            format!("{} ({})", p.display(), if exists { "exists" } else { "not created" }),
            w,
        ),
        None => kv("Config file", "unavailable (no config directory)", w),
    }
    kv("Bridge address", &config.bridge_addr, w);
    kv("Device name", &config.device_name, w);
    kv("Status poll", format!("{}s", config.status_poll_secs), w);
    kv(
        "Reconnect",
        format!(
            "{}ms → {}ms (x{})",
            config.reconnect_initial_ms, config.reconnect_max_ms, config.reconnect_multiplier
        ),
        w,
    );
    kv("Default color", &config.default_color, w);

    for warning in config.validate() {
        println!("warning: {warning}");
    }
    Ok(())
}
