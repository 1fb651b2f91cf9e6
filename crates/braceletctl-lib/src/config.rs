//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::BRACELET_DEVICE_NAME;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# braceletctl configuration — changes made outside the app may be overwritten.\n\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address of the BLE-serial bridge forwarding frames to the bracelet.
    #[serde(default = "default_bridge_addr")]
    pub bridge_addr: String,

    /// Advertised device name the bridge scans for.
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Seconds between periodic STATUS re-sync requests in `monitor`.
    #[serde(default = "default_status_poll_secs")]
    pub status_poll_secs: u64,

    /// Initial reconnect backoff delay in milliseconds.
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    /// Maximum reconnect backoff delay in milliseconds.
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,

    /// Reconnect backoff growth factor.
    #[serde(default = "default_reconnect_multiplier")]
    pub reconnect_multiplier: f64,

    /// Color applied by `color` when no argument is given (hex or name).
    #[serde(default = "default_color")]
    pub default_color: String,
}

fn default_bridge_addr() -> String {
    "127.0.0.1:7332".into()
}
fn default_device_name() -> String {
    BRACELET_DEVICE_NAME.into()
}
fn default_status_poll_secs() -> u64 {
    5
}
fn default_reconnect_initial_ms() -> u64 {
    1_000
}
fn default_reconnect_max_ms() -> u64 {
    30_000
}
fn default_reconnect_multiplier() -> f64 {
    2.0
}
fn default_color() -> String {
    "#FFFFFF".into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bridge_addr: default_bridge_addr(),
            device_name: default_device_name(),
            status_poll_secs: default_status_poll_secs(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            reconnect_multiplier: default_reconnect_multiplier(),
            default_color: default_color(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `bridge_addr` is empty or has no port.
    InvalidBridgeAddr(String),
    /// `device_name` is empty or whitespace-only.
    EmptyDeviceName,
    /// `status_poll_secs` is zero.
    ZeroPollInterval,
    /// Reconnect backoff values are inconsistent.
    InvalidBackoff(String),
    /// `default_color` could not be parsed.
    InvalidColor(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBridgeAddr(e) => write!(f, "Invalid bridge address: {e}"),
            ValidationError::EmptyDeviceName => write!(f, "Device name cannot be empty"),
            ValidationError::ZeroPollInterval => {
                write!(f, "Status poll interval must be at least 1 second")
            }
            ValidationError::InvalidBackoff(e) => write!(f, "Invalid reconnect backoff: {e}"),
            ValidationError::InvalidColor(e) => write!(f, "Invalid default color: {e}"),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("braceletctl"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from the default path, returning the config and any
    /// parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Load config from an arbitrary path, returning the config and any
    /// parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Save config to an arbitrary path atomically (write to temp file,
    /// then rename).
    ///
    /// A header comment is prepended to warn that manual edits may be
    /// overwritten.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Reconnect backoff settings as a [`RescanConfig`].
    pub fn rescan_config(&self) -> crate::reconnect::RescanConfig {
        crate::reconnect::RescanConfig {
            initial_delay: Duration::from_millis(self.reconnect_initial_ms),
            max_delay: Duration::from_millis(self.reconnect_max_ms),
            multiplier: self.reconnect_multiplier,
        }
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let addr = self.bridge_addr.trim();
        if addr.is_empty() {
            errors.push(ValidationError::InvalidBridgeAddr("empty".into()));
        } else if !addr.rsplit_once(':').is_some_and(|(host, port)| {
            !host.is_empty() && port.parse::<u16>().is_ok()
        }) {
            errors.push(ValidationError::InvalidBridgeAddr(format!(
                "{addr} (expected host:port)"
            )));
        }

        if self.device_name.trim().is_empty() {
            errors.push(ValidationError::EmptyDeviceName);
        }

        if self.status_poll_secs == 0 {
            errors.push(ValidationError::ZeroPollInterval);
        }

        if self.reconnect_initial_ms == 0 {
            errors.push(ValidationError::InvalidBackoff("initial delay is zero".into()));
        }
        if self.reconnect_max_ms < self.reconnect_initial_ms {
            errors.push(ValidationError::InvalidBackoff(format!(
                "max delay {}ms below initial {}ms",
                self.reconnect_max_ms, self.reconnect_initial_ms
            )));
        }
        if self.reconnect_multiplier < 1.0 {
            errors.push(ValidationError::InvalidBackoff(format!(
                "multiplier {} below 1.0",
                self.reconnect_multiplier
            )));
        }

        if let Err(e) = crate::color::parse_color(&self.default_color) {
            errors.push(ValidationError::InvalidColor(e.to_string()));
        }

        errors
    }
}
