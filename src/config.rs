//! User configuration: effect service address and engine timing.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_SERVICE_ADDR: &str = "127.0.0.1:33301";
const DEFAULT_QUIET_PERIOD_MS: u64 = 200;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP endpoint of the effect service.
    pub service_addr: String,
    /// Debounce quiet period for parameter edits.
    pub quiet_period_ms: u64,
    /// How often the supervisor re-checks a down connection.
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_addr: DEFAULT_SERVICE_ADDR.to_string(),
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Load `config.toml` from the user config dir. A missing or unreadable
    /// file yields defaults; a malformed one is logged and yields defaults.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trigbench").join("config.toml"))
}
