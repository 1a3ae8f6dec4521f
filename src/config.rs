//! Session configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "client_name": "studio", "rescan_interval_ms": 250 }
//! ```

use crate::error::{Error, Result};
use junction_core::ROUTES_KEY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "junction";
const STORE_FILE: &str = "routes.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunctionConfig {
    /// Client name registered with the platform MIDI backend.
    pub client_name: String,
    /// JSON file holding the persisted routes.
    pub store_path: PathBuf,
    /// Key the routes are stored under.
    pub storage_key: String,
    /// Hot-plug rescan period. 0 turns automatic rescans off.
    pub rescan_interval_ms: u64,
}

impl Default for JunctionConfig {
    fn default() -> Self {
        Self {
            client_name: "junction".to_string(),
            store_path: default_store_path(),
            storage_key: ROUTES_KEY.to_string(),
            rescan_interval_ms: 1000,
        }
    }
}

impl JunctionConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn rescan_interval(&self) -> Option<Duration> {
        (self.rescan_interval_ms > 0).then(|| Duration::from_millis(self.rescan_interval_ms))
    }
}

/// `<config dir>/junction/routes.json`, or the working directory when the
/// platform has no config dir.
pub fn default_store_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(STORE_FILE)
}
