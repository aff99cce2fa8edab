//! Session lifetime configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Seconds before token expiry at which the refresh timer fires.
const fn default_refresh_margin_secs() -> u64 {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Safety margin subtracted from the token's `exp` when arming the refresh timer.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,

    /// Directory holding the session file. Empty means the user's runtime dir
    /// (cleared when the login session ends), falling back to the cache dir.
    #[serde(default)]
    pub storage_dir: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_margin_secs: default_refresh_margin_secs(),
            storage_dir: String::new(),
        }
    }
}

impl SessionConfig {
    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }

    /// Resolve the directory for the session file.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        if !self.storage_dir.trim().is_empty() {
            return Some(PathBuf::from(self.storage_dir.trim()));
        }
        dirs::runtime_dir()
            .or_else(dirs::cache_dir)
            .map(|dir| dir.join("appdesk"))
    }
}
