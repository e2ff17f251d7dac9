use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine tuning knobs. Hosts usually deserialize this from their own
/// configuration file (see `scribe::config`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Run the autosave pipeline at all.
    pub autosave_enabled: bool,
    /// Quiescent interval before an autosave fires.
    pub autosave_debounce_ms: u64,
    /// Require `true` for checkboxes marked `required`.
    pub enforce_required_checkbox: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            autosave_enabled: true,
            autosave_debounce_ms: 2000,
            enforce_required_checkbox: false,
        }
    }
}

impl EngineSettings {
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
