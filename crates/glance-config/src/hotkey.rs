use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_activation() -> String {
    "alt+KeyT".to_string()
}

fn default_cancel() -> Option<String> {
    Some("ctrl+shift+KeyX".to_string())
}

fn default_manual_trigger() -> Option<String> {
    Some("ctrl+shift+KeyS".to_string())
}

fn default_double_press_threshold_ms() -> u64 {
    500
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Key combination that activates a session when pressed twice
    #[serde(default = "default_activation")]
    pub activation: String,
    /// Aborts a pending double press or the live session
    #[serde(default = "default_cancel")]
    pub cancel: Option<String>,
    /// Single press starts a session directly
    #[serde(default = "default_manual_trigger")]
    pub manual_trigger: Option<String>,
    #[serde(default = "default_double_press_threshold_ms")]
    pub double_press_threshold_ms: u64,
    /// Second presses arriving sooner than this are treated as key auto-repeat
    #[serde(default)]
    pub min_press_interval_ms: u64,
}

impl HotkeyConfig {
    pub fn double_press_threshold(&self) -> Duration {
        Duration::from_millis(self.double_press_threshold_ms)
    }

    pub fn min_press_interval(&self) -> Duration {
        Duration::from_millis(self.min_press_interval_ms)
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            activation: default_activation(),
            cancel: default_cancel(),
            manual_trigger: default_manual_trigger(),
            double_press_threshold_ms: default_double_press_threshold_ms(),
            min_press_interval_ms: 0,
        }
    }
}
