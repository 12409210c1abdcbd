use std::time::Duration;

use glance_types::{TargetLanguage, TranslationModel};
use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_source_language() -> String {
    "English".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_validate_script() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Ollama endpoint, must resolve to the local host
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: TranslationModel,
    #[serde(default = "default_source_language")]
    pub source_language: String,
    #[serde(default)]
    pub target_language: TargetLanguage,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reject responses that contain no character of the target script
    #[serde(default = "default_validate_script")]
    pub validate_script: bool,
}

impl TranslatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: TranslationModel::default(),
            source_language: default_source_language(),
            target_language: TargetLanguage::default(),
            timeout_secs: default_timeout_secs(),
            validate_script: default_validate_script(),
        }
    }
}
