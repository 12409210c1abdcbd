use std::env;

use serde::{Deserialize, Serialize};

use self::hotkey::HotkeyConfig;
use self::ocr::OcrConfig;
use self::translator::TranslatorConfig;
use self::ui::UiConfig;

pub mod hotkey;
pub mod ocr;
pub mod translator;
pub mod ui;

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub hotkey: HotkeyConfig,
    pub ocr: OcrConfig,
    pub translator: TranslatorConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply `GLANCE_*` overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("GLANCE_OLLAMA_URL") {
            self.translator.base_url = url;
        }

        if let Some(name) = lookup("GLANCE_MODEL") {
            match name.parse() {
                Ok(model) => self.translator.model = model,
                Err(e) => tracing::warn!("Ignoring GLANCE_MODEL: {}", e),
            }
        }

        if let Some(secs) = lookup("GLANCE_TRANSLATE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.translator.timeout_secs = secs;
        }

        if let Some(ms) = lookup("GLANCE_DOUBLE_PRESS_MS").and_then(|v| v.parse().ok()) {
            self.hotkey.double_press_threshold_ms = ms;
        }

        if let Some(lang) = lookup("GLANCE_OCR_LANG") {
            self.ocr.language = lang;
        }
    }

    /// Clamp values a hand-edited settings file may have pushed out of range
    pub fn normalize(&mut self) {
        self.ui.font_size = UiConfig::snap_font_size(self.ui.font_size);
        if self.ocr.modes.is_empty() {
            self.ocr.modes = glance_types::SegmentationMode::default_order();
        }
    }
}
