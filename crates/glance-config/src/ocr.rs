use glance_types::SegmentationMode;
use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "eng".to_string()
}

fn default_modes() -> Vec<SegmentationMode> {
    SegmentationMode::default_order()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language pack, e.g. "eng" or "eng+jpn"
    #[serde(default = "default_language")]
    pub language: String,
    /// Segmentation modes in the order they are tried
    #[serde(default = "default_modes")]
    pub modes: Vec<SegmentationMode>,
    pub dpi: Option<i32>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            modes: default_modes(),
            dpi: None,
        }
    }
}
