use serde::{Deserialize, Serialize};

pub const FONT_SIZES: [u32; 17] = [8, 9, 10, 11, 12, 13, 14, 15, 16, 18, 20, 22, 24, 28, 32, 36, 48];

fn default_font_size() -> u32 {
    16
}

fn default_min_selection_size() -> u32 {
    1
}

fn default_show_source_text() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct UiConfig {
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Selections narrower or shorter than this are dropped as cancelled
    #[serde(default = "default_min_selection_size")]
    pub min_selection_size: u32,
    #[serde(default = "default_show_source_text")]
    pub show_source_text: bool,
}

impl UiConfig {
    /// Nearest supported font size
    pub fn snap_font_size(size: u32) -> u32 {
        FONT_SIZES
            .iter()
            .copied()
            .min_by_key(|s| s.abs_diff(size))
            .unwrap_or_else(default_font_size)
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            min_selection_size: default_min_selection_size(),
            show_source_text: default_show_source_text(),
        }
    }
}
