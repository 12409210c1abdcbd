use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Screen rectangle in logical (device-independent) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl SelectionRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two drag corners, whichever direction the drag went.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: a.0.abs_diff(b.0),
            height: a.1.abs_diff(b.1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }
}

impl fmt::Display for SelectionRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Immutable RGBA pixel buffer produced by a screen capture.
///
/// Cloning is cheap: the pixels are shared, never copied.
#[derive(Clone)]
pub struct CaptureImage {
    pixels: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl CaptureImage {
    /// Wrap raw RGBA8 bytes. Returns `None` when the buffer does not match the dimensions.
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if width == 0 || height == 0 || pixels.len() != expected {
            return None;
        }

        Some(Self {
            pixels: pixels.into(),
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Debug for CaptureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Tesseract page segmentation modes the OCR adapter may cycle through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// PSM 3
    Auto,
    /// PSM 4
    SingleColumn,
    /// PSM 6
    SingleBlock,
    /// PSM 7
    SingleLine,
    /// PSM 8
    SingleWord,
    /// PSM 11
    SparseText,
}

impl SegmentationMode {
    pub fn psm(self) -> i32 {
        match self {
            SegmentationMode::Auto => 3,
            SegmentationMode::SingleColumn => 4,
            SegmentationMode::SingleBlock => 6,
            SegmentationMode::SingleLine => 7,
            SegmentationMode::SingleWord => 8,
            SegmentationMode::SparseText => 11,
        }
    }

    /// Uniform block first, full automatic layout analysis as fallback
    pub fn default_order() -> Vec<Self> {
        vec![SegmentationMode::SingleBlock, SegmentationMode::Auto]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrResult {
    pub text: String,
    pub mode_used: Option<SegmentationMode>,
    /// `false` with empty text means "no text found", not an engine failure
    pub success: bool,
}

impl OcrResult {
    pub fn found(text: String, mode: SegmentationMode) -> Self {
        Self {
            text,
            mode_used: Some(mode),
            success: true,
        }
    }

    pub fn no_text() -> Self {
        Self {
            text: String::new(),
            mode_used: None,
            success: false,
        }
    }
}

/// Closed catalog of local translation models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationModel {
    #[default]
    Gemma3n,
    Gemma3nUnsloth,
}

impl TranslationModel {
    pub const ALL: [TranslationModel; 2] = [TranslationModel::Gemma3n, TranslationModel::Gemma3nUnsloth];

    pub fn key(self) -> &'static str {
        match self {
            TranslationModel::Gemma3n => "gemma3n",
            TranslationModel::Gemma3nUnsloth => "gemma3n-unsloth",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TranslationModel::Gemma3n => "Gemma 3n",
            TranslationModel::Gemma3nUnsloth => "Gemma 3n (Unsloth)",
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            TranslationModel::Gemma3n => "gemma3n",
            TranslationModel::Gemma3nUnsloth => "hf.co/unsloth/gemma-3n-E4B-it-GGUF:Q4_K_XL",
        }
    }

    pub fn config(self) -> ModelConfig {
        match self {
            TranslationModel::Gemma3n => ModelConfig {
                model: self,
                model_id: self.model_id().to_string(),
                temperature: 0.1,
                max_tokens: 200,
                sampling: None,
                prompt_style: PromptStyle::Instruction,
            },
            TranslationModel::Gemma3nUnsloth => ModelConfig {
                model: self,
                model_id: self.model_id().to_string(),
                temperature: 1.0,
                max_tokens: 200,
                sampling: Some(SamplingOptions {
                    top_k: 64,
                    top_p: 0.95,
                    min_p: 0.0,
                }),
                prompt_style: PromptStyle::GemmaChat,
            },
        }
    }
}

impl fmt::Display for TranslationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModel(pub String);

impl fmt::Display for UnknownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = TranslationModel::ALL.iter().map(|m| m.key()).collect();
        write!(f, "unknown model '{}' (known: {})", self.0, known.join(", "))
    }
}

impl std::error::Error for UnknownModel {}

impl FromStr for TranslationModel {
    type Err = UnknownModel;

    /// Accepts the catalog key, the display name or the backend model id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        TranslationModel::ALL
            .into_iter()
            .find(|m| {
                m.key().eq_ignore_ascii_case(needle)
                    || m.display_name().eq_ignore_ascii_case(needle)
                    || m.model_id() == needle
            })
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}

/// How the prompt is framed for a given model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Plain instruction, the server applies the model template
    Instruction,
    /// Pre-rendered Gemma chat turns, sent raw
    GemmaChat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    pub top_k: u32,
    pub top_p: f32,
    pub min_p: f32,
}

/// Request parameters for one catalog model. Immutable once a request is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model: TranslationModel,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub sampling: Option<SamplingOptions>,
    pub prompt_style: PromptStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLanguage {
    #[default]
    Thai,
    English,
    Japanese,
    Chinese,
    Korean,
}

impl TargetLanguage {
    pub fn name(self) -> &'static str {
        match self {
            TargetLanguage::Thai => "Thai",
            TargetLanguage::English => "English",
            TargetLanguage::Japanese => "Japanese",
            TargetLanguage::Chinese => "Chinese",
            TargetLanguage::Korean => "Korean",
        }
    }

    /// True when `text` contains at least one character of this language's script
    pub fn matches_script(self, text: &str) -> bool {
        text.chars().any(|c| match self {
            TargetLanguage::Thai => ('\u{0E00}'..='\u{0E7F}').contains(&c),
            TargetLanguage::English => c.is_ascii_alphabetic(),
            TargetLanguage::Japanese => {
                ('\u{3040}'..='\u{30FF}').contains(&c) || ('\u{4E00}'..='\u{9FFF}').contains(&c)
            }
            TargetLanguage::Chinese => ('\u{4E00}'..='\u{9FFF}').contains(&c),
            TargetLanguage::Korean => {
                ('\u{AC00}'..='\u{D7AF}').contains(&c) || ('\u{1100}'..='\u{11FF}').contains(&c)
            }
        })
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First group is enough to tell sessions apart in logs
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStage {
    Idle,
    Selecting,
    Capturing,
    Extracting,
    Translating,
    Presenting,
    Cancelled,
    Failed,
}

impl SessionStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStage::Cancelled | SessionStage::Failed)
    }

    /// Position along the pipeline, used to keep transitions monotonic
    pub fn ordinal(self) -> u8 {
        match self {
            SessionStage::Idle => 0,
            SessionStage::Selecting => 1,
            SessionStage::Capturing => 2,
            SessionStage::Extracting => 3,
            SessionStage::Translating => 4,
            SessionStage::Presenting => 5,
            SessionStage::Cancelled | SessionStage::Failed => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionStage::Idle => "Ready",
            SessionStage::Selecting => "Drag to select an area (cancel to abort)",
            SessionStage::Capturing => "Capturing...",
            SessionStage::Extracting => "Extracting text...",
            SessionStage::Translating => "Translating...",
            SessionStage::Presenting => "Completed",
            SessionStage::Cancelled => "Cancelled",
            SessionStage::Failed => "Error",
        }
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// User-facing classification of how a session ended badly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SelectionCancelled,
    CaptureFailure,
    OcrEngineUnavailable,
    OcrNoTextFound,
    ServiceUnreachable,
    ModelError,
    Timeout,
    TranslationCancelled,
}

impl ErrorKind {
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::SelectionCancelled => "Selection cancelled.",
            ErrorKind::CaptureFailure => {
                "Could not capture the selected area. Keep the selection on one screen and allow screen recording."
            }
            ErrorKind::OcrEngineUnavailable => {
                "Tesseract OCR is not available. Install it and make sure `tesseract` is on your PATH."
            }
            ErrorKind::OcrNoTextFound => "No text found in the selected area.",
            ErrorKind::ServiceUnreachable => {
                "Could not reach the local Ollama service. Start it with `ollama serve`."
            }
            ErrorKind::ModelError => {
                "The translation model reported an error. Check that the model is pulled in Ollama."
            }
            ErrorKind::Timeout => "Translation took too long and was stopped.",
            ErrorKind::TranslationCancelled => "Translation cancelled.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardStatus {
    Copied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionReport {
    Translated {
        source_text: String,
        text: String,
        model: TranslationModel,
        clipboard: ClipboardStatus,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
    Cancelled,
}

/// Display payload handed to the overlay at the end of a session
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub session: SessionId,
    pub region: Option<SelectionRegion>,
    pub started_at: SystemTime,
    pub report: SessionReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyKey {
    Activation,
    Cancel,
    Other,
}

/// Key transition from the OS hook; consumed, never retained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: HotkeyKey,
    pub pressed: bool,
    pub at: Instant,
}

impl KeyEvent {
    pub fn down(key: HotkeyKey, at: Instant) -> Self {
        Self {
            key,
            pressed: true,
            at,
        }
    }

    pub fn up(key: HotkeyKey, at: Instant) -> Self {
        Self {
            key,
            pressed: false,
            at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down { x: i32, y: i32 },
    Move { x: i32, y: i32 },
    Up { x: i32, y: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationSource {
    DoublePress,
    Manual,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_corners_any_direction() {
        let expected = SelectionRegion::new(10, 20, 90, 40);
        assert_eq!(SelectionRegion::from_corners((10, 20), (100, 60)), expected);
        assert_eq!(SelectionRegion::from_corners((100, 60), (10, 20)), expected);
        assert_eq!(SelectionRegion::from_corners((100, 20), (10, 60)), expected);
        assert_eq!(SelectionRegion::from_corners((10, 60), (100, 20)), expected);
    }

    #[test]
    fn test_region_negative_coordinates() {
        let region = SelectionRegion::from_corners((-50, -10), (-1920, 300));
        assert_eq!(region, SelectionRegion::new(-1920, -10, 1870, 310));
        assert_eq!(region.right(), -50);
    }

    #[test]
    fn test_capture_image_rejects_mismatched_buffer() {
        assert!(CaptureImage::from_rgba(vec![0; 16], 2, 2).is_some());
        assert!(CaptureImage::from_rgba(vec![0; 15], 2, 2).is_none());
        assert!(CaptureImage::from_rgba(Vec::new(), 0, 0).is_none());
    }

    #[test]
    fn test_model_lookup_by_any_name() {
        assert_eq!(
            "gemma3n".parse::<TranslationModel>(),
            Ok(TranslationModel::Gemma3n)
        );
        assert_eq!(
            "Gemma 3n (Unsloth)".parse::<TranslationModel>(),
            Ok(TranslationModel::Gemma3nUnsloth)
        );
        assert_eq!(
            "hf.co/unsloth/gemma-3n-E4B-it-GGUF:Q4_K_XL".parse::<TranslationModel>(),
            Ok(TranslationModel::Gemma3nUnsloth)
        );
        assert!("qwen3:4b".parse::<TranslationModel>().is_err());
    }

    #[test]
    fn test_model_options() {
        let plain = TranslationModel::Gemma3n.config();
        assert_eq!(plain.temperature, 0.1);
        assert!(plain.sampling.is_none());

        let unsloth = TranslationModel::Gemma3nUnsloth.config();
        assert_eq!(unsloth.temperature, 1.0);
        assert_eq!(unsloth.sampling.map(|s| s.top_k), Some(64));
        assert_eq!(unsloth.max_tokens, 200);
    }

    #[test]
    fn test_target_script() {
        assert!(TargetLanguage::Thai.matches_script("สวัสดี"));
        assert!(!TargetLanguage::Thai.matches_script("Hello"));
        assert!(TargetLanguage::Japanese.matches_script("こんにちは"));
        assert!(TargetLanguage::Korean.matches_script("안녕"));
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let kinds = [
            ErrorKind::SelectionCancelled,
            ErrorKind::CaptureFailure,
            ErrorKind::OcrEngineUnavailable,
            ErrorKind::OcrNoTextFound,
            ErrorKind::ServiceUnreachable,
            ErrorKind::ModelError,
            ErrorKind::Timeout,
            ErrorKind::TranslationCancelled,
        ];
        let messages: std::collections::HashSet<_> =
            kinds.iter().map(|k| k.user_message()).collect();
        assert_eq!(messages.len(), kinds.len());
    }
}
