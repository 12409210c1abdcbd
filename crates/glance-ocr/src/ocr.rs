use std::collections::HashMap;
use std::sync::Arc;

use glance_types::{CaptureImage, OcrResult, SegmentationMode};
use image::{DynamicImage, GrayImage};
use rusty_tesseract::{Args, Image, TessError};
use tokio_util::sync::CancellationToken;

use crate::preprocess::{normalize_text, to_grayscale};

/// External OCR engine, invoked once per segmentation mode
pub trait OcrBackend: Send + Sync {
    /// Whether the engine can be invoked at all
    fn is_available(&self) -> bool;

    fn recognize(&self, image: &GrayImage, mode: SegmentationMode) -> Result<String, OcrBackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OcrBackendError {
    #[error("OCR engine not found")]
    NotFound,

    #[error("OCR engine failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("OCR cancelled")]
    Cancelled,
}

/// Tesseract through the `tesseract` executable on PATH
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    language: String,
    dpi: Option<i32>,
}

impl TesseractBackend {
    pub fn new(language: impl Into<String>, dpi: Option<i32>) -> Self {
        Self {
            language: language.into(),
            dpi,
        }
    }

    pub fn from_config(config: &glance_config::ocr::OcrConfig) -> Self {
        Self::new(config.language.clone(), config.dpi)
    }

    pub fn version(&self) -> Option<String> {
        rusty_tesseract::get_tesseract_version().ok()
    }
}

impl OcrBackend for TesseractBackend {
    fn is_available(&self) -> bool {
        match rusty_tesseract::get_tesseract_version() {
            Ok(version) => {
                tracing::trace!("tesseract {}", version.lines().next().unwrap_or_default());
                true
            }
            Err(e) => {
                tracing::warn!("Tesseract not available: {}", e);
                false
            }
        }
    }

    fn recognize(&self, image: &GrayImage, mode: SegmentationMode) -> Result<String, OcrBackendError> {
        let dynamic = DynamicImage::ImageLuma8(image.clone());
        let input =
            Image::from_dynamic_image(&dynamic).map_err(|e| OcrBackendError::Failed(e.to_string()))?;

        let args = Args {
            lang: self.language.clone(),
            config_variables: HashMap::new(),
            dpi: self.dpi,
            psm: Some(mode.psm()),
            oem: Some(3),
        };

        rusty_tesseract::image_to_string(&input, &args).map_err(|e| match e {
            TessError::TesseractNotFoundError => OcrBackendError::NotFound,
            other => OcrBackendError::Failed(other.to_string()),
        })
    }
}

/// Runs the backend across an ordered list of segmentation modes and stops at
/// the first one that yields text.
pub struct OcrEngineAdapter {
    backend: Arc<dyn OcrBackend>,
    modes: Vec<SegmentationMode>,
}

impl OcrEngineAdapter {
    pub fn new(backend: Arc<dyn OcrBackend>, modes: Vec<SegmentationMode>) -> Self {
        let modes = if modes.is_empty() {
            SegmentationMode::default_order()
        } else {
            modes
        };
        Self { backend, modes }
    }

    pub fn modes(&self) -> &[SegmentationMode] {
        &self.modes
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Blocking; run it off the coordination path.
    ///
    /// All modes returning empty text is `Ok` with `success == false`; only an
    /// engine that cannot be invoked is an error.
    pub fn extract(
        &self,
        image: &CaptureImage,
        cancel: &CancellationToken,
    ) -> Result<OcrResult, OcrError> {
        if !self.backend.is_available() {
            return Err(OcrError::EngineUnavailable(
                "tesseract executable not found".to_string(),
            ));
        }

        let gray = to_grayscale(image).ok_or_else(|| {
            OcrError::EngineUnavailable("capture could not be converted to grayscale".to_string())
        })?;

        for &mode in &self.modes {
            if cancel.is_cancelled() {
                return Err(OcrError::Cancelled);
            }

            let raw = self
                .backend
                .recognize(&gray, mode)
                .map_err(|e| OcrError::EngineUnavailable(e.to_string()))?;

            let text = normalize_text(&raw);
            if !text.is_empty() {
                tracing::debug!("OCR psm {} found {} chars", mode.psm(), text.chars().count());
                return Ok(OcrResult::found(text, mode));
            }

            tracing::debug!("OCR psm {} found nothing", mode.psm());
        }

        Ok(OcrResult::no_text())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Answers from a fixed table and records which modes were asked
    struct ScriptedBackend {
        available: bool,
        answers: HashMap<SegmentationMode, Result<String, ()>>,
        calls: Mutex<Vec<SegmentationMode>>,
    }

    impl ScriptedBackend {
        fn new(answers: &[(SegmentationMode, &str)]) -> Self {
            Self {
                available: true,
                answers: answers
                    .iter()
                    .map(|(mode, text)| (*mode, Ok(text.to_string())))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<SegmentationMode> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl OcrBackend for ScriptedBackend {
        fn is_available(&self) -> bool {
            self.available
        }

        fn recognize(
            &self,
            _image: &GrayImage,
            mode: SegmentationMode,
        ) -> Result<String, OcrBackendError> {
            self.calls.lock().unwrap().push(mode);
            match self.answers.get(&mode) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(())) => Err(OcrBackendError::NotFound),
                None => Ok(String::new()),
            }
        }
    }

    fn image() -> CaptureImage {
        CaptureImage::from_rgba(vec![255; 100 * 30 * 4], 100, 30).unwrap()
    }

    const ORDER: [SegmentationMode; 3] = [
        SegmentationMode::SingleBlock,
        SegmentationMode::Auto,
        SegmentationMode::SparseText,
    ];

    #[test]
    fn test_first_mode_wins() {
        let backend = Arc::new(ScriptedBackend::new(&[
            (SegmentationMode::SingleBlock, "Hello\n"),
            (SegmentationMode::Auto, "Other"),
        ]));
        let adapter = OcrEngineAdapter::new(backend.clone(), ORDER.to_vec());

        let result = adapter.extract(&image(), &CancellationToken::new()).unwrap();
        assert_eq!(result, OcrResult::found("Hello".into(), SegmentationMode::SingleBlock));
        assert_eq!(backend.calls(), vec![SegmentationMode::SingleBlock]);
    }

    #[test]
    fn test_only_last_mode_has_text() {
        let backend = Arc::new(ScriptedBackend::new(&[
            (SegmentationMode::SingleBlock, "   "),
            (SegmentationMode::SparseText, "Hello"),
        ]));
        let adapter = OcrEngineAdapter::new(backend.clone(), ORDER.to_vec());

        let result = adapter.extract(&image(), &CancellationToken::new()).unwrap();
        assert_eq!(result.text, "Hello");
        assert_eq!(result.mode_used, Some(SegmentationMode::SparseText));
        assert_eq!(backend.calls(), ORDER.to_vec());
    }

    #[test]
    fn test_all_empty_is_no_text() {
        let backend = Arc::new(ScriptedBackend::new(&[]));
        let adapter = OcrEngineAdapter::new(backend.clone(), ORDER.to_vec());

        let result = adapter.extract(&image(), &CancellationToken::new()).unwrap();
        assert_eq!(result, OcrResult::no_text());
        assert_eq!(backend.calls().len(), 3);
    }

    #[test]
    fn test_unavailable_engine() {
        let mut backend = ScriptedBackend::new(&[(SegmentationMode::SingleBlock, "Hello")]);
        backend.available = false;
        let adapter = OcrEngineAdapter::new(Arc::new(backend), ORDER.to_vec());

        let result = adapter.extract(&image(), &CancellationToken::new());
        assert!(matches!(result, Err(OcrError::EngineUnavailable(_))));
    }

    #[test]
    fn test_engine_failure_mid_run_is_unavailable() {
        let mut backend = ScriptedBackend::new(&[]);
        backend
            .answers
            .insert(SegmentationMode::Auto, Err(()));
        let backend = Arc::new(backend);
        let adapter = OcrEngineAdapter::new(backend.clone(), ORDER.to_vec());

        let result = adapter.extract(&image(), &CancellationToken::new());
        assert!(matches!(result, Err(OcrError::EngineUnavailable(_))));
        assert_eq!(
            backend.calls(),
            vec![SegmentationMode::SingleBlock, SegmentationMode::Auto]
        );
    }

    #[test]
    fn test_cancelled_before_first_mode() {
        let backend = Arc::new(ScriptedBackend::new(&[(SegmentationMode::SingleBlock, "Hello")]));
        let adapter = OcrEngineAdapter::new(backend.clone(), ORDER.to_vec());
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(adapter.extract(&image(), &cancel), Err(OcrError::Cancelled));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_empty_mode_list_uses_default_order() {
        let adapter = OcrEngineAdapter::new(Arc::new(ScriptedBackend::new(&[])), Vec::new());
        assert_eq!(adapter.modes(), SegmentationMode::default_order().as_slice());
    }
}
