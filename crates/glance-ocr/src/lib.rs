mod capture;
mod hotkey;
mod ocr;
mod preprocess;

pub use capture::{CaptureError, ScreenCapture, XcapCapture};
pub use hotkey::{HotkeyManager, HotkeySignal};
pub use ocr::{OcrBackend, OcrBackendError, OcrEngineAdapter, OcrError, TesseractBackend};
pub use preprocess::{normalize_text, to_grayscale};
