use glance_ocr::{CaptureError, OcrError};
use glance_translator::TranslateError;
use glance_types::ErrorKind;

/// Why a session ended early. Every stage failure lands here unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("{0}")]
    Ocr(#[from] OcrError),

    #[error("No text found in the selected region")]
    NoText,

    #[error("{0}")]
    Translate(#[from] TranslateError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Capture(_) => ErrorKind::CaptureFailure,
            SessionError::Ocr(OcrError::EngineUnavailable(_)) => ErrorKind::OcrEngineUnavailable,
            // user aborted before anything was translated
            SessionError::Ocr(OcrError::Cancelled) => ErrorKind::SelectionCancelled,
            SessionError::NoText => ErrorKind::OcrNoTextFound,
            SessionError::Translate(e) => match e {
                TranslateError::ServiceUnreachable(_) => ErrorKind::ServiceUnreachable,
                TranslateError::ModelError(_) => ErrorKind::ModelError,
                TranslateError::Timeout(_) => ErrorKind::Timeout,
                TranslateError::Cancelled => ErrorKind::TranslationCancelled,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use glance_types::SelectionRegion;

    use super::*;

    #[test]
    fn test_every_failure_has_its_own_kind() {
        let errors = [
            SessionError::Capture(CaptureError::OutsideScreens(SelectionRegion::new(0, 0, 1, 1))),
            SessionError::Ocr(OcrError::EngineUnavailable("missing".into())),
            SessionError::NoText,
            SessionError::Translate(TranslateError::ServiceUnreachable("refused".into())),
            SessionError::Translate(TranslateError::ModelError("not found".into())),
            SessionError::Translate(TranslateError::Timeout(Duration::from_secs(60))),
            SessionError::Translate(TranslateError::Cancelled),
        ];

        let kinds: HashSet<ErrorKind> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());

        let messages: HashSet<&str> = kinds.iter().map(|k| k.user_message()).collect();
        assert_eq!(messages.len(), kinds.len());
    }

    #[test]
    fn test_no_text_is_not_engine_unavailable() {
        assert_eq!(SessionError::NoText.kind(), ErrorKind::OcrNoTextFound);
        assert_ne!(
            SessionError::Ocr(OcrError::EngineUnavailable(String::new())).kind(),
            ErrorKind::OcrNoTextFound
        );
    }
}
