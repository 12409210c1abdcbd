use std::time::SystemTime;

use glance_config::Config;
use glance_types::{
    CaptureImage, ModelConfig, OcrResult, SelectionRegion, SessionId, SessionStage, TargetLanguage,
};
use tokio_util::sync::CancellationToken;

/// Settings snapshot taken when the session starts
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub model: ModelConfig,
    pub source_language: String,
    pub target_language: TargetLanguage,
    pub min_selection_size: u32,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.translator.model.config(),
            source_language: config.translator.source_language.clone(),
            target_language: config.translator.target_language,
            min_selection_size: config.ui.min_selection_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid session transition {from} -> {to}")]
pub struct TransitionError {
    pub from: SessionStage,
    pub to: SessionStage,
}

/// One capture, OCR, translate, present cycle
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    stage: SessionStage,
    pub settings: SessionSettings,
    pub region: Option<SelectionRegion>,
    pub image: Option<CaptureImage>,
    pub ocr_result: Option<OcrResult>,
    pub started_at: SystemTime,
    cancel: CancellationToken,
}

impl Session {
    /// A new session starts out selecting
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            id: SessionId::new(),
            stage: SessionStage::Selecting,
            settings,
            region: None,
            image: None,
            ocr_result: None,
            started_at: SystemTime::now(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn is_live(&self) -> bool {
        !self.stage.is_terminal()
    }

    /// Token for one outstanding task; cancelled with the session
    pub fn task_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Forward along the pipeline, one stage at a time
    pub fn advance(&mut self, to: SessionStage) -> Result<(), TransitionError> {
        let from = self.stage;
        let allowed = !from.is_terminal()
            && !to.is_terminal()
            && to.ordinal() == from.ordinal() + 1;

        if !allowed {
            return Err(TransitionError { from, to });
        }

        tracing::debug!(session = %self.id, "{} -> {}", from, to);
        self.stage = to;
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.terminate(SessionStage::Failed)
    }

    /// Signal every outstanding task and drop the captured pixels
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.terminate(SessionStage::Cancelled)
    }

    fn terminate(&mut self, to: SessionStage) -> Result<(), TransitionError> {
        let from = self.stage;
        if from.is_terminal() || from == SessionStage::Idle {
            return Err(TransitionError { from, to });
        }

        tracing::debug!(session = %self.id, "{} -> {}", from, to);
        self.stage = to;
        self.cancel.cancel();
        self.image = None;
        Ok(())
    }
}
