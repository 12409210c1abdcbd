use std::sync::Arc;
use std::time::{Duration, Instant};

use glance_types::{ModelConfig, PromptStyle, TargetLanguage, TranslationModel};
use tokio_util::sync::CancellationToken;

use crate::prompt::{build_prompt, clean_response};
use crate::{InferenceBackend, InferenceRequest, TranslateError};

/// One translation job. The token belongs to exactly one session.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub model: ModelConfig,
    pub source_language: String,
    pub target_language: TargetLanguage,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub model: TranslationModel,
    pub elapsed: Duration,
}

/// Builds the prompt, dispatches to the inference backend and classifies the outcome
pub struct TranslationClient {
    backend: Arc<dyn InferenceBackend>,
    timeout: Duration,
    validate_script: bool,
}

impl TranslationClient {
    pub fn new(backend: Arc<dyn InferenceBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            validate_script: true,
        }
    }

    pub fn with_script_validation(mut self, enabled: bool) -> Self {
        self.validate_script = enabled;
        self
    }

    pub fn backend(&self) -> &Arc<dyn InferenceBackend> {
        &self.backend
    }

    pub async fn translate(&self, request: TranslationRequest) -> Result<Translation, TranslateError> {
        if request.cancel.is_cancelled() {
            return Err(TranslateError::Cancelled);
        }

        let prompt = build_prompt(
            &request.model,
            &request.source_language,
            request.target_language,
            &request.text,
        );
        let raw = request.model.prompt_style == PromptStyle::GemmaChat;
        let inference = InferenceRequest::new(&request.model, prompt, raw);

        tracing::debug!(
            "Dispatching translation to {} ({} chars)",
            request.model.model_id,
            request.text.chars().count()
        );

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = request.cancel.cancelled() => return Err(TranslateError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, self.backend.generate(&inference)) => outcome,
        };

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                tracing::warn!("Translation exceeded {:?}", self.timeout);
                return Err(TranslateError::Timeout(self.timeout));
            }
        };

        let text = clean_response(&response, request.target_language);
        if text.is_empty() {
            return Err(TranslateError::ModelError("model returned an empty response".to_string()));
        }

        if self.validate_script && !request.target_language.matches_script(&text) {
            return Err(TranslateError::ModelError(format!(
                "response is not in {}: {}",
                request.target_language, text
            )));
        }

        Ok(Translation {
            text,
            model: request.model.model,
            elapsed: started.elapsed(),
        })
    }
}
