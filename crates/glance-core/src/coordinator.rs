use std::sync::Arc;
use std::time::Instant;

use glance_config::Config;
use glance_ocr::{OcrEngineAdapter, OcrError, ScreenCapture};
use glance_translator::{TranslateError, Translation, TranslationClient, TranslationRequest};
use glance_types::{
    ActivationSource, ErrorKind, HotkeyKey, KeyEvent, OcrResult, PointerEvent, SelectionRegion,
    SessionId, SessionStage,
};
use kanal::{AsyncReceiver, AsyncSender};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::hotkey::{HotkeyDetector, HotkeyOutcome};
use crate::presenter::{PresentContext, ResultPresenter};
use crate::selection::{SelectionController, SelectionUpdate};
use crate::session::{Session, SessionSettings};

/// Everything the coordination path reacts to. Worker results carry the id
/// of the session that spawned them.
#[derive(Debug)]
pub enum CoordinatorEvent {
    Key(KeyEvent),
    Activate(ActivationSource),
    Pointer(PointerEvent),
    Cancel,
    OcrFinished {
        session: SessionId,
        result: Result<OcrResult, OcrError>,
    },
    TranslationFinished {
        session: SessionId,
        result: Result<Translation, TranslateError>,
    },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    Ignored,
    /// Activation while a session is live
    Rejected,
    /// Result for a session that is gone or has moved on
    Stale,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    Cancelled,
    Failed(ErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub session: SessionId,
    pub end: SessionEnd,
}

/// Collaborators the pipeline stages call into
pub struct Services {
    pub capture: Arc<dyn ScreenCapture>,
    pub ocr: Arc<OcrEngineAdapter>,
    pub translator: Arc<TranslationClient>,
    pub presenter: ResultPresenter,
}

/// Owns the single live session and every state transition.
///
/// OCR and translation run as spawned tasks and report back through the
/// coordinator's own inbox; nothing outside this struct touches the session.
pub struct SessionCoordinator {
    config: Arc<RwLock<Config>>,
    services: Services,
    inbox: AsyncSender<CoordinatorEvent>,
    detector: HotkeyDetector,
    selection: SelectionController,
    session: Option<Session>,
    last_outcome: Option<SessionOutcome>,
}

impl SessionCoordinator {
    pub async fn new(
        config: Arc<RwLock<Config>>,
        services: Services,
        inbox: AsyncSender<CoordinatorEvent>,
    ) -> Self {
        let detector = HotkeyDetector::from_config(&config.read().await.hotkey);

        Self {
            config,
            services,
            inbox,
            detector,
            selection: SelectionController::new(),
            session: None,
            last_outcome: None,
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.session
            .as_ref()
            .map_or(SessionStage::Idle, |s| s.stage())
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn last_outcome(&self) -> Option<SessionOutcome> {
        self.last_outcome
    }

    pub fn detector(&self) -> &HotkeyDetector {
        &self.detector
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Coordination loop; returns when shut down or the inbox closes
    pub async fn run(
        mut self,
        events: AsyncReceiver<CoordinatorEvent>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        tracing::info!("Session coordinator started");

        loop {
            let event = self.next_event(&events, &shutdown).await;
            if self.handle(event).await == Disposition::Shutdown {
                break;
            }
        }

        tracing::info!("Session coordinator stopped");
        Ok(())
    }

    /// Wait for the next event, clearing a lapsed double-press window on the way
    pub async fn next_event(
        &mut self,
        events: &AsyncReceiver<CoordinatorEvent>,
        shutdown: &CancellationToken,
    ) -> CoordinatorEvent {
        loop {
            let deadline = self.detector.deadline();
            tokio::select! {
                _ = shutdown.cancelled() => return CoordinatorEvent::Shutdown,
                event = events.recv() => return match event {
                    Ok(event) => event,
                    Err(_) => {
                        tracing::warn!("Coordinator inbox closed");
                        CoordinatorEvent::Shutdown
                    }
                },
                _ = window_closes(deadline) => {
                    self.detector.expire(Instant::now());
                }
            }
        }
    }

    pub async fn handle(&mut self, event: CoordinatorEvent) -> Disposition {
        match event {
            CoordinatorEvent::Key(key) => self.on_key(key).await,
            CoordinatorEvent::Activate(source) => self.activate(source).await,
            CoordinatorEvent::Pointer(pointer) => self.on_pointer(pointer),
            CoordinatorEvent::Cancel => self.cancel_session(),
            CoordinatorEvent::OcrFinished { session, result } => {
                if !self.is_current(session, SessionStage::Extracting) {
                    tracing::debug!(session = %session, "Discarding stale OCR result");
                    return Disposition::Stale;
                }
                self.on_ocr_finished(result)
            }
            CoordinatorEvent::TranslationFinished { session, result } => {
                if !self.is_current(session, SessionStage::Translating) {
                    tracing::debug!(session = %session, "Discarding stale translation");
                    return Disposition::Stale;
                }
                self.on_translation_finished(result)
            }
            CoordinatorEvent::Shutdown => {
                self.cancel_session();
                Disposition::Shutdown
            }
        }
    }

    fn is_current(&self, id: SessionId, stage: SessionStage) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id == id && s.stage() == stage && !s.is_cancelled())
    }

    async fn on_key(&mut self, key: KeyEvent) -> Disposition {
        if key.key == HotkeyKey::Cancel && key.pressed && self.session.is_some() {
            self.detector.on_key(key);
            return self.cancel_session();
        }

        match self.detector.on_key(key) {
            HotkeyOutcome::Activate => self.activate(ActivationSource::DoublePress).await,
            HotkeyOutcome::Armed | HotkeyOutcome::Reset => Disposition::Applied,
            HotkeyOutcome::Ignored => Disposition::Ignored,
        }
    }

    async fn activate(&mut self, source: ActivationSource) -> Disposition {
        if let Some(session) = &self.session {
            tracing::info!(
                session = %session.id,
                stage = %session.stage(),
                "Ignoring {:?} activation, a session is already active",
                source
            );
            return Disposition::Rejected;
        }

        let settings = SessionSettings::from_config(&*self.config.read().await);
        let session = Session::new(settings);
        tracing::info!(session = %session.id, "Session started ({:?})", source);

        self.selection.begin(session.settings.min_selection_size);
        self.publish(Some(session.id), SessionStage::Selecting);
        self.session = Some(session);
        Disposition::Applied
    }

    fn on_pointer(&mut self, pointer: PointerEvent) -> Disposition {
        if self.stage() != SessionStage::Selecting {
            return Disposition::Ignored;
        }

        match self.selection.on_pointer(pointer) {
            SelectionUpdate::Preview(region) => {
                self.services.presenter.overlay().show_selection(region);
                Disposition::Applied
            }
            SelectionUpdate::Committed(region) => self.on_committed(region),
            SelectionUpdate::Cancelled => self.cancel_session(),
            SelectionUpdate::Ignored => Disposition::Ignored,
        }
    }

    fn on_committed(&mut self, region: SelectionRegion) -> Disposition {
        let Some(session) = self.session.as_mut() else {
            return Disposition::Ignored;
        };
        session.region = Some(region);
        if let Err(e) = session.advance(SessionStage::Capturing) {
            tracing::error!("{}", e);
            return Disposition::Ignored;
        }
        let id = session.id;
        self.publish(Some(id), SessionStage::Capturing);

        let image = match self.services.capture.capture(region) {
            Ok(image) => image,
            Err(e) => return self.fail(SessionError::Capture(e)),
        };

        let Some(session) = self.session.as_mut() else {
            return Disposition::Ignored;
        };
        tracing::debug!(
            session = %id,
            "Captured {}x{} px for {}",
            image.width(),
            image.height(),
            region
        );
        session.image = Some(image.clone());
        if let Err(e) = session.advance(SessionStage::Extracting) {
            tracing::error!("{}", e);
            return Disposition::Ignored;
        }
        let token = session.task_token();
        self.publish(Some(id), SessionStage::Extracting);

        let adapter = self.services.ocr.clone();
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            let worker = tokio::task::spawn_blocking(move || adapter.extract(&image, &token));
            let result = match worker.await {
                Ok(result) => result,
                Err(e) => Err(OcrError::EngineUnavailable(format!("OCR worker failed: {}", e))),
            };

            if let Err(e) = inbox
                .send(CoordinatorEvent::OcrFinished {
                    session: id,
                    result,
                })
                .await
            {
                tracing::debug!(session = %id, "Coordinator gone, dropping OCR result: {}", e);
            }
        });

        Disposition::Applied
    }

    fn on_ocr_finished(&mut self, result: Result<OcrResult, OcrError>) -> Disposition {
        let ocr = match result {
            Ok(ocr) if ocr.success => ocr,
            Ok(_) => return self.fail(SessionError::NoText),
            Err(OcrError::Cancelled) => return self.cancel_session(),
            Err(e) => return self.fail(SessionError::Ocr(e)),
        };

        let Some(session) = self.session.as_mut() else {
            return Disposition::Ignored;
        };
        if let Err(e) = session.advance(SessionStage::Translating) {
            tracing::error!("{}", e);
            return Disposition::Ignored;
        }

        let id = session.id;
        tracing::info!(session = %id, "OCR found {} chars", ocr.text.chars().count());

        let request = TranslationRequest {
            text: ocr.text.clone(),
            model: session.settings.model.clone(),
            source_language: session.settings.source_language.clone(),
            target_language: session.settings.target_language,
            cancel: session.task_token(),
        };
        session.ocr_result = Some(ocr);
        self.publish(Some(id), SessionStage::Translating);

        let client = self.services.translator.clone();
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            let worker = tokio::spawn(async move { client.translate(request).await });
            let result = match worker.await {
                Ok(result) => result,
                Err(e) => Err(TranslateError::ModelError(format!(
                    "translation task failed: {}",
                    e
                ))),
            };

            if let Err(e) = inbox
                .send(CoordinatorEvent::TranslationFinished {
                    session: id,
                    result,
                })
                .await
            {
                tracing::debug!(session = %id, "Coordinator gone, dropping translation: {}", e);
            }
        });

        Disposition::Applied
    }

    fn on_translation_finished(
        &mut self,
        result: Result<Translation, TranslateError>,
    ) -> Disposition {
        let translation = match result {
            Ok(translation) => translation,
            Err(TranslateError::Cancelled) => return self.cancel_session(),
            Err(e) => return self.fail(SessionError::Translate(e)),
        };

        let Some(mut session) = self.session.take() else {
            return Disposition::Ignored;
        };
        if let Err(e) = session.advance(SessionStage::Presenting) {
            tracing::error!("{}", e);
            self.session = Some(session);
            return Disposition::Ignored;
        }
        self.publish(Some(session.id), SessionStage::Presenting);

        tracing::info!(
            session = %session.id,
            "Translated in {:?} with {}",
            translation.elapsed,
            translation.model
        );

        let source_text = session
            .ocr_result
            .take()
            .map(|r| r.text)
            .unwrap_or_default();
        self.services
            .presenter
            .translated(context(&session), source_text, translation);

        self.finish(session, SessionEnd::Completed);
        Disposition::Applied
    }

    fn fail(&mut self, error: SessionError) -> Disposition {
        let Some(mut session) = self.session.take() else {
            return Disposition::Ignored;
        };
        if let Err(e) = session.fail() {
            tracing::error!("{}", e);
        }

        let kind = error.kind();
        tracing::warn!(session = %session.id, ?kind, "Session failed: {}", error);
        self.publish(Some(session.id), SessionStage::Failed);
        self.services.presenter.failed(context(&session), &error);

        self.finish(session, SessionEnd::Failed(kind));
        Disposition::Applied
    }

    /// Explicit cancel from any live stage. Outstanding tasks are signalled
    /// and whatever they send back later is discarded.
    fn cancel_session(&mut self) -> Disposition {
        let Some(mut session) = self.session.take() else {
            return Disposition::Ignored;
        };
        self.selection.cancel();
        if let Err(e) = session.cancel() {
            tracing::error!("{}", e);
        }

        tracing::info!(session = %session.id, "Session cancelled");
        self.publish(Some(session.id), SessionStage::Cancelled);
        self.services.presenter.cancelled(context(&session));

        self.finish(session, SessionEnd::Cancelled);
        Disposition::Applied
    }

    fn finish(&mut self, session: Session, end: SessionEnd) {
        self.last_outcome = Some(SessionOutcome {
            session: session.id,
            end,
        });
        self.selection.reset();
        drop(session);
        self.publish(None, SessionStage::Idle);
    }

    fn publish(&self, session: Option<SessionId>, stage: SessionStage) {
        self.services.presenter.overlay().show_status(session, stage);
    }
}

fn context(session: &Session) -> PresentContext {
    PresentContext {
        session: session.id,
        region: session.region,
        started_at: session.started_at,
    }
}

async fn window_closes(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at.into()).await,
        None => std::future::pending().await,
    }
}
