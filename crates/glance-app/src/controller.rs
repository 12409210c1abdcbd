use std::sync::Arc;

use anyhow::Context;
use glance_config::Config;
use glance_core::{CoordinatorEvent, Overlay, ResultPresenter, Services, SessionCoordinator};
use glance_io::SystemClipboard;
use glance_ocr::{OcrEngineAdapter, TesseractBackend, XcapCapture};
use glance_translator::{OllamaBackend, TranslationClient};
use glance_types::{ActivationSource, SelectionRegion};
use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::io::{hotkey_listener, spawn_command_reader};
use crate::state::AppState;
use crate::ui::{OverlayMessage, TerminalOverlay, drag_over, overlay_loop};

/// Centralized channel management
pub struct ChannelSet {
    pub coordinator: (AsyncSender<CoordinatorEvent>, AsyncReceiver<CoordinatorEvent>),
    pub overlay: (AsyncSender<OverlayMessage>, AsyncReceiver<OverlayMessage>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            coordinator: kanal::bounded_async(64), // input events + worker results
            overlay: kanal::bounded_async(256),
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub hotkeys: bool,
    pub commands: bool,
    /// Run a single session over this region, then stop
    pub one_shot: Option<SelectionRegion>,
}

/// Wire the real collaborators from a config snapshot
pub fn build_services(config: &Config, overlay: Arc<dyn Overlay>) -> anyhow::Result<Services> {
    let backend = OllamaBackend::new(&config.translator.base_url)
        .context("Translation endpoint rejected")?;
    let translator = TranslationClient::new(Arc::new(backend), config.translator.timeout())
        .with_script_validation(config.translator.validate_script);

    let ocr = OcrEngineAdapter::new(
        Arc::new(TesseractBackend::from_config(&config.ocr)),
        config.ocr.modes.clone(),
    );

    let clipboard = SystemClipboard::new()?;

    Ok(Services {
        capture: Arc::new(XcapCapture),
        ocr: Arc::new(ocr),
        translator: Arc::new(translator),
        presenter: ResultPresenter::new(Arc::new(clipboard), overlay),
    })
}

/// Warn about missing external dependencies; never fatal
pub async fn startup_checks(services: &Services) {
    let ocr = services.ocr.clone();
    match tokio::task::spawn_blocking(move || ocr.is_available()).await {
        Ok(true) => tracing::info!("Tesseract OCR available"),
        Ok(false) => tracing::warn!(
            "Tesseract OCR not found; sessions will fail until it is installed and on PATH"
        ),
        Err(e) => tracing::warn!("OCR check failed: {}", e),
    }

    let backend = services.translator.backend();
    let meta = backend.metadata();
    if backend.health_check().await {
        tracing::info!("{} reachable at {}", meta.name, meta.endpoint);
    } else {
        tracing::warn!(
            "{} not reachable at {}; start it with `ollama serve`",
            meta.name,
            meta.endpoint
        );
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            channels: ChannelSet::new(),
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub async fn spawn_tasks(
        &self,
        options: RunOptions,
    ) -> anyhow::Result<JoinSet<anyhow::Result<()>>> {
        let config = self.state.config.read().await.clone();
        let mut tasks = JoinSet::new();
        tracing::debug!("Settings profile at {}", self.state.settings_path.display());

        let overlay = Arc::new(TerminalOverlay::new(self.channels.overlay.0.clone()));
        let services = build_services(&config, overlay)?;
        startup_checks(&services).await;

        let coordinator = SessionCoordinator::new(
            self.state.config.clone(),
            services,
            self.channels.coordinator.0.clone(),
        )
        .await;

        // Coordination path
        tasks.spawn(coordinator.run(
            self.channels.coordinator.1.clone(),
            self.cancel_token.child_token(),
        ));

        // Overlay printer
        tasks.spawn(overlay_loop(
            self.channels.overlay.1.clone(),
            self.state.config.clone(),
            options.one_shot.map(|_| self.cancel_token.clone()),
            self.cancel_token.child_token(),
        ));

        if options.hotkeys {
            tasks.spawn(hotkey_listener(
                config.hotkey.clone(),
                self.cancel_token.child_token(),
                self.channels.coordinator.0.clone(),
            ));
        }

        if let Some(region) = options.one_shot {
            tracing::info!("One-shot session over {}", region);
            let tx = &self.channels.coordinator.0;
            tx.send(CoordinatorEvent::Activate(ActivationSource::Manual))
                .await?;
            for event in drag_over(region) {
                tx.send(event).await?;
            }
        } else if options.commands {
            spawn_command_reader(self.channels.coordinator.0.clone(), self.cancel_token.clone())
                .context("Failed to start command reader")?;
        }

        Ok(tasks)
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
