use std::sync::Arc;
use std::time::SystemTime;

use glance_io::ClipboardWriter;
use glance_translator::Translation;
use glance_types::{
    ClipboardStatus, Presentation, SelectionRegion, SessionId, SessionReport, SessionStage,
};

use crate::error::SessionError;

/// Presentation layer. Calls must return promptly.
pub trait Overlay: Send + Sync {
    fn show_selection(&self, preview: SelectionRegion);

    fn show_status(&self, session: Option<SessionId>, stage: SessionStage);

    fn show_result(&self, presentation: &Presentation);
}

/// Where and when the finished session came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentContext {
    pub session: SessionId,
    pub region: Option<SelectionRegion>,
    pub started_at: SystemTime,
}

pub struct ResultPresenter {
    clipboard: Arc<dyn ClipboardWriter>,
    overlay: Arc<dyn Overlay>,
}

impl ResultPresenter {
    pub fn new(clipboard: Arc<dyn ClipboardWriter>, overlay: Arc<dyn Overlay>) -> Self {
        Self { clipboard, overlay }
    }

    pub fn overlay(&self) -> &dyn Overlay {
        self.overlay.as_ref()
    }

    /// Copy then display. A failed copy is reported alongside the text.
    pub fn translated(
        &self,
        ctx: PresentContext,
        source_text: String,
        translation: Translation,
    ) -> Presentation {
        let clipboard = match self.clipboard.write_text(&translation.text) {
            Ok(()) => ClipboardStatus::Copied,
            Err(e) => {
                tracing::warn!(session = %ctx.session, "Clipboard write failed: {:#}", e);
                ClipboardStatus::Failed(e.to_string())
            }
        };

        self.show(
            ctx,
            SessionReport::Translated {
                source_text,
                text: translation.text,
                model: translation.model,
                clipboard,
            },
        )
    }

    pub fn failed(&self, ctx: PresentContext, error: &SessionError) -> Presentation {
        let kind = error.kind();
        self.show(
            ctx,
            SessionReport::Failed {
                kind,
                message: format!("{} ({})", kind.user_message(), error),
            },
        )
    }

    pub fn cancelled(&self, ctx: PresentContext) -> Presentation {
        self.show(ctx, SessionReport::Cancelled)
    }

    fn show(&self, ctx: PresentContext, report: SessionReport) -> Presentation {
        let presentation = Presentation {
            session: ctx.session,
            region: ctx.region,
            started_at: ctx.started_at,
            report,
        };
        self.overlay.show_result(&presentation);
        presentation
    }
}
