use std::sync::Mutex;

use anyhow::{Context, anyhow};
use arboard::Clipboard;

/// Sink for a finished translation
pub trait ClipboardWriter: Send + Sync {
    fn write_text(&self, text: &str) -> anyhow::Result<()>;
}

/// The OS clipboard through arboard
pub struct SystemClipboard {
    inner: Mutex<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> anyhow::Result<Self> {
        let clipboard = Clipboard::new().context("Failed to open the system clipboard")?;
        Ok(Self {
            inner: Mutex::new(clipboard),
        })
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> anyhow::Result<()> {
        let mut clipboard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("clipboard lock poisoned"))?;

        clipboard
            .set_text(text.to_owned())
            .context("Failed to write to the clipboard")?;

        tracing::debug!("Copied {} chars to clipboard", text.chars().count());
        Ok(())
    }
}
