use std::time::Instant;

use anyhow::{Context, Result};
use glance_config::hotkey::HotkeyConfig;
use glance_types::{HotkeyKey, KeyEvent};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

/// What the OS hook reports after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeySignal {
    /// Activation or cancel key transition, fed to the double-press detector
    Key(KeyEvent),
    /// Manual trigger pressed
    Manual,
}

/// Owns the global hotkey registrations for the lifetime of the listener
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    activation: HotKey,
    cancel: Option<HotKey>,
    manual: Option<HotKey>,
}

fn parse(binding: &str) -> Result<HotKey> {
    binding
        .parse::<HotKey>()
        .with_context(|| format!("Invalid hotkey '{}'", binding))
}

impl HotkeyManager {
    /// Register every binding named in the config
    pub fn register(config: &HotkeyConfig) -> Result<Self> {
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;

        let activation = parse(&config.activation)?;
        let cancel = config.cancel.as_deref().map(parse).transpose()?;
        let manual = config.manual_trigger.as_deref().map(parse).transpose()?;

        for hotkey in [Some(activation), cancel, manual].into_iter().flatten() {
            manager
                .register(hotkey)
                .with_context(|| format!("Failed to register hotkey {:?}", hotkey))?;
        }

        Ok(Self {
            manager,
            activation,
            cancel,
            manual,
        })
    }

    /// Next pending signal, if any (non-blocking)
    pub fn poll(&self) -> Option<HotkeySignal> {
        let receiver = GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.try_recv() {
            match self.classify(event.id, event.state, Instant::now()) {
                Some(signal) => return Some(signal),
                None => tracing::trace!("Hotkey event for unknown id {}", event.id),
            }
        }
        None
    }

    fn classify(&self, id: u32, state: HotKeyState, at: Instant) -> Option<HotkeySignal> {
        let pressed = state == HotKeyState::Pressed;

        if id == self.activation.id() {
            return Some(HotkeySignal::Key(KeyEvent {
                key: HotkeyKey::Activation,
                pressed,
                at,
            }));
        }

        if self.cancel.is_some_and(|h| h.id() == id) {
            return Some(HotkeySignal::Key(KeyEvent {
                key: HotkeyKey::Cancel,
                pressed,
                at,
            }));
        }

        // Manual trigger fires on press only
        if self.manual.is_some_and(|h| h.id() == id) && pressed {
            return Some(HotkeySignal::Manual);
        }

        None
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        for hotkey in [Some(self.activation), self.cancel, self.manual].into_iter().flatten() {
            let _ = self.manager.unregister(hotkey);
        }
    }
}
