use std::time::{Duration, Instant};

use glance_config::hotkey::HotkeyConfig;
use glance_types::{HotkeyKey, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    PendingSecondPress { first_at: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyOutcome {
    /// Second press landed inside the window
    Activate,
    /// First press seen, waiting for the second
    Armed,
    /// Pending press dropped by the cancel key
    Reset,
    Ignored,
}

/// Double-press recognizer for the activation key.
///
/// The timer is evaluated against event timestamps, so the detector holds a
/// single `Instant` at most and never schedules anything itself. The
/// coordinator sleeps until [`HotkeyDetector::deadline`] and calls `expire`.
#[derive(Debug, Clone)]
pub struct HotkeyDetector {
    state: DetectorState,
    threshold: Duration,
    min_interval: Duration,
}

impl HotkeyDetector {
    pub fn new(threshold: Duration, min_interval: Duration) -> Self {
        Self {
            state: DetectorState::Idle,
            threshold,
            min_interval,
        }
    }

    pub fn from_config(config: &HotkeyConfig) -> Self {
        Self::new(config.double_press_threshold(), config.min_press_interval())
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// When a pending first press lapses, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DetectorState::Idle => None,
            DetectorState::PendingSecondPress { first_at } => Some(first_at + self.threshold),
        }
    }

    /// Drop a pending first press whose window has elapsed by `now`
    pub fn expire(&mut self, now: Instant) -> bool {
        if let DetectorState::PendingSecondPress { first_at } = self.state
            && now.saturating_duration_since(first_at) >= self.threshold
        {
            tracing::trace!("Double press window elapsed");
            self.state = DetectorState::Idle;
            return true;
        }
        false
    }

    pub fn on_key(&mut self, event: KeyEvent) -> HotkeyOutcome {
        if !event.pressed {
            return HotkeyOutcome::Ignored;
        }

        match event.key {
            HotkeyKey::Cancel => {
                if self.state == DetectorState::Idle {
                    return HotkeyOutcome::Ignored;
                }
                self.state = DetectorState::Idle;
                HotkeyOutcome::Reset
            }
            HotkeyKey::Activation => {
                self.expire(event.at);

                match self.state {
                    DetectorState::Idle => {
                        self.state = DetectorState::PendingSecondPress { first_at: event.at };
                        HotkeyOutcome::Armed
                    }
                    DetectorState::PendingSecondPress { first_at } => {
                        if event.at.saturating_duration_since(first_at) < self.min_interval {
                            // auto-repeat
                            return HotkeyOutcome::Ignored;
                        }
                        self.state = DetectorState::Idle;
                        HotkeyOutcome::Activate
                    }
                }
            }
            HotkeyKey::Other => HotkeyOutcome::Ignored,
        }
    }
}

impl Default for HotkeyDetector {
    fn default() -> Self {
        Self::from_config(&HotkeyConfig::default())
    }
}
