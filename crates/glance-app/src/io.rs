use std::io::BufRead;
use std::thread;
use std::time::Duration;

use glance_config::hotkey::HotkeyConfig;
use glance_core::CoordinatorEvent;
use glance_ocr::{HotkeyManager, HotkeySignal};
use glance_types::{ActivationSource, HotkeyKey};
use kanal::AsyncSender;
use tokio_util::sync::CancellationToken;

use crate::ui::{Command, HELP};

const HOTKEY_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Cancel requests must reach the coordinator even when the inbox is full
fn must_deliver(event: &CoordinatorEvent) -> bool {
    match event {
        CoordinatorEvent::Cancel => true,
        CoordinatorEvent::Key(key) => key.key == HotkeyKey::Cancel && key.pressed,
        _ => false,
    }
}

/// Push an event from a plain thread; false once the coordinator is gone
pub(crate) fn forward(tx: &AsyncSender<CoordinatorEvent>, event: CoordinatorEvent) -> bool {
    if must_deliver(&event) {
        return match tx.as_sync().send(event) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Coordinator inbox closed: {}", e);
                false
            }
        };
    }

    match tx.try_send(event) {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!("Coordinator inbox full, dropping input event");
            true
        }
        Err(e) => {
            tracing::debug!("Coordinator inbox closed: {}", e);
            false
        }
    }
}

/// Register the global hotkeys and feed their transitions to the coordinator
pub async fn hotkey_listener(
    config: HotkeyConfig,
    cancel: CancellationToken,
    tx: AsyncSender<CoordinatorEvent>,
) -> anyhow::Result<()> {
    let worker = tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let manager = HotkeyManager::register(&config)?;
        tracing::info!(
            "Hotkeys registered: double-press {}, cancel {}, manual {}",
            config.activation,
            config.cancel.as_deref().unwrap_or("-"),
            config.manual_trigger.as_deref().unwrap_or("-")
        );

        while !cancel.is_cancelled() {
            while let Some(signal) = manager.poll() {
                let event = match signal {
                    HotkeySignal::Key(key) => CoordinatorEvent::Key(key),
                    HotkeySignal::Manual => CoordinatorEvent::Activate(ActivationSource::Manual),
                };
                if !forward(&tx, event) {
                    return Ok(());
                }
            }
            thread::sleep(HOTKEY_POLL_INTERVAL);
        }

        tracing::info!("Hotkey listener stopping");
        Ok(())
    });

    worker.await?
}

/// Read terminal commands on a dedicated thread. The thread is never joined;
/// a blocked stdin read must not hold up shutdown.
pub fn spawn_command_reader(
    tx: AsyncSender<CoordinatorEvent>,
    quit: CancellationToken,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("glance-commands".into())
        .spawn(move || {
            println!("{}", HELP);
            let stdin = std::io::stdin();

            for line in stdin.lock().lines() {
                if quit.is_cancelled() {
                    break;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("stdin read failed: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<Command>() {
                    Ok(Command::Quit) => {
                        quit.cancel();
                        break;
                    }
                    Ok(Command::Help) => println!("{}", HELP),
                    Ok(command) => {
                        for event in command.events() {
                            if !forward(&tx, event) {
                                return;
                            }
                        }
                    }
                    Err(e) => println!("{} ({})", e, HELP),
                }
            }

            tracing::debug!("Command reader stopping");
        })
}
