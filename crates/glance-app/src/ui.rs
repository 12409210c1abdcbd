use std::str::FromStr;
use std::sync::Arc;

use glance_config::Config;
use glance_core::{CoordinatorEvent, Overlay};
use glance_types::{
    ActivationSource, ClipboardStatus, PointerEvent, Presentation, SelectionRegion, SessionId,
    SessionReport, SessionStage,
};
use kanal::{AsyncReceiver, AsyncSender};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// What the coordinator asks the presentation layer to show
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayMessage {
    Selection(SelectionRegion),
    Status {
        session: Option<SessionId>,
        stage: SessionStage,
    },
    Result(Presentation),
}

/// Overlay that forwards to the terminal printer without waiting
pub struct TerminalOverlay {
    tx: AsyncSender<OverlayMessage>,
}

impl TerminalOverlay {
    pub fn new(tx: AsyncSender<OverlayMessage>) -> Self {
        Self { tx }
    }

    fn forward(&self, message: OverlayMessage) {
        match self.tx.try_send(message) {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Overlay queue full, dropping update"),
            Err(e) => tracing::debug!("Overlay closed: {}", e),
        }
    }
}

impl Overlay for TerminalOverlay {
    fn show_selection(&self, preview: SelectionRegion) {
        self.forward(OverlayMessage::Selection(preview));
    }

    fn show_status(&self, session: Option<SessionId>, stage: SessionStage) {
        self.forward(OverlayMessage::Status { session, stage });
    }

    fn show_result(&self, presentation: &Presentation) {
        self.forward(OverlayMessage::Result(presentation.clone()));
    }
}

pub fn render(message: &OverlayMessage, show_source_text: bool) -> String {
    match message {
        OverlayMessage::Selection(region) => format!("  selecting {}", region),
        OverlayMessage::Status {
            session: Some(id),
            stage,
        } => format!("[{}] {}", id, stage.label()),
        OverlayMessage::Status {
            session: None,
            stage,
        } => stage.label().to_string(),
        OverlayMessage::Result(presentation) => render_report(presentation, show_source_text),
    }
}

fn render_report(presentation: &Presentation, show_source_text: bool) -> String {
    let id = presentation.session;
    match &presentation.report {
        SessionReport::Translated {
            source_text,
            text,
            model,
            clipboard,
        } => {
            let mut out = String::new();
            if show_source_text {
                out.push_str(&format!("[{}] Source: {}\n", id, source_text));
            }
            out.push_str(&format!("[{}] Translation ({}): {}", id, model, text));
            match clipboard {
                ClipboardStatus::Copied => out.push_str("\n  copied to clipboard"),
                ClipboardStatus::Failed(reason) => {
                    out.push_str(&format!("\n  copy failed: {}", reason))
                }
            }
            out
        }
        SessionReport::Failed { message, .. } => format!("[{}] Error: {}", id, message),
        SessionReport::Cancelled => format!("[{}] Cancelled", id),
    }
}

/// Print overlay messages. With `stop_after_result` set, the first result
/// cancels that token (one-shot mode).
pub async fn overlay_loop(
    rx: AsyncReceiver<OverlayMessage>,
    config: Arc<RwLock<Config>>,
    stop_after_result: Option<CancellationToken>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = rx.recv() => message?,
        };

        let show_source_text = config.read().await.ui.show_source_text;
        println!("{}", render(&message, show_source_text));

        if let OverlayMessage::Result(_) = message
            && let Some(token) = &stop_after_result
        {
            token.cancel();
        }
    }

    tracing::debug!("Overlay printer stopping");
    Ok(())
}

/// Line commands typed into the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Trigger,
    Drag { from: (i32, i32), to: (i32, i32) },
    Region(SelectionRegion),
    Cancel,
    Quit,
    Help,
}

pub const HELP: &str = "commands: trigger | drag x1 y1 x2 y2 | region x y w h | cancel | quit";

fn numbers<const N: usize>(args: &[&str]) -> Result<[i32; N], String> {
    if args.len() != N {
        return Err(format!("expected {} numbers, got {}", N, args.len()));
    }
    let mut out = [0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg
            .parse()
            .map_err(|_| format!("'{}' is not a number", arg))?;
    }
    Ok(out)
}

fn region_from(values: [i32; 4]) -> Result<SelectionRegion, String> {
    let [x, y, w, h] = values;
    if w < 0 || h < 0 {
        return Err("width and height must not be negative".to_string());
    }
    Ok(SelectionRegion::new(x, y, w as u32, h as u32))
}

/// `x,y,w,h` (commas or spaces)
pub fn parse_region(s: &str) -> Result<SelectionRegion, String> {
    let parts: Vec<&str> = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    region_from(numbers::<4>(&parts)?)
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((name, args)) = words.split_first() else {
            return Err("empty command".to_string());
        };

        match name.to_ascii_lowercase().as_str() {
            "trigger" | "t" => Ok(Command::Trigger),
            "drag" => {
                let [x1, y1, x2, y2] = numbers::<4>(args)?;
                Ok(Command::Drag {
                    from: (x1, y1),
                    to: (x2, y2),
                })
            }
            "region" | "r" => Ok(Command::Region(region_from(numbers::<4>(args)?)?)),
            "cancel" | "c" => Ok(Command::Cancel),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            "help" | "?" => Ok(Command::Help),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Pointer drag from one corner of `region` to the other
pub fn drag_over(region: SelectionRegion) -> Vec<CoordinatorEvent> {
    let (x, y) = (region.x, region.y);
    let right = x.saturating_add_unsigned(region.width);
    let bottom = y.saturating_add_unsigned(region.height);
    vec![
        CoordinatorEvent::Pointer(PointerEvent::Down { x, y }),
        CoordinatorEvent::Pointer(PointerEvent::Up { x: right, y: bottom }),
    ]
}

impl Command {
    /// Coordinator events this command stands for
    pub fn events(self) -> Vec<CoordinatorEvent> {
        match self {
            Command::Trigger => vec![CoordinatorEvent::Activate(ActivationSource::Manual)],
            Command::Drag { from, to } => vec![
                CoordinatorEvent::Pointer(PointerEvent::Down {
                    x: from.0,
                    y: from.1,
                }),
                CoordinatorEvent::Pointer(PointerEvent::Move { x: to.0, y: to.1 }),
                CoordinatorEvent::Pointer(PointerEvent::Up { x: to.0, y: to.1 }),
            ],
            Command::Region(region) => {
                let mut events = vec![CoordinatorEvent::Activate(ActivationSource::Manual)];
                events.extend(drag_over(region));
                events
            }
            Command::Cancel => vec![CoordinatorEvent::Cancel],
            Command::Quit | Command::Help => Vec::new(),
        }
    }
}
