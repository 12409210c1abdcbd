use glance_types::{PointerEvent, SelectionRegion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Drag {
    anchor: (i32, i32),
    current: (i32, i32),
}

impl Drag {
    fn region(&self) -> SelectionRegion {
        SelectionRegion::from_corners(self.anchor, self.current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Inactive,
    /// `preview` is `None` until the pointer goes down
    Selecting { preview: Option<SelectionRegion> },
    Committed(SelectionRegion),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionUpdate {
    Preview(SelectionRegion),
    Committed(SelectionRegion),
    Cancelled,
    Ignored,
}

/// Turns a pointer drag into a committed region
#[derive(Debug, Clone)]
pub struct SelectionController {
    active: bool,
    drag: Option<Drag>,
    outcome: Option<SelectionUpdate>,
    min_size: u32,
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            active: false,
            drag: None,
            outcome: None,
            min_size: 1,
        }
    }

    pub fn state(&self) -> SelectionState {
        if self.active {
            return SelectionState::Selecting {
                preview: self.drag.map(|d| d.region()),
            };
        }

        match self.outcome {
            Some(SelectionUpdate::Committed(region)) => SelectionState::Committed(region),
            Some(SelectionUpdate::Cancelled) => SelectionState::Cancelled,
            _ => SelectionState::Inactive,
        }
    }

    pub fn is_selecting(&self) -> bool {
        self.active
    }

    /// Start a fresh selection. Regions narrower or shorter than `min_size`
    /// (never less than 1) commit as cancelled.
    pub fn begin(&mut self, min_size: u32) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.drag = None;
        self.outcome = None;
        self.min_size = min_size.max(1);
        true
    }

    pub fn on_pointer(&mut self, event: PointerEvent) -> SelectionUpdate {
        if !self.active {
            return SelectionUpdate::Ignored;
        }

        match event {
            PointerEvent::Down { x, y } => {
                let drag = Drag {
                    anchor: (x, y),
                    current: (x, y),
                };
                self.drag = Some(drag);
                SelectionUpdate::Preview(drag.region())
            }
            PointerEvent::Move { x, y } => match self.drag.as_mut() {
                Some(drag) => {
                    drag.current = (x, y);
                    SelectionUpdate::Preview(drag.region())
                }
                None => SelectionUpdate::Ignored,
            },
            PointerEvent::Up { x, y } => {
                let Some(mut drag) = self.drag.take() else {
                    return SelectionUpdate::Ignored;
                };
                drag.current = (x, y);
                let region = drag.region();

                let update = if region.width < self.min_size || region.height < self.min_size {
                    tracing::debug!("Selection {} below minimum size, dropping", region);
                    SelectionUpdate::Cancelled
                } else {
                    SelectionUpdate::Committed(region)
                };
                self.finish(update)
            }
        }
    }

    pub fn cancel(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.finish(SelectionUpdate::Cancelled);
        true
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn finish(&mut self, update: SelectionUpdate) -> SelectionUpdate {
        self.active = false;
        self.drag = None;
        self.outcome = Some(update);
        update
    }
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}
