pub mod coordinator;
pub mod error;
pub mod hotkey;
pub mod presenter;
pub mod selection;
pub mod session;

pub use coordinator::{
    CoordinatorEvent, Disposition, Services, SessionCoordinator, SessionEnd, SessionOutcome,
};
pub use error::SessionError;
pub use hotkey::{DetectorState, HotkeyDetector, HotkeyOutcome};
pub use presenter::{Overlay, PresentContext, ResultPresenter};
pub use selection::{SelectionController, SelectionState, SelectionUpdate};
pub use session::{Session, SessionSettings, TransitionError};

#[cfg(test)]
mod tests;
