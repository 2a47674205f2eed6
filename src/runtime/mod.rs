//! Event-loop plumbing shared by the registrar, the menu session and the
//! controller.

pub mod timer;

pub use timer::{Scheduler, TimerGuard};

/// Delayed work the event loop can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Retry a failed shortcut registration
    RetryRegistration { attempt: u32, generation: u64 },
    /// Give the first tile keyboard focus once the surface has laid out
    SettleFocus { session: u64 },
    /// Check the settings file for external edits
    ReloadSettings,
}
