//! Power action execution
//!
//! The menu only hands a [`PowerAction`] to an [`ActionExecutor`]; whether
//! the operation succeeded is reported through the log, never back to the
//! caller.

#[cfg(not(windows))]
pub mod linux;
#[cfg(windows)]
pub mod win32;

use std::io;
use std::process::ExitStatus;

use crate::domain::action::PowerAction;

#[cfg(not(windows))]
pub use linux::LinuxExecutor as SystemExecutor;
#[cfg(windows)]
pub use win32::WindowsExecutor as SystemExecutor;

/// Performs privileged power operations
pub trait ActionExecutor {
    /// Starts `action`; completion is not awaited
    fn execute(&self, action: PowerAction);
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("no command available for {0}")]
    Unsupported(PowerAction),

    #[error("system call failed: {0}")]
    System(String),
}

/// Executor that only logs the action it would have performed
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor;

impl ActionExecutor for DryRunExecutor {
    fn execute(&self, action: PowerAction) {
        tracing::info!(action = %action.id(), "dry run, not executing power action");
    }
}
