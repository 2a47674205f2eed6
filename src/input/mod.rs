//! Global shortcut handling
//!
//! `hotkeys` owns the platform key grab, `registrar` drives its lifecycle.

pub mod hotkeys;
pub mod registrar;

pub use hotkeys::{
    ActionMode, ActivationCallback, BindingId, GlobalHotkeyHost, HostError, ShortcutHost,
};
pub use registrar::{RegistrationStatus, ShortcutRegistrar};
