//! User-facing configuration
//!
//! Settings live in a small JSON file that other tools may edit while the
//! menu is running.

pub mod settings;

pub use settings::{
    ChangeHandler, HandlerId, JsonSettings, Settings, SettingsError, SettingsStore, ViewMode,
    SHORTCUT, SHOW_TOP_BAR_ICON, VIEW_MODE,
};
