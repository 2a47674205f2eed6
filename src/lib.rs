//! Power Dial
//!
//! A small power menu (Suspend, Restart, Power Off, Log Out) opened from a
//! global keyboard shortcut or a status indicator. The menu is either a
//! stacked list or a two-column tile grid with full keyboard navigation.
//!
//! Layers:
//! - `domain`: actions, grid focus navigation, key mapping, accelerators
//! - `runtime`: the timer queue driving delayed work on the loop thread
//! - `input`: global shortcut host and registration lifecycle
//! - `config`: persistent settings with change notification
//! - `ui`: presentation seam and the terminal implementation
//! - `platform`: power action executors
//! - `app`: menu session and the controller tying it all together

pub mod app;
pub mod config;
pub mod domain;
pub mod input;
pub mod logging;
pub mod platform;
pub mod runtime;
pub mod ui;

pub use app::controller::{AppError, Controller};
