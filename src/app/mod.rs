//! Application orchestration layer
//!
//! This module coordinates between input, domain, UI, and platform layers.
//! It manages the menu session and the main event loop.

pub mod controller;
pub mod session;
pub mod state;

pub use controller::{AppError, Controller};
pub use session::{MenuSession, SessionResponse};
pub use state::AppCommand;
