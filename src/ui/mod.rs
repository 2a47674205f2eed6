//! User interface layer
//!
//! `presentation` defines what the menu needs from a UI, `terminal` provides
//! it on top of crossterm.

pub mod presentation;
pub mod terminal;

pub use presentation::{Presentation, SurfaceLayout, UiEvent};
pub use terminal::TerminalPresentation;
