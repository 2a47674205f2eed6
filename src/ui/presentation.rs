//! Presentation seam
//!
//! The menu logic never draws anything itself. It asks a [`Presentation`] for
//! a surface, a tile or row per action and focus marker updates, and receives
//! user input back as [`UiEvent`]s.

use std::io;
use std::time::Duration;

use crate::domain::action::PowerAction;
use crate::domain::grid::{FocusSink, TileHandle};
use crate::domain::keyboard::KeyInput;

/// How the entries of a surface are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceLayout {
    /// Tiles in rows of `row_width`
    Grid { row_width: usize },
    /// One full-width row per entry
    List,
}

/// User input delivered to the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// Key press while the menu surface is up
    Key(KeyInput),
    /// Pointer click on a tile or row
    Click(TileHandle),
    /// The surface's Cancel button
    Cancel,
    /// The panel indicator was activated
    OpenRequested,
    Quit,
}

pub trait Presentation: FocusSink {
    /// Shows the modal surface with `title`
    fn open_surface(&mut self, title: &str, layout: SurfaceLayout);

    /// Adds a grid tile for `action`
    fn add_tile(&mut self, action: PowerAction) -> TileHandle;

    /// Adds a list row for `action`
    fn add_row(&mut self, action: PowerAction) -> TileHandle;

    /// Tears the surface down; no-op without one
    fn close_surface(&mut self);

    fn show_indicator(&mut self);
    fn hide_indicator(&mut self);

    /// Waits up to `timeout` for user input
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<UiEvent>>;
}
