//! Grid focus controller for the tiled menu layout
//!
//! Tiles are laid out row-major in rows of `row_width`. The controller keeps
//! the index of the focused tile and reports every focus change to a
//! [`FocusSink`] so the presentation layer can move its visual marker.
//!
//! Navigation is total over any non-empty tile set: horizontal moves wrap
//! through the whole sequence, vertical moves wrap within the current column
//! to the opposite extreme row that has a tile in that column. The last row
//! may be partially filled.

use crate::domain::action::PowerAction;
use crate::domain::keyboard::Step;

/// Errors that can occur when building a grid
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Empty tile set or a row width of zero
    #[error("invalid grid layout: {tiles} tiles with row width {row_width}")]
    InvalidLayout { tiles: usize, row_width: usize },
}

/// Opaque handle to a tile widget owned by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileHandle(pub u32);

/// Receives focus marker changes
pub trait FocusSink {
    /// Marks the tile as focused (and gives it keyboard focus)
    fn set_focused(&mut self, tile: TileHandle);
    /// Removes the focused marker from the tile
    fn clear_focused(&mut self, tile: TileHandle);
}

/// Grid coordinates representing (row, col) position
///
/// Uses zero-based indexing starting from top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCoords {
    pub row: usize,
    pub col: usize,
}

impl GridCoords {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A selectable menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    index: usize,
    handle: TileHandle,
    action: PowerAction,
}

impl Tile {
    /// Creates a tile; its index is assigned when the grid is built
    pub fn new(handle: TileHandle, action: PowerAction) -> Self {
        Self {
            index: 0,
            handle,
            action,
        }
    }

    /// Position in creation order, stable for the session
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn handle(&self) -> TileHandle {
        self.handle
    }

    pub fn action(&self) -> PowerAction {
        self.action
    }
}

/// Keyboard focus state for a grid of tiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFocus {
    tiles: Vec<Tile>,
    row_width: usize,
    focused: Option<usize>,
}

impl GridFocus {
    /// Creates a controller for the given tiles; nothing is focused yet
    ///
    /// # Arguments
    /// * `tiles` - Tiles in creation (row-major) order
    /// * `row_width` - Number of tiles per row (must be > 0)
    ///
    /// # Returns
    /// A new GridFocus or `GridError::InvalidLayout` for an empty tile set
    /// or a zero row width
    pub fn new(tiles: Vec<Tile>, row_width: usize) -> Result<Self, GridError> {
        if tiles.is_empty() || row_width == 0 {
            return Err(GridError::InvalidLayout {
                tiles: tiles.len(),
                row_width,
            });
        }

        let tiles = tiles
            .into_iter()
            .enumerate()
            .map(|(index, tile)| Tile { index, ..tile })
            .collect();

        Ok(Self {
            tiles,
            row_width,
            focused: None,
        })
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    /// Returns the focused tile, if any
    pub fn focused_tile(&self) -> Option<&Tile> {
        self.focused.and_then(|index| self.tiles.get(index))
    }

    /// Looks up a tile by its presentation handle
    pub fn tile_for(&self, handle: TileHandle) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.handle == handle)
    }

    /// Row/column of a tile index
    pub fn coords_of(&self, index: usize) -> GridCoords {
        GridCoords::new(index / self.row_width, index % self.row_width)
    }

    /// Number of rows, counting a partially filled last row
    pub fn row_count(&self) -> usize {
        self.tiles.len().div_ceil(self.row_width)
    }

    /// Focuses the first tile
    ///
    /// Does nothing if tile 0 already holds focus.
    pub fn focus_first(&mut self, sink: &mut impl FocusSink) {
        if self.tiles.is_empty() || self.focused == Some(0) {
            return;
        }
        self.move_focus(0, sink);
    }

    /// Moves focus one tile left or right, wrapping through the whole sequence
    ///
    /// Moving forward from the last tile lands on the first tile and vice versa.
    /// When nothing is focused yet, the move starts from tile 0.
    pub fn move_horizontal(&mut self, step: Step, sink: &mut impl FocusSink) {
        if self.tiles.is_empty() {
            return;
        }

        let len = self.tiles.len() as isize;
        let current = self.focused.unwrap_or(0) as isize;
        let target = (current + step.offset()).rem_euclid(len) as usize;
        self.move_focus(target, sink);
    }

    /// Moves focus one row up or down within the current column
    ///
    /// If the neighbouring row has no tile in this column (edge of the grid or
    /// a dangling last row), focus wraps to the opposite extreme row that does.
    pub fn move_vertical(&mut self, step: Step, sink: &mut impl FocusSink) {
        if self.tiles.is_empty() {
            return;
        }

        let current = self.focused.unwrap_or(0);
        let target = self.vertical_target(current, step);
        self.move_focus(target, sink);
    }

    /// Clears the focus marker and drops all tiles
    ///
    /// Safe to call more than once.
    pub fn dispose(&mut self, sink: &mut impl FocusSink) {
        if let Some(tile) = self.focused_tile() {
            sink.clear_focused(tile.handle);
        }
        self.focused = None;
        self.tiles.clear();
    }

    fn vertical_target(&self, from: usize, step: Step) -> usize {
        let len = self.tiles.len();
        let GridCoords { row, col } = self.coords_of(from);

        let neighbour = match step {
            Step::Backward => row.checked_sub(1),
            Step::Forward => Some(row + 1),
        };
        if let Some(index) = neighbour.map(|r| r * self.row_width + col) {
            if index < len {
                return index;
            }
        }

        // `col <= from < len`, so the column is populated in row 0
        match step {
            Step::Backward => ((len - 1 - col) / self.row_width) * self.row_width + col,
            Step::Forward => col,
        }
    }

    fn move_focus(&mut self, target: usize, sink: &mut impl FocusSink) {
        if self.focused == Some(target) {
            return;
        }
        if let Some(previous) = self.focused_tile() {
            sink.clear_focused(previous.handle);
        }
        self.focused = Some(target);
        sink.set_focused(self.tiles[target].handle);
    }
}
