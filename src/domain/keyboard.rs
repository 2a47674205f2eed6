//! Keyboard input mapping for tile navigation
//!
//! This module turns platform-neutral key presses into commands for the
//! focused tile. It's completely pure and testable without a display.
//!
//! ## Key bindings
//! - **Left / Shift+Tab**: previous tile (wraps through the whole grid)
//! - **Right / Tab**: next tile
//! - **Up / Down**: previous / next row in the same column
//! - **Return / keypad Enter**: run the focused tile's action
//! - **Escape**: cancel the dialog

/// Direction of a single navigation step along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Backward,
    Forward,
}

impl Step {
    /// Signed offset of this step (-1 or +1)
    pub fn offset(self) -> isize {
        match self {
            Step::Backward => -1,
            Step::Forward => 1,
        }
    }
}

/// Navigation direction for arrow keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Key presses the menu reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Left,
    Right,
    Up,
    Down,
    Tab,
    /// Shift+Tab (ISO_Left_Tab)
    BackTab,
    Return,
    KeypadEnter,
    Escape,
    /// Anything else; propagated untouched
    Other,
}

/// What a key press asks the focused tile to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCommand {
    Horizontal(Step),
    Vertical(Step),
    Activate,
    Cancel,
}

impl NavigationDirection {
    /// Converts an arrow direction into the axis step it represents
    pub fn command(self) -> TileCommand {
        match self {
            NavigationDirection::Left => TileCommand::Horizontal(Step::Backward),
            NavigationDirection::Right => TileCommand::Horizontal(Step::Forward),
            NavigationDirection::Up => TileCommand::Vertical(Step::Backward),
            NavigationDirection::Down => TileCommand::Vertical(Step::Forward),
        }
    }
}

impl KeyInput {
    /// Maps a key press to a tile command
    ///
    /// # Returns
    /// `None` when the key should propagate to the surface instead of being
    /// consumed by the tile.
    pub fn tile_command(self) -> Option<TileCommand> {
        match self {
            KeyInput::Left | KeyInput::BackTab => Some(NavigationDirection::Left.command()),
            KeyInput::Right | KeyInput::Tab => Some(NavigationDirection::Right.command()),
            KeyInput::Up => Some(NavigationDirection::Up.command()),
            KeyInput::Down => Some(NavigationDirection::Down.command()),
            KeyInput::Return | KeyInput::KeypadEnter => Some(TileCommand::Activate),
            KeyInput::Escape => Some(TileCommand::Cancel),
            KeyInput::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_keys_move_horizontally() {
        assert_eq!(
            KeyInput::Tab.tile_command(),
            Some(TileCommand::Horizontal(Step::Forward))
        );
        assert_eq!(
            KeyInput::BackTab.tile_command(),
            Some(TileCommand::Horizontal(Step::Backward))
        );
    }

    #[test]
    fn arrows_map_to_axes() {
        assert_eq!(
            KeyInput::Left.tile_command(),
            Some(TileCommand::Horizontal(Step::Backward))
        );
        assert_eq!(
            KeyInput::Up.tile_command(),
            Some(TileCommand::Vertical(Step::Backward))
        );
        assert_eq!(
            KeyInput::Down.tile_command(),
            Some(TileCommand::Vertical(Step::Forward))
        );
    }

    #[test]
    fn both_enter_keys_activate() {
        assert_eq!(KeyInput::Return.tile_command(), Some(TileCommand::Activate));
        assert_eq!(KeyInput::KeypadEnter.tile_command(), Some(TileCommand::Activate));
    }

    #[test]
    fn unrelated_keys_propagate() {
        assert_eq!(KeyInput::Other.tile_command(), None);
    }

    #[test]
    fn step_offsets() {
        assert_eq!(Step::Backward.offset(), -1);
        assert_eq!(Step::Forward.offset(), 1);
    }
}
