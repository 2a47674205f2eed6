//! Power actions offered by the menu
//!
//! Each action has a stable symbolic id (the value handed to the action
//! executor), a user-facing label, a freedesktop icon name and the style
//! class of its tile or list button.

use std::fmt;

/// Icon of the panel indicator that opens the menu
pub const INDICATOR_ICON: &str = "system-shutdown-symbolic";

/// Kind of widget an action is drawn as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Cell of the tiled grid
    Tile,
    /// Row of the stacked list
    Button,
}

/// One of the four privileged operations the menu can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerAction {
    Suspend,
    Reboot,
    PowerOff,
    Logout,
}

impl PowerAction {
    /// All actions in menu order (row-major for the tiled layout)
    pub const ALL: [PowerAction; 4] = [
        PowerAction::Suspend,
        PowerAction::Reboot,
        PowerAction::PowerOff,
        PowerAction::Logout,
    ];

    /// Symbolic id understood by the action executor
    pub fn id(self) -> &'static str {
        match self {
            PowerAction::Suspend => "suspend",
            PowerAction::Reboot => "reboot",
            PowerAction::PowerOff => "poweroff",
            PowerAction::Logout => "logout",
        }
    }

    /// Label shown on the tile or row
    pub fn label(self) -> &'static str {
        match self {
            PowerAction::Suspend => "Suspend",
            PowerAction::Reboot => "Restart",
            PowerAction::PowerOff => "Power Off",
            PowerAction::Logout => "Log Out",
        }
    }

    /// Symbolic icon shown on the tile
    pub fn icon_name(self) -> &'static str {
        match self {
            PowerAction::Suspend => "media-playback-pause-symbolic",
            PowerAction::Reboot => "system-reboot-symbolic",
            PowerAction::PowerOff => "system-shutdown-symbolic",
            PowerAction::Logout => "system-log-out-symbolic",
        }
    }

    /// Style class of the widget, e.g. `restart-tile` or `restart-button`
    pub fn style_class(self, kind: EntryKind) -> &'static str {
        match (self, kind) {
            (PowerAction::Suspend, EntryKind::Tile) => "suspend-tile",
            (PowerAction::Suspend, EntryKind::Button) => "suspend-button",
            (PowerAction::Reboot, EntryKind::Tile) => "restart-tile",
            (PowerAction::Reboot, EntryKind::Button) => "restart-button",
            (PowerAction::PowerOff, EntryKind::Tile) => "poweroff-tile",
            (PowerAction::PowerOff, EntryKind::Button) => "poweroff-button",
            (PowerAction::Logout, EntryKind::Tile) => "logout-tile",
            (PowerAction::Logout, EntryKind::Button) => "logout-button",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_executor_verbs() {
        let ids: Vec<_> = PowerAction::ALL.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["suspend", "reboot", "poweroff", "logout"]);
        assert_eq!(PowerAction::PowerOff.to_string(), "poweroff");
    }

    #[test]
    fn labels_match_menu_wording() {
        let labels: Vec<_> = PowerAction::ALL.iter().map(|a| a.label()).collect();
        assert_eq!(labels, vec!["Suspend", "Restart", "Power Off", "Log Out"]);
    }

    #[test]
    fn icons_are_symbolic_theme_names() {
        assert_eq!(
            PowerAction::Suspend.icon_name(),
            "media-playback-pause-symbolic"
        );
        assert_eq!(PowerAction::PowerOff.icon_name(), INDICATOR_ICON);
        assert!(
            PowerAction::ALL
                .iter()
                .all(|a| a.icon_name().ends_with("-symbolic"))
        );
    }

    #[test]
    fn style_classes_follow_widget_kind() {
        assert_eq!(PowerAction::Reboot.style_class(EntryKind::Tile), "restart-tile");
        assert_eq!(
            PowerAction::Reboot.style_class(EntryKind::Button),
            "restart-button"
        );
        assert_eq!(PowerAction::Logout.style_class(EntryKind::Tile), "logout-tile");
        assert_eq!(
            PowerAction::Suspend.style_class(EntryKind::Button),
            "suspend-button"
        );
    }
}
