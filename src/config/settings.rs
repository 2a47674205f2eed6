//! Persistent user settings
//!
//! Three keys make up the schema:
//!
//! | key                 | type        | default               |
//! |---------------------|-------------|-----------------------|
//! | `view-mode`         | string      | `stacked`             |
//! | `show-top-bar-icon` | boolean     | `true`                |
//! | `shortcut`          | string list | `["<Super><Shift>p"]` |
//!
//! [`JsonSettings`] keeps them in a JSON file and notices edits made by other
//! processes through [`SettingsStore::refresh`].

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::domain::accelerator::validate_accelerator;

pub const VIEW_MODE: &str = "view-mode";
pub const SHOW_TOP_BAR_ICON: &str = "show-top-bar-icon";
pub const SHORTCUT: &str = "shortcut";

/// Default accelerator opening the menu
pub const DEFAULT_SHORTCUT: &str = "<Super><Shift>p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    String,
    Boolean,
    StringList,
}

impl ValueKind {
    fn name(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::StringList => "string list",
        }
    }
}

const SCHEMA: [(&str, ValueKind); 3] = [
    (VIEW_MODE, ValueKind::String),
    (SHOW_TOP_BAR_ICON, ValueKind::Boolean),
    (SHORTCUT, ValueKind::StringList),
];

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("unknown settings key '{0}'")]
    UnknownKey(String),

    #[error("settings key '{key}' holds a {actual}, not a {requested}")]
    TypeMismatch {
        key: String,
        requested: &'static str,
        actual: &'static str,
    },

    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("settings file error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identifier returned by [`SettingsStore::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Called with the name of the key that changed
pub type ChangeHandler = Box<dyn FnMut(&str)>;

/// Key/value access plus change notification
pub trait SettingsStore {
    fn get_string(&self, key: &str) -> Result<String, SettingsError>;
    fn get_boolean(&self, key: &str) -> Result<bool, SettingsError>;
    fn get_string_list(&self, key: &str) -> Result<Vec<String>, SettingsError>;

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
    fn set_boolean(&mut self, key: &str, value: bool) -> Result<(), SettingsError>;
    fn set_string_list(&mut self, key: &str, value: Vec<String>) -> Result<(), SettingsError>;

    /// Registers `handler` for changes of `key`; an empty key matches every key
    fn connect(&mut self, key: &str, handler: ChangeHandler) -> HandlerId;
    fn disconnect(&mut self, id: HandlerId);

    /// Picks up changes made outside this process
    fn refresh(&mut self) -> Result<(), SettingsError> {
        Ok(())
    }
}

/// Menu layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// One row per action
    #[default]
    Stacked,
    /// Two-column tile grid
    Tiled,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Stacked => "stacked",
            ViewMode::Tiled => "tiled",
        }
    }

    /// Interprets a stored value; anything but `tiled` is the stacked list
    pub fn from_setting(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stacked" => Ok(ViewMode::Stacked),
            "tiled" => Ok(ViewMode::Tiled),
            other => Err(SettingsError::InvalidValue {
                key: VIEW_MODE.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// On-disk representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub view_mode: String,
    pub show_top_bar_icon: bool,
    pub shortcut: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Stacked.as_str().to_string(),
            show_top_bar_icon: true,
            shortcut: vec![DEFAULT_SHORTCUT.to_string()],
        }
    }
}

impl Settings {
    /// Keys whose values differ between `self` and `other`
    pub fn changed_keys(&self, other: &Settings) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.view_mode != other.view_mode {
            keys.push(VIEW_MODE);
        }
        if self.show_top_bar_icon != other.show_top_bar_icon {
            keys.push(SHOW_TOP_BAR_ICON);
        }
        if self.shortcut != other.shortcut {
            keys.push(SHORTCUT);
        }
        keys
    }
}

/// Modification stamp used to detect external edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn from_path(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok()?,
            len: metadata.len(),
        })
    }
}

struct Handler {
    id: HandlerId,
    key: String,
    callback: ChangeHandler,
}

/// Settings backed by a JSON file, or held in memory only
pub struct JsonSettings {
    path: Option<PathBuf>,
    values: Settings,
    stamp: Option<FileStamp>,
    handlers: Vec<Handler>,
    next_handler: u64,
}

impl JsonSettings {
    /// `$XDG_CONFIG_HOME/power-dial/settings.json` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("power-dial").join("settings.json"))
    }

    /// Loads settings from `path`
    ///
    /// A missing file yields the defaults; the file is only created by the
    /// first write.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Settings::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            stamp: FileStamp::from_path(&path),
            path: Some(path),
            values,
            handlers: Vec::new(),
            next_handler: 1,
        })
    }

    /// Settings that are never written to disk
    pub fn in_memory(values: Settings) -> Self {
        Self {
            path: None,
            values,
            stamp: None,
            handlers: Vec::new(),
            next_handler: 1,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn values(&self) -> &Settings {
        &self.values
    }

    /// Writes the current values to disk
    pub fn save(&mut self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(path, json)?;
        self.stamp = FileStamp::from_path(path);
        Ok(())
    }

    fn kind_of(key: &str) -> Result<ValueKind, SettingsError> {
        SCHEMA
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))
    }

    fn expect_kind(key: &str, requested: ValueKind) -> Result<(), SettingsError> {
        let actual = Self::kind_of(key)?;
        if actual != requested {
            return Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                requested: requested.name(),
                actual: actual.name(),
            });
        }
        Ok(())
    }

    /// Applies `update`, persists and notifies if anything changed
    fn write(&mut self, update: impl FnOnce(&mut Settings)) -> Result<(), SettingsError> {
        let mut next = self.values.clone();
        update(&mut next);
        let changed = self.values.changed_keys(&next);
        if changed.is_empty() {
            return Ok(());
        }

        let previous = std::mem::replace(&mut self.values, next);
        if let Err(e) = self.save() {
            self.values = previous;
            return Err(e);
        }
        self.notify(&changed);
        Ok(())
    }

    fn notify(&mut self, changed: &[&str]) {
        for &key in changed {
            tracing::debug!(key, "setting changed");
            for handler in self
                .handlers
                .iter_mut()
                .filter(|handler| handler.key.is_empty() || handler.key == key)
            {
                (handler.callback)(key);
            }
        }
    }
}

impl SettingsStore for JsonSettings {
    fn get_string(&self, key: &str) -> Result<String, SettingsError> {
        Self::expect_kind(key, ValueKind::String)?;
        Ok(self.values.view_mode.clone())
    }

    fn get_boolean(&self, key: &str) -> Result<bool, SettingsError> {
        Self::expect_kind(key, ValueKind::Boolean)?;
        Ok(self.values.show_top_bar_icon)
    }

    fn get_string_list(&self, key: &str) -> Result<Vec<String>, SettingsError> {
        Self::expect_kind(key, ValueKind::StringList)?;
        Ok(self.values.shortcut.clone())
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        Self::expect_kind(key, ValueKind::String)?;
        let mode: ViewMode = value.parse()?;
        self.write(|settings| settings.view_mode = mode.as_str().to_string())
    }

    fn set_boolean(&mut self, key: &str, value: bool) -> Result<(), SettingsError> {
        Self::expect_kind(key, ValueKind::Boolean)?;
        self.write(|settings| settings.show_top_bar_icon = value)
    }

    fn set_string_list(&mut self, key: &str, value: Vec<String>) -> Result<(), SettingsError> {
        Self::expect_kind(key, ValueKind::StringList)?;
        if let Some(bad) = value.iter().find(|accel| !validate_accelerator(accel)) {
            return Err(SettingsError::InvalidValue {
                key: key.to_string(),
                value: bad.clone(),
            });
        }
        self.write(|settings| settings.shortcut = value)
    }

    fn connect(&mut self, key: &str, handler: ChangeHandler) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.push(Handler {
            id,
            key: key.to_string(),
            callback: handler,
        });
        id
    }

    fn disconnect(&mut self, id: HandlerId) {
        self.handlers.retain(|handler| handler.id != id);
    }

    fn refresh(&mut self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let stamp = FileStamp::from_path(path);
        if stamp.is_none() || stamp == self.stamp {
            return Ok(());
        }

        let text = fs::read_to_string(path)?;
        self.stamp = stamp;
        let next: Settings = serde_json::from_str(&text)?;

        let changed = self.values.changed_keys(&next);
        if changed.is_empty() {
            return Ok(());
        }
        tracing::info!(path = %path.display(), keys = ?changed, "settings reloaded");
        self.values = next;
        self.notify(&changed);
        Ok(())
    }
}
