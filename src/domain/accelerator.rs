//! Accelerator strings for the global shortcut
//!
//! Shortcuts are stored in the GTK accelerator syntax, e.g. `<Super><Shift>p`:
//! zero or more `<Modifier>` tags followed by a key name.

use std::fmt;

/// Keys that may not be used as the shortcut's main key
const FORBIDDEN_KEYS: [&str; 4] = ["Tab", "Return", "space", "BackSpace"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcceleratorError {
    #[error("accelerator is empty")]
    Empty,
    #[error("unterminated modifier tag in '{0}'")]
    UnterminatedTag(String),
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("accelerator '{0}' has no key")]
    MissingKey(String),
}

/// Modifier keys, in the order they are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    /// Control
    Primary,
    Alt,
    Super,
    Shift,
}

impl Modifier {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "primary" | "control" | "ctrl" => Some(Modifier::Primary),
            "alt" | "mod1" => Some(Modifier::Alt),
            "super" | "meta" | "mod4" => Some(Modifier::Super),
            "shift" => Some(Modifier::Shift),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Modifier::Primary => "<Primary>",
            Modifier::Alt => "<Alt>",
            Modifier::Super => "<Super>",
            Modifier::Shift => "<Shift>",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Modifier::Primary => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Super => "Super",
            Modifier::Shift => "Shift",
        }
    }
}

/// A parsed accelerator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accelerator {
    modifiers: Vec<Modifier>,
    key: String,
}

impl Accelerator {
    /// Parses a GTK-style accelerator such as `<Primary><Alt>Delete`
    pub fn parse(source: &str) -> Result<Self, AcceleratorError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(AcceleratorError::Empty);
        }

        let mut modifiers = Vec::new();
        let mut rest = source;
        while let Some(tagged) = rest.strip_prefix('<') {
            let end = tagged
                .find('>')
                .ok_or_else(|| AcceleratorError::UnterminatedTag(source.to_string()))?;
            let tag = &tagged[..end];
            let modifier = Modifier::from_tag(tag)
                .ok_or_else(|| AcceleratorError::UnknownModifier(tag.to_string()))?;
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
            rest = &tagged[end + 1..];
        }

        if rest.is_empty() {
            return Err(AcceleratorError::MissingKey(source.to_string()));
        }

        modifiers.sort();
        Ok(Self {
            modifiers,
            key: rest.to_string(),
        })
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Key name as written (GDK keyval name)
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            f.write_str(modifier.tag())?;
        }
        f.write_str(&self.key)
    }
}

/// Builds an accelerator string from pressed modifiers and a key name
///
/// # Returns
/// `None` when no modifier is held; a bare key is never a valid shortcut.
pub fn build_accelerator(modifiers: &[Modifier], key_name: &str) -> Option<String> {
    if modifiers.is_empty() || key_name.is_empty() {
        return None;
    }

    let mut ordered = modifiers.to_vec();
    ordered.sort();
    ordered.dedup();

    let mut accelerator: String = ordered.iter().map(|m| m.tag()).collect();
    accelerator.push_str(key_name);
    Some(accelerator)
}

/// Checks that an accelerator is usable as the menu shortcut
pub fn validate_accelerator(accelerator: &str) -> bool {
    if accelerator.len() < 3 {
        return false;
    }
    match Accelerator::parse(accelerator) {
        Ok(parsed) => !FORBIDDEN_KEYS.contains(&parsed.key()),
        Err(_) => false,
    }
}

/// Formats an accelerator for humans, e.g. `<Super><Shift>p` → `Super + Shift + P`
///
/// Unparseable input is shown upper-cased as-is.
pub fn format_for_display(accelerator: &str) -> String {
    if accelerator.is_empty() {
        return String::new();
    }

    match Accelerator::parse(accelerator) {
        Ok(parsed) => {
            let mut parts: Vec<String> = parsed
                .modifiers()
                .iter()
                .map(|m| m.display_name().to_string())
                .collect();
            parts.push(parsed.key().to_uppercase());
            parts.join(" + ")
        }
        Err(_) => accelerator.to_uppercase(),
    }
}
