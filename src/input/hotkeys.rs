//! Global shortcut host
//!
//! [`ShortcutHost`] is the seam between the registrar and the platform key
//! grab. [`GlobalHotkeyHost`] implements it on top of the `global-hotkey`
//! crate. The OS manager is created lazily on the first bind, so a display
//! that is not ready yet shows up as a transient bind error the registrar
//! can retry.
//!
//! On Windows the key press arrives as a thread message, so
//! [`ShortcutHost::dispatch_pending`] pumps the loop thread's queue before it
//! reads the hotkey event channel.

use std::collections::HashMap;
use std::rc::Rc;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use crate::domain::accelerator::{Accelerator, AcceleratorError, Modifier};

/// Callback run when the bound shortcut is pressed
pub type ActivationCallback = Rc<dyn Fn()>;

/// Handle identifying a live binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(pub u64);

/// Which shell modes the binding is active in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    /// Only while no modal surface is up
    Normal,
    /// Everywhere, including lock-free modal states
    All,
}

/// Shortcut host errors
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("shortcut host not ready: {0}")]
    NotReady(String),

    #[error("host refused '{accelerator}': {reason}")]
    Rejected { accelerator: String, reason: String },

    #[error("invalid accelerator: {0}")]
    InvalidAccelerator(#[from] AcceleratorError),

    #[error("unsupported key '{0}'")]
    UnsupportedKey(String),

    #[error("no binding named '{0}'")]
    NotBound(String),
}

/// Platform facility owning the OS-level key grab
pub trait ShortcutHost {
    /// Grabs the given accelerators under `name`
    ///
    /// # Returns
    /// `Ok(Some(id))` when the grab is live. `Ok(None)` or an error both mean
    /// the host could not take the binding right now.
    fn bind(
        &mut self,
        name: &str,
        accelerators: &[String],
        mode: ActionMode,
        on_activate: ActivationCallback,
    ) -> Result<Option<BindingId>, HostError>;

    /// Releases the binding registered under `name`
    fn unbind(&mut self, name: &str) -> Result<(), HostError>;

    /// Delivers queued key presses to their callbacks
    fn dispatch_pending(&mut self) {}

    /// Tells the host whether a modal surface is up; [`ActionMode::Normal`]
    /// bindings stay quiet meanwhile
    fn set_modal(&mut self, _modal: bool) {}
}

struct Binding {
    hotkeys: Vec<HotKey>,
    mode: ActionMode,
    on_activate: ActivationCallback,
}

/// `global-hotkey` backed shortcut host
#[derive(Default)]
pub struct GlobalHotkeyHost {
    manager: Option<GlobalHotKeyManager>,
    bindings: HashMap<String, Binding>,
    next_id: u64,
    modal: bool,
}

impl GlobalHotkeyHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn manager(&mut self) -> Result<&GlobalHotKeyManager, HostError> {
        if self.manager.is_none() {
            let manager =
                GlobalHotKeyManager::new().map_err(|e| HostError::NotReady(e.to_string()))?;
            tracing::debug!("global hotkey manager created");
            self.manager = Some(manager);
        }
        self.manager
            .as_ref()
            .ok_or_else(|| HostError::NotReady("hotkey manager unavailable".to_string()))
    }

    /// Callback of the binding owning hotkey `id`, if it may fire now
    fn callback_for(&self, id: u32) -> Option<ActivationCallback> {
        self.bindings
            .values()
            .filter(|binding| !(self.modal && binding.mode == ActionMode::Normal))
            .find(|binding| binding.hotkeys.iter().any(|hk| hk.id() == id))
            .map(|binding| Rc::clone(&binding.on_activate))
    }
}

/// Releases every hotkey, even after a failure
///
/// # Returns
/// The first failure, reported against the binding `name`.
fn release_all<E: std::fmt::Display>(
    name: &str,
    hotkeys: Vec<HotKey>,
    mut unregister: impl FnMut(HotKey) -> Result<(), E>,
) -> Result<(), HostError> {
    let mut first_error = None;
    for hotkey in hotkeys {
        if let Err(e) = unregister(hotkey) {
            tracing::debug!(
                binding = name,
                hotkey = ?hotkey,
                error = %e,
                "hotkey not released"
            );
            first_error.get_or_insert_with(|| HostError::Rejected {
                accelerator: name.to_string(),
                reason: e.to_string(),
            });
        }
    }
    first_error.map_or(Ok(()), Err)
}

impl ShortcutHost for GlobalHotkeyHost {
    fn bind(
        &mut self,
        name: &str,
        accelerators: &[String],
        mode: ActionMode,
        on_activate: ActivationCallback,
    ) -> Result<Option<BindingId>, HostError> {
        let hotkeys = accelerators
            .iter()
            .map(|accelerator| to_hotkey(&Accelerator::parse(accelerator)?))
            .collect::<Result<Vec<_>, _>>()?;

        if self.bindings.contains_key(name) {
            self.unbind(name)?;
        }

        let manager = self.manager()?;
        let mut registered: Vec<HotKey> = Vec::with_capacity(hotkeys.len());
        for (hotkey, accelerator) in hotkeys.iter().zip(accelerators) {
            if let Err(e) = manager.register(*hotkey) {
                for done in registered {
                    let _ = manager.unregister(done);
                }
                return Err(HostError::Rejected {
                    accelerator: accelerator.clone(),
                    reason: e.to_string(),
                });
            }
            registered.push(*hotkey);
        }

        self.next_id += 1;
        self.bindings.insert(
            name.to_string(),
            Binding {
                hotkeys,
                mode,
                on_activate,
            },
        );
        Ok(Some(BindingId(self.next_id)))
    }

    fn unbind(&mut self, name: &str) -> Result<(), HostError> {
        let binding = self
            .bindings
            .remove(name)
            .ok_or_else(|| HostError::NotBound(name.to_string()))?;

        let manager = self.manager()?;
        release_all(name, binding.hotkeys, |hotkey| manager.unregister(hotkey))
    }

    fn dispatch_pending(&mut self) {
        #[cfg(windows)]
        crate::platform::win32::pump_thread_messages();

        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            if let Some(callback) = self.callback_for(event.id) {
                callback();
            }
        }
    }

    fn set_modal(&mut self, modal: bool) {
        self.modal = modal;
    }
}

/// Converts a parsed accelerator into a `global-hotkey` key combination
pub fn to_hotkey(accelerator: &Accelerator) -> Result<HotKey, HostError> {
    let modifiers = accelerator
        .modifiers()
        .iter()
        .fold(Modifiers::empty(), |acc, modifier| {
            acc | match modifier {
                Modifier::Primary => Modifiers::CONTROL,
                Modifier::Alt => Modifiers::ALT,
                Modifier::Super => Modifiers::META,
                Modifier::Shift => Modifiers::SHIFT,
            }
        });
    let code = key_code(accelerator.key())
        .ok_or_else(|| HostError::UnsupportedKey(accelerator.key().to_string()))?;

    let modifiers = (!modifiers.is_empty()).then_some(modifiers);
    Ok(HotKey::new(modifiers, code))
}

/// Maps a GDK key name to a physical key code
fn key_code(name: &str) -> Option<Code> {
    let code = match name.to_ascii_lowercase().as_str() {
        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        "escape" => Code::Escape,
        "delete" => Code::Delete,
        "insert" => Code::Insert,
        "home" => Code::Home,
        "end" => Code::End,
        "page_up" | "prior" => Code::PageUp,
        "page_down" | "next" => Code::PageDown,
        "print" => Code::PrintScreen,
        "pause" => Code::Pause,
        "space" => Code::Space,
        "return" => Code::Enter,
        "tab" => Code::Tab,
        "backspace" => Code::Backspace,
        _ => return None,
    };
    Some(code)
}
