//! Win32 power actions
//!
//! Shutdown, reboot and logoff go through `ExitWindowsEx`, which requires
//! `SeShutdownPrivilege` on the process token. Suspend uses `SetSuspendState`.
//!
//! [`pump_thread_messages`] drains the calling thread's message queue. The
//! global shortcut is delivered as `WM_HOTKEY` on the thread that registered
//! it, so the event loop has to pump before it reads hotkey events.

use std::thread;

use windows::Win32::Foundation::{BOOLEAN, CloseHandle, HANDLE, LUID};
use windows::Win32::Security::{
    AdjustTokenPrivileges, LUID_AND_ATTRIBUTES, LookupPrivilegeValueW, SE_PRIVILEGE_ENABLED,
    TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES, TOKEN_QUERY,
};
use windows::Win32::System::Power::SetSuspendState;
use windows::Win32::System::Shutdown::{
    EWX_LOGOFF, EWX_POWEROFF, EWX_REBOOT, EXIT_WINDOWS_FLAGS, ExitWindowsEx,
    SHTDN_REASON_FLAG_PLANNED, SHTDN_REASON_MAJOR_OTHER,
};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage, WM_QUIT,
};
use windows::core::{PCWSTR, w};

use crate::domain::action::PowerAction;
use crate::platform::{ActionExecutor, ExecutorError};

/// Closes the wrapped token handle on drop
struct TokenHandle(HANDLE);

impl Drop for TokenHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Enables `SeShutdownPrivilege` for the current process
fn enable_shutdown_privilege() -> Result<(), ExecutorError> {
    unsafe {
        let mut raw = HANDLE::default();
        OpenProcessToken(
            GetCurrentProcess(),
            TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY,
            &mut raw,
        )
        .map_err(|e| ExecutorError::System(format!("OpenProcessToken: {e}")))?;
        let token = TokenHandle(raw);

        let mut luid = LUID::default();
        LookupPrivilegeValueW(PCWSTR::null(), w!("SeShutdownPrivilege"), &mut luid)
            .map_err(|e| ExecutorError::System(format!("LookupPrivilegeValueW: {e}")))?;

        let privileges = TOKEN_PRIVILEGES {
            PrivilegeCount: 1,
            Privileges: [LUID_AND_ATTRIBUTES {
                Luid: luid,
                Attributes: SE_PRIVILEGE_ENABLED,
            }],
        };
        AdjustTokenPrivileges(token.0, false, Some(&privileges), 0, None, None)
            .map_err(|e| ExecutorError::System(format!("AdjustTokenPrivileges: {e}")))?;
    }
    Ok(())
}

fn exit_windows(flags: EXIT_WINDOWS_FLAGS) -> Result<(), ExecutorError> {
    enable_shutdown_privilege()?;
    unsafe {
        ExitWindowsEx(flags, SHTDN_REASON_MAJOR_OTHER | SHTDN_REASON_FLAG_PLANNED)
            .map_err(|e| ExecutorError::System(format!("ExitWindowsEx: {e}")))
    }
}

fn suspend() -> Result<(), ExecutorError> {
    let ok = unsafe { SetSuspendState(BOOLEAN(0), BOOLEAN(0), BOOLEAN(0)) };
    if ok.as_bool() {
        Ok(())
    } else {
        Err(ExecutorError::System("SetSuspendState refused".to_string()))
    }
}

/// Dispatches every queued message of the calling thread
///
/// # Returns
/// The number of messages dispatched. A `WM_QUIT` is consumed and ends the
/// drain early.
pub fn pump_thread_messages() -> usize {
    let mut dispatched = 0;
    unsafe {
        let mut msg = MSG::default();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            if msg.message == WM_QUIT {
                tracing::debug!("WM_QUIT seen while pumping hotkey messages");
                break;
            }
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
            dispatched += 1;
        }
    }
    dispatched
}

/// `ExitWindowsEx` flags for `action`; suspend has none
fn exit_flags(action: PowerAction) -> Option<EXIT_WINDOWS_FLAGS> {
    match action {
        PowerAction::Suspend => None,
        PowerAction::Reboot => Some(EWX_REBOOT),
        PowerAction::PowerOff => Some(EWX_POWEROFF),
        PowerAction::Logout => Some(EWX_LOGOFF),
    }
}

fn perform(action: PowerAction) -> Result<(), ExecutorError> {
    match exit_flags(action) {
        Some(flags) => exit_windows(flags),
        None => suspend(),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsExecutor;

impl ActionExecutor for WindowsExecutor {
    fn execute(&self, action: PowerAction) {
        tracing::info!(action = %action.id(), "executing power action");

        let spawned = thread::Builder::new()
            .name(format!("power-{}", action.id()))
            .spawn(move || match perform(action) {
                Ok(()) => tracing::info!(action = %action.id(), "power action requested"),
                Err(e) => {
                    tracing::error!(action = %action.id(), error = %e, "power action failed")
                }
            });

        if let Err(e) = spawned {
            tracing::error!(
                action = %action.id(),
                error = %e,
                "could not start power action worker"
            );
        }
    }
}
