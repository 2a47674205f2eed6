//! Lifecycle of the menu's global shortcut
//!
//! Binding can fail transiently while the session is still starting up. A
//! failed attempt is retried after [`RETRY_DELAY`], at most [`MAX_RETRIES`]
//! times. Each `register`/`unregister` bumps a generation counter; a retry
//! event carrying an older generation is dropped.

use std::time::Duration;

use crate::domain::accelerator::format_for_display;
use crate::input::hotkeys::{ActionMode, ActivationCallback, BindingId, ShortcutHost};
use crate::runtime::{LoopEvent, Scheduler, TimerGuard};

/// Retries after the first attempt before giving up
pub const MAX_RETRIES: u32 = 5;

/// Delay between two registration attempts
pub const RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Name the binding is registered under in the host
pub const BINDING_NAME: &str = "shortcut";

/// Coarse view of the registration for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Unregistered,
    Registered,
    /// A retry is scheduled
    Retrying,
    /// All attempts exhausted
    Failed,
    /// No accelerator configured
    Disabled,
}

pub struct ShortcutRegistrar {
    name: String,
    accelerators: Vec<String>,
    on_activate: ActivationCallback,
    binding: Option<BindingId>,
    attempt: u32,
    generation: u64,
    retry: Option<TimerGuard<LoopEvent>>,
    exhausted: bool,
}

impl ShortcutRegistrar {
    pub fn new(name: impl Into<String>, on_activate: ActivationCallback) -> Self {
        Self {
            name: name.into(),
            accelerators: Vec::new(),
            on_activate,
            binding: None,
            attempt: 0,
            generation: 0,
            retry: None,
            exhausted: false,
        }
    }

    /// Starts a fresh registration for `accelerators`
    ///
    /// Any pending retry of an earlier registration is cancelled and the
    /// attempt counter restarts at zero. An empty list leaves the shortcut
    /// disabled.
    pub fn register(
        &mut self,
        accelerators: Vec<String>,
        host: &mut dyn ShortcutHost,
        scheduler: &Scheduler<LoopEvent>,
    ) {
        self.cancel_retry();
        self.generation += 1;
        self.attempt = 0;
        self.exhausted = false;
        self.accelerators = accelerators;

        if self.accelerators.is_empty() {
            tracing::info!(binding = %self.name, "no shortcut configured, binding disabled");
            return;
        }
        self.try_bind(host, scheduler);
    }

    /// Handles a fired retry timer
    ///
    /// Retries from a superseded registration are ignored.
    pub fn on_retry(
        &mut self,
        attempt: u32,
        generation: u64,
        host: &mut dyn ShortcutHost,
        scheduler: &Scheduler<LoopEvent>,
    ) {
        if generation != self.generation {
            tracing::debug!(
                binding = %self.name,
                generation,
                current = self.generation,
                "dropping stale registration retry"
            );
            return;
        }
        self.retry = None;
        self.attempt = attempt;
        self.try_bind(host, scheduler);
    }

    /// Releases the binding and cancels any pending retry
    ///
    /// Safe to call when nothing is registered. Host failures are logged.
    pub fn unregister(&mut self, host: &mut dyn ShortcutHost) {
        self.cancel_retry();
        self.generation += 1;
        self.attempt = 0;
        self.exhausted = false;

        if self.binding.take().is_some() {
            match host.unbind(&self.name) {
                Ok(()) => tracing::debug!(binding = %self.name, "shortcut released"),
                Err(e) => {
                    tracing::warn!(binding = %self.name, error = %e, "failed to release shortcut")
                }
            }
        }
    }

    /// Drops the current binding and registers `accelerators` from scratch
    pub fn reregister(
        &mut self,
        accelerators: Vec<String>,
        host: &mut dyn ShortcutHost,
        scheduler: &Scheduler<LoopEvent>,
    ) {
        self.unregister(host);
        self.register(accelerators, host, scheduler);
    }

    pub fn binding(&self) -> Option<BindingId> {
        self.binding
    }

    /// Zero-based number of the last attempt made
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn accelerators(&self) -> &[String] {
        &self.accelerators
    }

    pub fn status(&self) -> RegistrationStatus {
        if self.binding.is_some() {
            RegistrationStatus::Registered
        } else if self.retry.as_ref().is_some_and(TimerGuard::is_pending) {
            RegistrationStatus::Retrying
        } else if self.exhausted {
            RegistrationStatus::Failed
        } else if self.accelerators.is_empty() && self.generation > 0 {
            RegistrationStatus::Disabled
        } else {
            RegistrationStatus::Unregistered
        }
    }

    fn try_bind(&mut self, host: &mut dyn ShortcutHost, scheduler: &Scheduler<LoopEvent>) {
        if self.binding.take().is_some() {
            if let Err(e) = host.unbind(&self.name) {
                tracing::debug!(binding = %self.name, error = %e, "stale binding not released");
            }
        }

        let outcome = host.bind(
            &self.name,
            &self.accelerators,
            ActionMode::All,
            self.on_activate.clone(),
        );

        let reason = match outcome {
            Ok(Some(id)) => {
                let shown: Vec<String> =
                    self.accelerators.iter().map(|a| format_for_display(a)).collect();
                tracing::info!(
                    binding = %self.name,
                    accelerators = ?shown,
                    attempt = self.attempt + 1,
                    "shortcut registered"
                );
                self.binding = Some(id);
                self.attempt = 0;
                return;
            }
            Ok(None) => "host returned no binding".to_string(),
            Err(e) => e.to_string(),
        };

        tracing::warn!(
            binding = %self.name,
            attempt = self.attempt + 1,
            %reason,
            "failed to register shortcut"
        );

        if self.attempt < MAX_RETRIES {
            let event = LoopEvent::RetryRegistration {
                attempt: self.attempt + 1,
                generation: self.generation,
            };
            self.retry = Some(scheduler.schedule(RETRY_DELAY, event));
        } else {
            self.exhausted = true;
            tracing::error!(
                binding = %self.name,
                attempts = MAX_RETRIES + 1,
                "giving up on shortcut registration"
            );
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(guard) = self.retry.take() {
            guard.cancel();
        }
    }
}
