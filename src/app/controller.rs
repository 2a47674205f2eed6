//! Application controller and coordination layer
//!
//! The controller owns every long-lived piece: settings, the shortcut
//! registrar and its host, the menu session, the presentation, the action
//! executor and the timer queue. It implements enable/disable and runs the
//! event loop that ties them together.

use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::app::session::{MenuSession, SessionResponse};
use crate::app::state::{AppCommand, CommandQueue};
use crate::config::{HandlerId, SHORTCUT, SHOW_TOP_BAR_ICON, SettingsError, SettingsStore};
use crate::input::registrar::{BINDING_NAME, ShortcutRegistrar};
use crate::input::{ActivationCallback, ShortcutHost};
use crate::platform::ActionExecutor;
use crate::runtime::{LoopEvent, Scheduler, TimerGuard};
use crate::ui::{Presentation, UiEvent};

/// How often the settings file is checked for outside edits
pub const SETTINGS_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Longest wait for user input while no timer is due
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    #[error("invalid shortcut '{0}'")]
    InvalidShortcut(String),

    #[error("no configuration directory available")]
    NoConfigDir,

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Main application controller
pub struct Controller<S, H, P, X> {
    settings: S,
    host: H,
    presentation: P,
    executor: X,
    registrar: ShortcutRegistrar,
    session: MenuSession,
    scheduler: Scheduler<LoopEvent>,
    commands: CommandQueue,
    settings_handler: Option<HandlerId>,
    reload: Option<TimerGuard<LoopEvent>>,
    indicator: bool,
    enabled: bool,
    quit: bool,
}

impl<S, H, P, X> Controller<S, H, P, X>
where
    S: SettingsStore,
    H: ShortcutHost,
    P: Presentation,
    X: ActionExecutor,
{
    pub fn new(settings: S, host: H, presentation: P, executor: X) -> Self {
        let commands = CommandQueue::new();
        let sender = commands.sender();
        let on_activate: ActivationCallback = Rc::new(move || {
            let _ = sender.send(AppCommand::OpenMenu);
        });

        Self {
            settings,
            host,
            presentation,
            executor,
            registrar: ShortcutRegistrar::new(BINDING_NAME, on_activate),
            session: MenuSession::new(),
            scheduler: Scheduler::new(),
            commands,
            settings_handler: None,
            reload: None,
            indicator: false,
            enabled: false,
            quit: false,
        }
    }

    /// Starts watching settings, shows the indicator and binds the shortcut
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;

        let sender = self.commands.sender();
        let handler = self.settings.connect(
            "",
            Box::new(move |key| {
                let _ = sender.send(AppCommand::SettingChanged(key.to_string()));
            }),
        );
        self.settings_handler = Some(handler);

        self.sync_indicator();
        let accelerators = self.shortcut_list();
        self.registrar
            .register(accelerators, &mut self.host, &self.scheduler);
        self.schedule_reload();
        tracing::info!("power dial enabled");
    }

    /// Undoes [`Controller::enable`]; safe to call repeatedly
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;

        self.registrar.unregister(&mut self.host);
        self.session.close(&mut self.presentation);
        if self.indicator {
            self.presentation.hide_indicator();
            self.indicator = false;
        }
        if let Some(handler) = self.settings_handler.take() {
            self.settings.disconnect(handler);
        }
        self.reload = None;
        tracing::info!("power dial disabled");
    }

    /// Opens the menu unless it is already open
    pub fn open_menu(&mut self) {
        if let Err(e) = self
            .session
            .open(&self.settings, &mut self.presentation, &self.scheduler)
        {
            tracing::error!(error = %e, "failed to build menu");
        }
    }

    /// Processes everything due at `now` (time since the loop started)
    pub fn tick(&mut self, now: Duration) {
        self.host.set_modal(self.session.is_open());
        self.host.dispatch_pending();
        for event in self.scheduler.advance_to(now) {
            self.handle_loop_event(event);
        }
        self.drain_commands();
    }

    /// Handles one input event from the presentation
    pub fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Quit => self.quit = true,
            UiEvent::OpenRequested if self.indicator => self.open_menu(),
            UiEvent::OpenRequested => {}
            event => {
                let response = self.session.handle_event(
                    event,
                    &mut self.presentation,
                    &self.executor,
                );
                if response == SessionResponse::Ignored {
                    tracing::trace!(?event, "ui event ignored");
                }
            }
        }
    }

    /// Runs the event loop until the user quits
    pub fn run(&mut self) -> Result<(), AppError> {
        let start = Instant::now();
        while !self.quit {
            let now = start.elapsed();
            self.tick(now);

            let timeout = self
                .scheduler
                .next_deadline()
                .map_or(IDLE_POLL, |deadline| deadline.saturating_sub(now))
                .min(IDLE_POLL);
            if let Some(event) = self.presentation.next_event(timeout)? {
                self.handle_ui_event(event);
            }
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_indicator_shown(&self) -> bool {
        self.indicator
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Asks the loop to stop after the current tick
    pub fn request_quit(&mut self) {
        let _ = self.commands.sender().send(AppCommand::Quit);
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn registrar(&self) -> &ShortcutRegistrar {
        &self.registrar
    }

    pub fn session(&self) -> &MenuSession {
        &self.session
    }

    pub fn scheduler(&self) -> &Scheduler<LoopEvent> {
        &self.scheduler
    }

    fn handle_loop_event(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::RetryRegistration {
                attempt,
                generation,
            } => self
                .registrar
                .on_retry(attempt, generation, &mut self.host, &self.scheduler),
            LoopEvent::SettleFocus { session } => {
                self.session.on_settle(session, &mut self.presentation)
            }
            LoopEvent::ReloadSettings => {
                if let Err(e) = self.settings.refresh() {
                    tracing::warn!(error = %e, "settings reload failed, keeping previous values");
                }
                self.schedule_reload();
            }
        }
    }

    fn drain_commands(&mut self) {
        while let Some(command) = self.commands.try_next() {
            match command {
                AppCommand::OpenMenu => self.open_menu(),
                AppCommand::SettingChanged(key) => self.on_setting_changed(&key),
                AppCommand::Quit => self.quit = true,
            }
        }
    }

    fn on_setting_changed(&mut self, key: &str) {
        if !self.enabled {
            return;
        }
        match key {
            SHORTCUT => {
                let accelerators = self.shortcut_list();
                tracing::info!(?accelerators, "shortcut changed, re-registering");
                self.registrar
                    .reregister(accelerators, &mut self.host, &self.scheduler);
            }
            SHOW_TOP_BAR_ICON => self.sync_indicator(),
            // the layout is read again on the next open
            _ => {}
        }
    }

    /// Shows or hides the indicator to match the setting
    fn sync_indicator(&mut self) {
        let wanted = self
            .settings
            .get_boolean(SHOW_TOP_BAR_ICON)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not read indicator setting");
                true
            });

        if wanted && !self.indicator {
            self.presentation.show_indicator();
        } else if !wanted && self.indicator {
            self.presentation.hide_indicator();
        }
        self.indicator = wanted;
    }

    fn shortcut_list(&self) -> Vec<String> {
        self.settings.get_string_list(SHORTCUT).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read shortcut setting");
            Vec::new()
        })
    }

    fn schedule_reload(&mut self) {
        if self.enabled {
            self.reload = Some(
                self.scheduler
                    .schedule(SETTINGS_POLL_INTERVAL, LoopEvent::ReloadSettings),
            );
        }
    }
}
