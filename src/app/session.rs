//! One opening of the power menu
//!
//! A session reads the layout setting when it opens, builds either a tile
//! grid with keyboard navigation or a plain list of rows, and routes clicks
//! and key presses until an action runs or the user cancels. Closing is
//! idempotent and always leaves the presentation without a focus marker.

use std::time::Duration;

use crate::config::{SettingsStore, VIEW_MODE, ViewMode};
use crate::domain::action::PowerAction;
use crate::domain::grid::{GridError, GridFocus, Tile, TileHandle};
use crate::domain::keyboard::{KeyInput, TileCommand};
use crate::platform::ActionExecutor;
use crate::runtime::{LoopEvent, Scheduler, TimerGuard};
use crate::ui::{Presentation, SurfaceLayout, UiEvent};

/// Time the surface gets to lay out before the first tile takes focus
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Tiles per row in the tiled layout
pub const GRID_ROW_WIDTH: usize = 2;

pub const TITLE: &str = "Power Dial";

enum Entries {
    Grid(GridFocus),
    List(Vec<(TileHandle, PowerAction)>),
}

impl Entries {
    fn action_for(&self, handle: TileHandle) -> Option<PowerAction> {
        match self {
            Entries::Grid(grid) => grid.tile_for(handle).map(Tile::action),
            Entries::List(rows) => rows
                .iter()
                .find(|(row, _)| *row == handle)
                .map(|(_, action)| *action),
        }
    }
}

/// Outcome of routing one UI event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionResponse {
    /// Not meant for the menu
    Ignored,
    /// Consumed, menu still open
    Handled,
    /// The menu closed
    Closed,
}

#[derive(Default)]
pub struct MenuSession {
    entries: Option<Entries>,
    settle: Option<TimerGuard<LoopEvent>>,
    session: u64,
}

impl MenuSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.entries.is_some()
    }

    /// Id of the most recently opened session
    pub fn session_id(&self) -> u64 {
        self.session
    }

    pub fn is_tiled(&self) -> bool {
        matches!(self.entries, Some(Entries::Grid(_)))
    }

    pub fn focused_action(&self) -> Option<PowerAction> {
        match &self.entries {
            Some(Entries::Grid(grid)) => grid.focused_tile().map(Tile::action),
            _ => None,
        }
    }

    /// Opens the menu surface
    ///
    /// Does nothing if the menu is already open. In the tiled layout the
    /// first tile receives focus [`SETTLE_DELAY`] later, when the
    /// `SettleFocus` event reaches [`MenuSession::on_settle`].
    pub fn open<P: Presentation>(
        &mut self,
        settings: &dyn SettingsStore,
        presentation: &mut P,
        scheduler: &Scheduler<LoopEvent>,
    ) -> Result<(), GridError> {
        if self.is_open() {
            tracing::debug!(session = self.session, "menu already open");
            return Ok(());
        }

        let mode = match settings.get_string(VIEW_MODE) {
            Ok(value) => ViewMode::from_setting(&value),
            Err(e) => {
                tracing::warn!(error = %e, "could not read view mode, using stacked layout");
                ViewMode::Stacked
            }
        };

        self.session += 1;
        match mode {
            ViewMode::Tiled => {
                presentation.open_surface(
                    TITLE,
                    SurfaceLayout::Grid {
                        row_width: GRID_ROW_WIDTH,
                    },
                );
                let tiles = PowerAction::ALL
                    .iter()
                    .map(|&action| Tile::new(presentation.add_tile(action), action))
                    .collect();
                let grid = match GridFocus::new(tiles, GRID_ROW_WIDTH) {
                    Ok(grid) => grid,
                    Err(e) => {
                        presentation.close_surface();
                        return Err(e);
                    }
                };

                let settle = LoopEvent::SettleFocus {
                    session: self.session,
                };
                self.settle = Some(scheduler.schedule(SETTLE_DELAY, settle));
                self.entries = Some(Entries::Grid(grid));
            }
            ViewMode::Stacked => {
                presentation.open_surface(TITLE, SurfaceLayout::List);
                let rows = PowerAction::ALL
                    .iter()
                    .map(|&action| (presentation.add_row(action), action))
                    .collect();
                self.entries = Some(Entries::List(rows));
            }
        }

        tracing::info!(session = self.session, layout = %mode, "menu opened");
        Ok(())
    }

    /// Gives the first tile focus once the surface has settled
    pub fn on_settle<P: Presentation>(&mut self, session: u64, presentation: &mut P) {
        if session != self.session {
            tracing::debug!(session, current = self.session, "dropping stale focus settle");
            return;
        }
        self.settle = None;
        if let Some(Entries::Grid(grid)) = &mut self.entries {
            grid.focus_first(presentation);
        }
    }

    /// Routes a click or key press to the open menu
    pub fn handle_event<P: Presentation>(
        &mut self,
        event: UiEvent,
        presentation: &mut P,
        executor: &dyn ActionExecutor,
    ) -> SessionResponse {
        let Some(entries) = &mut self.entries else {
            return SessionResponse::Ignored;
        };

        match event {
            UiEvent::Click(handle) => match entries.action_for(handle) {
                Some(action) => self.run_and_close(action, presentation, executor),
                None => SessionResponse::Ignored,
            },
            UiEvent::Cancel => {
                self.close(presentation);
                SessionResponse::Closed
            }
            UiEvent::Key(input) => match entries {
                Entries::Grid(grid) => match input.tile_command() {
                    Some(TileCommand::Horizontal(step)) => {
                        grid.move_horizontal(step, presentation);
                        SessionResponse::Handled
                    }
                    Some(TileCommand::Vertical(step)) => {
                        grid.move_vertical(step, presentation);
                        SessionResponse::Handled
                    }
                    Some(TileCommand::Activate) => match grid.focused_tile().map(Tile::action) {
                        Some(action) => self.run_and_close(action, presentation, executor),
                        None => SessionResponse::Ignored,
                    },
                    Some(TileCommand::Cancel) => {
                        self.close(presentation);
                        SessionResponse::Closed
                    }
                    None => SessionResponse::Ignored,
                },
                Entries::List(_) if input == KeyInput::Escape => {
                    self.close(presentation);
                    SessionResponse::Closed
                }
                Entries::List(_) => SessionResponse::Ignored,
            },
            UiEvent::OpenRequested | UiEvent::Quit => SessionResponse::Ignored,
        }
    }

    /// Tears the menu down; safe to call when already closed
    pub fn close<P: Presentation>(&mut self, presentation: &mut P) {
        if let Some(settle) = self.settle.take() {
            settle.cancel();
        }
        let Some(entries) = self.entries.take() else {
            return;
        };

        if let Entries::Grid(mut grid) = entries {
            grid.dispose(presentation);
        }
        presentation.close_surface();
        tracing::info!(session = self.session, "menu closed");
    }

    fn run_and_close<P: Presentation>(
        &mut self,
        action: PowerAction,
        presentation: &mut P,
        executor: &dyn ActionExecutor,
    ) -> SessionResponse {
        tracing::info!(session = self.session, action = %action.id(), "power action selected");
        executor.execute(action);
        self.close(presentation);
        SessionResponse::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JsonSettings, Settings};
    use crate::domain::grid::FocusSink;
    use std::cell::RefCell;
    use std::io;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Open(SurfaceLayout),
        Tile(PowerAction),
        Row(PowerAction),
        Close,
        Focus(TileHandle),
        Clear(TileHandle),
    }

    #[derive(Default)]
    struct RecordingUi {
        calls: Vec<Call>,
        next: u32,
    }

    impl RecordingUi {
        fn handle(&mut self) -> TileHandle {
            self.next += 1;
            TileHandle(self.next)
        }

        fn count(&self, wanted: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|call| wanted(call)).count()
        }
    }

    impl FocusSink for RecordingUi {
        fn set_focused(&mut self, tile: TileHandle) {
            self.calls.push(Call::Focus(tile));
        }

        fn clear_focused(&mut self, tile: TileHandle) {
            self.calls.push(Call::Clear(tile));
        }
    }

    impl Presentation for RecordingUi {
        fn open_surface(&mut self, _title: &str, layout: SurfaceLayout) {
            self.calls.push(Call::Open(layout));
        }

        fn add_tile(&mut self, action: PowerAction) -> TileHandle {
            self.calls.push(Call::Tile(action));
            self.handle()
        }

        fn add_row(&mut self, action: PowerAction) -> TileHandle {
            self.calls.push(Call::Row(action));
            self.handle()
        }

        fn close_surface(&mut self) {
            self.calls.push(Call::Close);
        }

        fn show_indicator(&mut self) {}

        fn hide_indicator(&mut self) {}

        fn next_event(&mut self, _timeout: Duration) -> io::Result<Option<UiEvent>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct RecordingExecutor(RefCell<Vec<PowerAction>>);

    impl ActionExecutor for RecordingExecutor {
        fn execute(&self, action: PowerAction) {
            self.0.borrow_mut().push(action);
        }
    }

    fn settings(view_mode: &str) -> JsonSettings {
        JsonSettings::in_memory(Settings {
            view_mode: view_mode.to_string(),
            ..Settings::default()
        })
    }

    /// Opens a tiled session and lets the settle timer fire
    fn settled_grid(ui: &mut RecordingUi) -> (MenuSession, Scheduler<LoopEvent>) {
        let scheduler = Scheduler::new();
        let mut session = MenuSession::new();
        session.open(&settings("tiled"), ui, &scheduler).unwrap();
        for event in scheduler.advance_to(SETTLE_DELAY) {
            if let LoopEvent::SettleFocus { session: id } = event {
                session.on_settle(id, ui);
            }
        }
        (session, scheduler)
    }

    #[test]
    fn tiled_layout_builds_grid_and_focuses_after_settle() {
        let scheduler = Scheduler::new();
        let mut ui = RecordingUi::default();
        let mut session = MenuSession::new();

        session.open(&settings("tiled"), &mut ui, &scheduler).unwrap();

        assert!(session.is_tiled());
        assert_eq!(ui.calls[0], Call::Open(SurfaceLayout::Grid { row_width: 2 }));
        assert_eq!(ui.count(|c| matches!(c, Call::Tile(_))), 4);
        assert_eq!(session.focused_action(), None);

        assert!(scheduler.advance_to(Duration::from_millis(49)).is_empty());
        let due = scheduler.advance_to(SETTLE_DELAY);
        assert_eq!(
            due,
            vec![LoopEvent::SettleFocus {
                session: session.session_id()
            }]
        );
        session.on_settle(session.session_id(), &mut ui);

        assert_eq!(ui.calls.last(), Some(&Call::Focus(TileHandle(1))));
        assert_eq!(session.focused_action(), Some(PowerAction::Suspend));
    }

    #[test]
    fn stacked_layout_uses_rows_without_focus_timer() {
        let scheduler = Scheduler::new();
        let mut ui = RecordingUi::default();
        let mut session = MenuSession::new();

        session.open(&settings("stacked"), &mut ui, &scheduler).unwrap();

        assert!(!session.is_tiled());
        assert_eq!(ui.calls[0], Call::Open(SurfaceLayout::List));
        assert_eq!(
            ui.calls[1..],
            PowerAction::ALL.map(Call::Row)[..]
        );
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn unknown_view_mode_falls_back_to_stacked() {
        let scheduler = Scheduler::new();
        let mut ui = RecordingUi::default();
        let mut session = MenuSession::new();

        session.open(&settings("carousel"), &mut ui, &scheduler).unwrap();
        assert_eq!(ui.calls[0], Call::Open(SurfaceLayout::List));
    }

    #[test]
    fn opening_twice_is_a_no_op() {
        let scheduler = Scheduler::new();
        let mut ui = RecordingUi::default();
        let mut session = MenuSession::new();

        session.open(&settings("tiled"), &mut ui, &scheduler).unwrap();
        session.open(&settings("tiled"), &mut ui, &scheduler).unwrap();

        assert_eq!(ui.count(|c| matches!(c, Call::Open(_))), 1);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let mut ui = RecordingUi::default();
        let (mut session, _scheduler) = settled_grid(&mut ui);

        session.close(&mut ui);
        session.close(&mut ui);

        assert!(!session.is_open());
        assert_eq!(ui.count(|c| *c == Call::Close), 1);
        assert_eq!(ui.count(|c| matches!(c, Call::Clear(_))), 1);
    }

    #[test]
    fn close_before_settle_cancels_focus() {
        let scheduler = Scheduler::new();
        let mut ui = RecordingUi::default();
        let mut session = MenuSession::new();

        session.open(&settings("tiled"), &mut ui, &scheduler).unwrap();
        let stale = session.session_id();
        session.close(&mut ui);

        assert_eq!(scheduler.pending_count(), 0);
        assert!(scheduler.advance_to(SETTLE_DELAY).is_empty());
        session.on_settle(stale, &mut ui);
        assert_eq!(ui.count(|c| matches!(c, Call::Focus(_))), 0);
        assert_eq!(ui.count(|c| matches!(c, Call::Clear(_))), 0);
    }

    #[test]
    fn settle_from_previous_session_is_ignored() {
        let scheduler = Scheduler::new();
        let mut ui = RecordingUi::default();
        let mut session = MenuSession::new();

        session.open(&settings("tiled"), &mut ui, &scheduler).unwrap();
        let first = session.session_id();
        session.close(&mut ui);
        session.open(&settings("tiled"), &mut ui, &scheduler).unwrap();

        session.on_settle(first, &mut ui);
        assert_eq!(session.focused_action(), None);
    }

    #[test]
    fn arrows_move_the_marker() {
        let mut ui = RecordingUi::default();
        let (mut session, _scheduler) = settled_grid(&mut ui);
        let executor = RecordingExecutor::default();
        ui.calls.clear();

        let response = session.handle_event(UiEvent::Key(KeyInput::Down), &mut ui, &executor);

        assert_eq!(response, SessionResponse::Handled);
        assert_eq!(
            ui.calls,
            vec![Call::Clear(TileHandle(1)), Call::Focus(TileHandle(3))]
        );
        assert_eq!(session.focused_action(), Some(PowerAction::PowerOff));
    }

    #[test]
    fn enter_runs_focused_action_and_closes() {
        let mut ui = RecordingUi::default();
        let (mut session, _scheduler) = settled_grid(&mut ui);
        let executor = RecordingExecutor::default();

        session.handle_event(UiEvent::Key(KeyInput::Right), &mut ui, &executor);
        ui.calls.clear();
        let response =
            session.handle_event(UiEvent::Key(KeyInput::KeypadEnter), &mut ui, &executor);

        assert_eq!(response, SessionResponse::Closed);
        assert_eq!(*executor.0.borrow(), vec![PowerAction::Reboot]);
        assert_eq!(ui.calls, vec![Call::Clear(TileHandle(2)), Call::Close]);
    }

    #[test]
    fn click_runs_that_action() {
        let scheduler = Scheduler::new();
        let mut ui = RecordingUi::default();
        let mut session = MenuSession::new();
        let executor = RecordingExecutor::default();

        session.open(&settings("stacked"), &mut ui, &scheduler).unwrap();
        let response = session.handle_event(UiEvent::Click(TileHandle(4)), &mut ui, &executor);

        assert_eq!(response, SessionResponse::Closed);
        assert_eq!(*executor.0.borrow(), vec![PowerAction::Logout]);
        assert!(!session.is_open());
    }

    #[test]
    fn escape_and_cancel_close_without_running_anything() {
        let mut ui = RecordingUi::default();
        let (mut session, scheduler) = settled_grid(&mut ui);
        let executor = RecordingExecutor::default();

        let response = session.handle_event(UiEvent::Key(KeyInput::Escape), &mut ui, &executor);
        assert_eq!(response, SessionResponse::Closed);

        session.open(&settings("stacked"), &mut ui, &scheduler).unwrap();
        let response = session.handle_event(UiEvent::Cancel, &mut ui, &executor);
        assert_eq!(response, SessionResponse::Closed);

        assert!(executor.0.borrow().is_empty());
    }

    #[test]
    fn events_while_closed_are_ignored() {
        let mut ui = RecordingUi::default();
        let mut session = MenuSession::new();
        let executor = RecordingExecutor::default();

        for event in [
            UiEvent::Key(KeyInput::Return),
            UiEvent::Click(TileHandle(1)),
            UiEvent::Cancel,
        ] {
            assert_eq!(
                session.handle_event(event, &mut ui, &executor),
                SessionResponse::Ignored
            );
        }
        assert!(ui.calls.is_empty());
    }

    #[test]
    fn other_keys_propagate() {
        let mut ui = RecordingUi::default();
        let (mut session, _scheduler) = settled_grid(&mut ui);
        let executor = RecordingExecutor::default();

        let response = session.handle_event(UiEvent::Key(KeyInput::Other), &mut ui, &executor);
        assert_eq!(response, SessionResponse::Ignored);
        assert!(session.is_open());
    }
}
