//! Terminal rendition of the menu
//!
//! Draws the status line (standing in for the panel indicator) and the modal
//! surface on an alternate screen. Tiles are boxes with a glyph standing in
//! for the action's icon, list entries are single lines, and the focused
//! entry is drawn in reverse video. Every entry span carries the style class
//! of its widget.
//!
//! ## Keys
//! - menu closed: **Enter** / **o** opens it while the indicator is shown,
//!   **q** quits
//! - menu open: arrows, **Tab**, **Shift+Tab**, **Enter** and **Esc** go to
//!   the menu, **1**-**9** click the n-th entry, **c** presses Cancel
//! - **Ctrl+C** quits at any time

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};

use crate::domain::action::{EntryKind, INDICATOR_ICON, PowerAction};
use crate::domain::grid::{FocusSink, TileHandle};
use crate::domain::keyboard::KeyInput;
use crate::ui::presentation::{Presentation, SurfaceLayout, UiEvent};

const TILE_INNER_WIDTH: usize = 16;
const ROW_WIDTH: usize = 34;

/// A run of text sharing one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub reverse: bool,
    /// Style class of the entry the span belongs to
    pub class: Option<&'static str>,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reverse: false,
            class: None,
        }
    }

    fn entry(text: impl Into<String>, entry: &Entry, focused: bool) -> Self {
        Self {
            text: text.into(),
            reverse: focused,
            class: Some(entry.class),
        }
    }
}

/// Terminal glyph for a symbolic icon name
pub fn glyph(icon_name: &str) -> &'static str {
    match icon_name {
        "media-playback-pause-symbolic" => "⏸",
        "system-reboot-symbolic" => "↻",
        "system-shutdown-symbolic" => "⏻",
        "system-log-out-symbolic" => "⇥",
        _ => "•",
    }
}

pub type Line = Vec<Span>;

#[derive(Debug)]
struct Entry {
    handle: TileHandle,
    action: PowerAction,
    class: &'static str,
}

#[derive(Debug)]
struct Surface {
    title: String,
    layout: SurfaceLayout,
    entries: Vec<Entry>,
    focused: Option<TileHandle>,
}

pub struct TerminalPresentation<W: Write> {
    out: W,
    raw_mode: bool,
    indicator: bool,
    surface: Option<Surface>,
    next_handle: u32,
}

impl TerminalPresentation<io::Stdout> {
    /// Takes over the terminal: raw mode, alternate screen, hidden cursor
    ///
    /// The terminal is restored when the presentation is dropped.
    pub fn stdout() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }

        let mut presentation = Self::with_writer(out);
        presentation.raw_mode = true;
        presentation.draw()?;
        Ok(presentation)
    }
}

impl<W: Write> TerminalPresentation<W> {
    /// Renders into `out` without touching terminal modes
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            raw_mode: false,
            indicator: false,
            surface: None,
            next_handle: 1,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn is_surface_open(&self) -> bool {
        self.surface.is_some()
    }

    pub fn is_indicator_shown(&self) -> bool {
        self.indicator
    }

    /// Translates a terminal key press into menu input
    pub fn map_key(&self, key: KeyEvent) -> Option<UiEvent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(UiEvent::Quit);
        }

        let Some(surface) = &self.surface else {
            return match key.code {
                KeyCode::Char('q') => Some(UiEvent::Quit),
                KeyCode::Enter | KeyCode::Char('o') if self.indicator => {
                    Some(UiEvent::OpenRequested)
                }
                _ => None,
            };
        };

        let input = match key.code {
            KeyCode::Left => KeyInput::Left,
            KeyCode::Right => KeyInput::Right,
            KeyCode::Up => KeyInput::Up,
            KeyCode::Down => KeyInput::Down,
            KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => KeyInput::BackTab,
            KeyCode::Tab => KeyInput::Tab,
            KeyCode::BackTab => KeyInput::BackTab,
            KeyCode::Enter => KeyInput::Return,
            KeyCode::Esc => KeyInput::Escape,
            KeyCode::Char('c') => return Some(UiEvent::Cancel),
            KeyCode::Char(digit @ '1'..='9') => {
                let position = digit.to_digit(10)? as usize - 1;
                return surface
                    .entries
                    .get(position)
                    .map(|entry| UiEvent::Click(entry.handle));
            }
            _ => KeyInput::Other,
        };
        Some(UiEvent::Key(input))
    }

    /// The screen contents, top to bottom
    pub fn screen_lines(&self) -> Vec<Line> {
        let mut lines = Vec::new();

        let status = match (&self.surface, self.indicator) {
            (Some(_), _) => "Esc: close menu   Ctrl+C: quit",
            (None, true) => "Enter/o: open menu   q: quit",
            (None, false) => "q: quit",
        };
        let badge = if self.indicator {
            format!("[{} Power Dial]  ", glyph(INDICATOR_ICON))
        } else {
            String::new()
        };
        lines.push(vec![Span::plain(format!("{badge}{status}"))]);
        lines.push(Vec::new());

        let Some(surface) = &self.surface else {
            return lines;
        };

        lines.push(vec![Span::plain(surface.title.clone())]);
        lines.push(Vec::new());

        match surface.layout {
            SurfaceLayout::Grid { row_width } => {
                let numbered: Vec<(usize, &Entry)> = surface.entries.iter().enumerate().collect();
                for row in numbered.chunks(row_width.max(1)) {
                    let mut top = Vec::new();
                    let mut middle = Vec::new();
                    let mut bottom = Vec::new();
                    for (position, entry) in row {
                        let focused = surface.focused == Some(entry.handle);
                        let label = format!(
                            "{} {} {}",
                            position + 1,
                            glyph(entry.action.icon_name()),
                            entry.action.label()
                        );
                        let border = "─".repeat(TILE_INNER_WIDTH);
                        top.push(Span::entry(format!("┌{border}┐"), entry, focused));
                        middle.push(Span::entry(
                            format!("│{label:^width$}│", width = TILE_INNER_WIDTH),
                            entry,
                            focused,
                        ));
                        bottom.push(Span::entry(format!("└{border}┘"), entry, focused));
                        for part in [&mut top, &mut middle, &mut bottom] {
                            part.push(Span::plain(" "));
                        }
                    }
                    lines.extend([top, middle, bottom]);
                }
            }
            SurfaceLayout::List => {
                for (position, entry) in surface.entries.iter().enumerate() {
                    let focused = surface.focused == Some(entry.handle);
                    let label = format!(" {}  {}", position + 1, entry.action.label());
                    lines.push(vec![Span::entry(
                        format!("{label:<width$}", width = ROW_WIDTH),
                        entry,
                        focused,
                    )]);
                }
            }
        }

        lines.push(Vec::new());
        lines.push(vec![Span::plain("[Esc] Cancel")]);
        lines
    }

    fn push_entry(&mut self, action: PowerAction, kind: EntryKind) -> TileHandle {
        let handle = TileHandle(self.next_handle);
        self.next_handle += 1;
        let class = action.style_class(kind);
        match &mut self.surface {
            Some(surface) => surface.entries.push(Entry {
                handle,
                action,
                class,
            }),
            None => tracing::warn!(action = %action.id(), "entry added without an open surface"),
        }
        self.redraw();
        handle
    }

    fn draw(&mut self) -> io::Result<()> {
        let lines = self.screen_lines();
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            queue!(self.out, MoveTo(0, row))?;
            for span in line {
                if span.reverse {
                    queue!(
                        self.out,
                        SetAttribute(Attribute::Reverse),
                        Print(&span.text),
                        SetAttribute(Attribute::NoReverse)
                    )?;
                } else {
                    queue!(self.out, Print(&span.text))?;
                }
            }
        }
        self.out.flush()
    }

    fn redraw(&mut self) {
        if let Err(e) = self.draw() {
            tracing::warn!(error = %e, "failed to draw terminal surface");
        }
    }
}

impl<W: Write> FocusSink for TerminalPresentation<W> {
    fn set_focused(&mut self, tile: TileHandle) {
        if let Some(surface) = &mut self.surface {
            surface.focused = Some(tile);
        }
        self.redraw();
    }

    fn clear_focused(&mut self, tile: TileHandle) {
        if let Some(surface) = &mut self.surface {
            if surface.focused == Some(tile) {
                surface.focused = None;
            }
        }
        self.redraw();
    }
}

impl<W: Write> Presentation for TerminalPresentation<W> {
    fn open_surface(&mut self, title: &str, layout: SurfaceLayout) {
        self.surface = Some(Surface {
            title: title.to_string(),
            layout,
            entries: Vec::new(),
            focused: None,
        });
        self.redraw();
    }

    fn add_tile(&mut self, action: PowerAction) -> TileHandle {
        self.push_entry(action, EntryKind::Tile)
    }

    fn add_row(&mut self, action: PowerAction) -> TileHandle {
        self.push_entry(action, EntryKind::Button)
    }

    fn close_surface(&mut self) {
        if self.surface.take().is_some() {
            self.redraw();
        }
    }

    fn show_indicator(&mut self) {
        self.indicator = true;
        self.redraw();
    }

    fn hide_indicator(&mut self) {
        self.indicator = false;
        self.redraw();
    }

    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<UiEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(self.map_key(key)),
            Event::Resize(_, _) => {
                self.redraw();
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

impl<W: Write> Drop for TerminalPresentation<W> {
    fn drop(&mut self) {
        if self.raw_mode {
            let _ = execute!(self.out, Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presentation() -> TerminalPresentation<Vec<u8>> {
        TerminalPresentation::with_writer(Vec::new())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn text(line: &Line) -> String {
        line.iter().map(|span| span.text.as_str()).collect()
    }

    #[test]
    fn closed_menu_keys() {
        let mut ui = presentation();
        assert_eq!(ui.map_key(press(KeyCode::Enter)), None);

        ui.show_indicator();
        assert_eq!(ui.map_key(press(KeyCode::Enter)), Some(UiEvent::OpenRequested));
        assert_eq!(ui.map_key(press(KeyCode::Char('o'))), Some(UiEvent::OpenRequested));
        assert_eq!(ui.map_key(press(KeyCode::Char('q'))), Some(UiEvent::Quit));
        assert_eq!(ui.map_key(press(KeyCode::Left)), None);
    }

    #[test]
    fn open_menu_keys() {
        let mut ui = presentation();
        ui.open_surface("Power Dial", SurfaceLayout::Grid { row_width: 2 });
        let first = ui.add_tile(PowerAction::Suspend);
        let second = ui.add_tile(PowerAction::Reboot);

        assert_eq!(ui.map_key(press(KeyCode::Left)), Some(UiEvent::Key(KeyInput::Left)));
        assert_eq!(ui.map_key(press(KeyCode::Tab)), Some(UiEvent::Key(KeyInput::Tab)));
        assert_eq!(ui.map_key(press(KeyCode::BackTab)), Some(UiEvent::Key(KeyInput::BackTab)));
        assert_eq!(ui.map_key(press(KeyCode::Enter)), Some(UiEvent::Key(KeyInput::Return)));
        assert_eq!(ui.map_key(press(KeyCode::Esc)), Some(UiEvent::Key(KeyInput::Escape)));
        assert_eq!(ui.map_key(press(KeyCode::Char('c'))), Some(UiEvent::Cancel));
        assert_eq!(ui.map_key(press(KeyCode::Char('1'))), Some(UiEvent::Click(first)));
        assert_eq!(ui.map_key(press(KeyCode::Char('2'))), Some(UiEvent::Click(second)));
        assert_eq!(ui.map_key(press(KeyCode::Char('3'))), None);
        assert_eq!(ui.map_key(press(KeyCode::Char('q'))), Some(UiEvent::Key(KeyInput::Other)));
    }

    #[test]
    fn ctrl_c_and_key_releases() {
        let ui = presentation();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(ui.map_key(ctrl_c), Some(UiEvent::Quit));

        let release =
            KeyEvent::new_with_kind(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(ui.map_key(release), None);
    }

    #[test]
    fn grid_draws_two_tiles_per_row_and_marks_focus() {
        let mut ui = presentation();
        ui.open_surface("Power Dial", SurfaceLayout::Grid { row_width: 2 });
        let handles: Vec<_> = PowerAction::ALL.iter().map(|a| ui.add_tile(*a)).collect();
        ui.set_focused(handles[2]);

        let lines = ui.screen_lines();
        assert_eq!(text(&lines[2]), "Power Dial");

        // two rows of boxes, three lines each
        let first_row = text(&lines[5]);
        assert!(first_row.contains("1 ⏸ Suspend"));
        assert!(first_row.contains("2 ↻ Restart"));
        let second_row = &lines[8];
        assert!(text(second_row).contains("3 ⏻ Power Off"));

        let reversed: Vec<&Span> = lines.iter().flatten().filter(|s| s.reverse).collect();
        assert_eq!(reversed.len(), 3);
        assert!(reversed[1].text.contains("Power Off"));
        assert!(reversed.iter().all(|s| s.class == Some("poweroff-tile")));
        assert_eq!(text(lines.last().unwrap()), "[Esc] Cancel");
    }

    #[test]
    fn clearing_focus_removes_reverse_video() {
        let mut ui = presentation();
        ui.open_surface("Power Dial", SurfaceLayout::List);
        let row = ui.add_row(PowerAction::Logout);
        ui.set_focused(row);
        ui.clear_focused(row);

        assert!(ui.screen_lines().iter().flatten().all(|s| !s.reverse));
    }

    #[test]
    fn list_rows_carry_button_class_without_glyph() {
        let mut ui = presentation();
        ui.open_surface("Power Dial", SurfaceLayout::List);
        ui.add_row(PowerAction::Reboot);

        let lines = ui.screen_lines();
        let row = &lines[4][0];
        assert_eq!(row.class, Some("restart-button"));
        assert_eq!(row.text.trim(), "1  Restart");
    }

    #[test]
    fn unknown_icons_fall_back_to_bullet() {
        assert_eq!(glyph(INDICATOR_ICON), "⏻");
        assert_eq!(glyph("weather-storm-symbolic"), "•");
    }

    #[test]
    fn status_line_tracks_indicator() {
        let mut ui = presentation();
        ui.show_indicator();
        assert!(text(&ui.screen_lines()[0]).starts_with("[⏻ Power Dial]"));
        ui.hide_indicator();
        assert_eq!(text(&ui.screen_lines()[0]), "q: quit");
    }

    #[test]
    fn closing_drops_entries() {
        let mut ui = presentation();
        ui.open_surface("Power Dial", SurfaceLayout::List);
        ui.add_row(PowerAction::Suspend);
        ui.close_surface();
        ui.close_surface();

        assert!(!ui.is_surface_open());
        assert_eq!(ui.screen_lines().len(), 2);
        assert!(!ui.writer().is_empty());
    }
}
