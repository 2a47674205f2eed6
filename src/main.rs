use std::io::Stdout;
use std::path::PathBuf;

use clap::Parser;

use power_dial::config::{
    JsonSettings, SHORTCUT, SHOW_TOP_BAR_ICON, SettingsStore, VIEW_MODE, ViewMode,
};
use power_dial::domain::accelerator::{
    Accelerator, build_accelerator, format_for_display, validate_accelerator,
};
use power_dial::input::GlobalHotkeyHost;
use power_dial::logging;
use power_dial::platform::{ActionExecutor, DryRunExecutor, SystemExecutor};
use power_dial::ui::TerminalPresentation;
use power_dial::{AppError, Controller};

type TerminalController<X> =
    Controller<JsonSettings, GlobalHotkeyHost, TerminalPresentation<Stdout>, X>;

#[derive(Parser, Debug)]
#[command(
    name = "power-dial",
    author,
    version,
    about = "Power menu opened from a global shortcut",
    long_about = None
)]
struct Cli {
    /// Log the chosen action instead of performing it
    #[arg(long)]
    dry_run: bool,

    /// Settings file to use instead of the per-user default
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Store a new menu shortcut, e.g. `<Super><Shift>p`, and exit
    #[arg(long, value_name = "ACCELERATOR", conflicts_with = "clear_shortcut")]
    set_shortcut: Option<String>,

    /// Remove the menu shortcut, leaving the indicator as the only way in, and exit
    #[arg(long)]
    clear_shortcut: bool,

    /// Store the menu layout (`stacked` or `tiled`) and exit
    #[arg(long, value_name = "MODE")]
    set_view_mode: Option<String>,

    /// Store whether the panel indicator is shown and exit
    #[arg(long, value_name = "BOOL")]
    show_icon: Option<bool>,
}

impl Cli {
    fn edits_preferences(&self) -> bool {
        self.set_shortcut.is_some()
            || self.clear_shortcut
            || self.set_view_mode.is_some()
            || self.show_icon.is_some()
    }
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let _guard = logging::init()?;

    let path = match &cli.config {
        Some(path) => path.clone(),
        None => JsonSettings::default_path().ok_or(AppError::NoConfigDir)?,
    };
    let mut settings = JsonSettings::load(&path)?;

    if cli.edits_preferences() {
        return apply_preferences(&cli, &mut settings);
    }
    tracing::info!(settings = %path.display(), dry_run = cli.dry_run, "starting power dial");

    let presentation = TerminalPresentation::stdout()?;
    let host = GlobalHotkeyHost::new();

    let result = if cli.dry_run {
        run(Controller::new(settings, host, presentation, DryRunExecutor))
    } else {
        run(Controller::new(settings, host, presentation, SystemExecutor))
    };

    match &result {
        Ok(()) => tracing::info!("power dial exited"),
        Err(e) => tracing::error!(error = %e, "power dial stopped"),
    }
    result
}

fn run<X: ActionExecutor>(mut controller: TerminalController<X>) -> Result<(), AppError> {
    controller.enable();
    let result = controller.run();
    controller.disable();
    result
}

/// Writes the preference flags to the settings file; a running instance
/// picks them up on its next poll
fn apply_preferences(cli: &Cli, settings: &mut JsonSettings) -> Result<(), AppError> {
    if let Some(source) = &cli.set_shortcut {
        let parsed =
            Accelerator::parse(source).map_err(|e| AppError::InvalidShortcut(e.to_string()))?;
        let accelerator = build_accelerator(parsed.modifiers(), parsed.key())
            .filter(|a| validate_accelerator(a))
            .ok_or_else(|| AppError::InvalidShortcut(source.clone()))?;
        settings.set_string_list(SHORTCUT, vec![accelerator.clone()])?;
        println!("shortcut: {}", format_for_display(&accelerator));
    }

    if cli.clear_shortcut {
        settings.set_string_list(SHORTCUT, Vec::new())?;
        println!("shortcut: disabled");
    }

    if let Some(mode) = &cli.set_view_mode {
        let mode: ViewMode = mode.parse()?;
        settings.set_string(VIEW_MODE, mode.as_str())?;
        println!("view mode: {mode}");
    }

    if let Some(show) = cli.show_icon {
        settings.set_boolean(SHOW_TOP_BAR_ICON, show)?;
        println!("panel indicator: {}", if show { "shown" } else { "hidden" });
    }

    tracing::info!(settings = ?settings.path(), "preferences updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use power_dial::config::Settings;

    fn apply(args: &[&str]) -> (Result<(), AppError>, JsonSettings) {
        let cli = Cli::parse_from(std::iter::once("power-dial").chain(args.iter().copied()));
        let mut settings = JsonSettings::in_memory(Settings::default());
        let result = apply_preferences(&cli, &mut settings);
        (result, settings)
    }

    #[test]
    fn set_shortcut_stores_canonical_order() {
        let (result, settings) = apply(&["--set-shortcut", "<Shift><Super>k"]);
        assert!(result.is_ok());
        assert_eq!(settings.values().shortcut, vec!["<Super><Shift>k".to_string()]);
    }

    #[test]
    fn set_shortcut_rejects_bare_and_reserved_keys() {
        let (result, settings) = apply(&["--set-shortcut", "p"]);
        assert!(matches!(result, Err(AppError::InvalidShortcut(_))));
        let (tab, _) = apply(&["--set-shortcut", "<Alt>Tab"]);
        assert!(matches!(tab, Err(AppError::InvalidShortcut(_))));
        assert_eq!(settings.values().shortcut, Settings::default().shortcut);
    }

    #[test]
    fn clear_shortcut_stores_an_empty_list() {
        let cli = Cli::parse_from(["power-dial", "--clear-shortcut"]);
        assert!(cli.edits_preferences());

        let (result, settings) = apply(&["--clear-shortcut"]);
        assert!(result.is_ok());
        assert!(settings.values().shortcut.is_empty());
    }

    #[test]
    fn clear_and_set_shortcut_conflict() {
        let parsed = Cli::try_parse_from([
            "power-dial",
            "--clear-shortcut",
            "--set-shortcut",
            "<Alt>F2",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn view_mode_and_icon_flags() {
        let (result, settings) = apply(&["--set-view-mode", "tiled", "--show-icon", "false"]);
        assert!(result.is_ok());
        assert_eq!(settings.values().view_mode, "tiled");
        assert!(!settings.values().show_top_bar_icon);

        let (bad, _) = apply(&["--set-view-mode", "wide"]);
        assert!(matches!(bad, Err(AppError::Settings(_))));
    }

    #[test]
    fn plain_run_edits_nothing() {
        assert!(!Cli::parse_from(["power-dial", "--dry-run"]).edits_preferences());
    }
}
