//! systemd/logind backed power actions

use std::process::{Command, Stdio};
use std::thread;

use crate::domain::action::PowerAction;
use crate::platform::{ActionExecutor, ExecutorError};

/// One command line to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(program: &'static str, args: &[&str]) -> Self {
        Self {
            program,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    fn run(&self) -> Result<(), ExecutorError> {
        let status = Command::new(self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| ExecutorError::Spawn {
                program: self.program.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(ExecutorError::Failed {
                program: self.program.to_string(),
                status,
            });
        }
        Ok(())
    }
}

/// Commands for `action`, in the order they should be tried
///
/// `env` looks up environment variables. Logging out prefers the current
/// logind session and falls back to terminating all of the user's sessions.
pub fn commands_for(action: PowerAction, env: impl Fn(&str) -> Option<String>) -> Vec<CommandSpec> {
    match action {
        PowerAction::Suspend => vec![CommandSpec::new("systemctl", &["suspend"])],
        PowerAction::Reboot => vec![CommandSpec::new("systemctl", &["reboot"])],
        PowerAction::PowerOff => vec![CommandSpec::new("systemctl", &["poweroff"])],
        PowerAction::Logout => {
            let mut commands = Vec::new();
            if let Some(session) = env("XDG_SESSION_ID").filter(|id| !id.is_empty()) {
                commands.push(CommandSpec::new("loginctl", &["terminate-session", &session]));
            }
            if let Some(user) = env("USER").filter(|user| !user.is_empty()) {
                commands.push(CommandSpec::new("loginctl", &["terminate-user", &user]));
            }
            commands
        }
    }
}

/// Runs the candidates until one succeeds
fn run_first_success(action: PowerAction, commands: &[CommandSpec]) -> Result<(), ExecutorError> {
    let mut last = ExecutorError::Unsupported(action);
    for command in commands {
        match command.run() {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(
                    action = %action.id(),
                    program = command.program,
                    args = ?command.args,
                    error = %e,
                    "power command failed"
                );
                last = e;
            }
        }
    }
    Err(last)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxExecutor;

impl ActionExecutor for LinuxExecutor {
    fn execute(&self, action: PowerAction) {
        let commands = commands_for(action, |name| std::env::var(name).ok());
        tracing::info!(action = %action.id(), "executing power action");

        let spawned = thread::Builder::new()
            .name(format!("power-{}", action.id()))
            .spawn(move || match run_first_success(action, &commands) {
                Ok(()) => tracing::info!(action = %action.id(), "power action completed"),
                Err(e) => tracing::error!(action = %action.id(), error = %e, "power action failed"),
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
