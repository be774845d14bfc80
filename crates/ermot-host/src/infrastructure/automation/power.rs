//! Shell submission of power commands.
//!
//! Power actions are fixed command strings (see
//! [`power_command`](crate::application::host_actions::power_command)).  They
//! are handed to the platform shell and never awaited: `shutdown -h now`
//! does not return in any useful sense.  The child is reaped by tokio in the
//! background once it exits.

use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::application::host_actions::{AutomationError, SystemCommandRunner};

/// Runs commands through `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self
    }

    fn shell(command: &str) -> Command {
        #[cfg(target_os = "windows")]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        };

        #[cfg(not(target_os = "windows"))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        cmd
    }
}

impl SystemCommandRunner for ShellCommandRunner {
    fn submit(&self, command: &str) -> Result<(), AutomationError> {
        let child = Self::shell(command)
            .spawn()
            .map_err(|source| AutomationError::Submit {
                command: command.to_string(),
                source,
            })?;
        info!("Submitted power command {command:?} (pid {:?})", child.id());
        Ok(())
    }
}
