// # Command Notifier
//
// Delivers each event by running an external program.
//
// ## Invocation
//
// The configured command line is split on whitespace: the first word is the
// program, the remaining words are passed before the message. The message is
// always the final, single argument. No shell is involved, so the message is
// never re-interpreted.
//
// ```text
// notify_script = "/usr/local/bin/pushover --priority 0"
// → /usr/local/bin/pushover --priority 0 "<message>"
// ```
//
// ## Failure Behavior
//
// Spawn failures and non-zero exits are logged at warn level and otherwise
// ignored.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use crate::traits::Notifier;
use crate::{Error, Result};

/// Notifier that runs an external program per event
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Create a notifier for a program with no extra arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Parse a whitespace-separated command line
    ///
    /// # Returns
    ///
    /// - `Ok(CommandNotifier)`: program plus leading arguments
    /// - `Err(Error::Config)`: if the command line is blank
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut words = command_line.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| Error::config("notify_script cannot be empty"))?;

        Ok(Self {
            program: PathBuf::from(program),
            args: words.map(str::to_string).collect(),
        })
    }

    /// The program that will be run
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Arguments passed before the message
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, message: &str) {
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(message)
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                tracing::debug!("Notification delivered via {}", self.program.display());
            }
            Ok(output) => {
                tracing::warn!(
                    "Notifier {} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => {
                tracing::warn!("Failed to run notifier {}: {}", self.program.display(), e);
            }
        }
    }
}
