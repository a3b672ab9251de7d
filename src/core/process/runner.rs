// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution and lifecycle management.
//!
//! ```text
//! run() / run_with_cancellation(token)
//!              |
//!              v
//!     build_command()
//!     args, cwd, env overlay, stdio
//!              |
//!              v
//!          spawn() --> run_child()
//!              |
//!              v
//!   timed out?    --> ProcessError::Timeout
//!   interrupted?  --> ProcessError::Interrupted
//!   exit code not accepted (and no ALLOW_FAILURE)
//!                 --> ProcessError::NonZeroExit { stderr }
//!              |
//!              v
//!       ProcessOutput
//! ```

use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use super::builder::{ProcessBuilder, ProcessFlags, ProcessOutput, StreamFlags};
use crate::error::ProcessError;

impl ProcessBuilder {
    /// Returns the display name for this process.
    fn display_name(&self) -> String {
        self.name_override().map_or_else(
            || {
                self.program().file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
            String::from,
        )
    }

    /// Returns the full command line as a string (for logging and errors).
    #[must_use]
    pub fn command_line(&self) -> String {
        use std::fmt::Write as _;
        let mut cmd = self.program().display().to_string();
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Spawns and runs the process, waiting for completion.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Spawning the child process fails.
    /// - The timeout elapses (the child is killed).
    /// - The process exits with a code outside the accepted set and
    ///   `ALLOW_FAILURE` is not set.
    pub async fn run(self) -> Result<ProcessOutput, ProcessError> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Spawns and runs the process with cancellation support.
    ///
    /// When the token is cancelled the child is killed and
    /// `ProcessError::Interrupted` is returned.
    ///
    /// # Errors
    ///
    /// Same as [`ProcessBuilder::run`], plus `Interrupted` on cancellation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tokio_util::sync::CancellationToken;
    /// use gitduo::core::process::builder::ProcessBuilder;
    ///
    /// let token = CancellationToken::new();
    /// let output = ProcessBuilder::new("git")
    ///     .args(["status", "--porcelain"])
    ///     .capture_output()
    ///     .run_with_cancellation(token.child_token())
    ///     .await?;
    /// ```
    pub async fn run_with_cancellation(
        self,
        token: CancellationToken,
    ) -> Result<ProcessOutput, ProcessError> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if token.is_cancelled() {
            return Err(ProcessError::Interrupted { command: cmd_line });
        }

        if let Some(cwd) = self.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let mut command = self.build_command();
        let mut child = command.spawn().map_err(|source| ProcessError::SpawnFailed {
            command: cmd_line.clone(),
            source,
        })?;

        trace!(process = %name, pid = ?child.id(), "spawned");

        let output = self
            .run_child(&name, &mut child, token)
            .await
            .map_err(|e| ProcessError::OutputError {
                command: cmd_line.clone(),
                message: e.to_string(),
            })?;

        if output.is_timed_out() {
            return Err(ProcessError::Timeout {
                command: cmd_line,
                timeout_secs: self.timeout_duration().map_or(0, |d| d.as_secs()),
            });
        }
        if output.is_interrupted() {
            return Err(ProcessError::Interrupted { command: cmd_line });
        }

        if !self.process_flags().contains(ProcessFlags::ALLOW_FAILURE)
            && !self.success_code_set().contains(&output.exit_code())
        {
            let stderr = output.stderr_str().trim().to_string();
            if !stderr.is_empty() {
                error!(process = %name, stderr = %stderr, "process error output");
            }
            return Err(ProcessError::NonZeroExit {
                command: cmd_line,
                code: output.exit_code(),
                stderr,
            });
        }

        trace!(process = %name, exit_code = output.exit_code(), "completed");
        Ok(output)
    }

    /// Builds the tokio Command from this builder's configuration.
    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());

        command.args(self.args_slice());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }

        for key in self.env_removals() {
            command.env_remove(key);
        }
        for (key, value) in self.env_overrides() {
            command.env(key, value);
        }

        if self.stdin_content().is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }

        command.stdout(Self::stdio_from_flags(self.stdout_config()));
        command.stderr(Self::stdio_from_flags(self.stderr_config()));

        // Kill on drop for safety
        command.kill_on_drop(true);

        command
    }

    /// Converts `StreamFlags` to Stdio configuration.
    fn stdio_from_flags(flags: StreamFlags) -> Stdio {
        if flags.contains(StreamFlags::BIT_BUCKET) {
            Stdio::null()
        } else {
            Stdio::piped()
        }
    }
}
