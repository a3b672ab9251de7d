// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! I/O streaming and output capture for processes.
//!
//! ```text
//! run_child()
//!   stdin writer task (optional)
//!   stdout/stderr reader tasks -> Vec<u8>
//!   select! { exit | timeout | cancelled }
//!   --> ProcessOutput { stdout, stderr, exit_code, timed_out, interrupted }
//! ```

use std::future::pending;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::builder::{ProcessBuilder, ProcessOutput, StreamFlags};

/// Spawns a reader task that drains `stream` into a buffer.
///
/// Lines are traced when `FORWARD_TO_LOG` is set; bytes are only kept when
/// `KEEP_IN_STRING` is set.
fn spawn_reader<R>(
    stream: Option<R>,
    flags: StreamFlags,
    process_name: &str,
    stream_name: &'static str,
) -> Option<JoinHandle<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    if !flags.intersects(StreamFlags::FORWARD_TO_LOG | StreamFlags::KEEP_IN_STRING) {
        return None;
    }
    let name = process_name.to_string();
    stream.map(|mut stream| {
        tokio::spawn(async move {
            let mut buffer = Vec::new();
            if let Err(e) = stream.read_to_end(&mut buffer).await {
                warn!(process = %name, stream = stream_name, error = %e, "error reading stream");
            }
            if flags.contains(StreamFlags::FORWARD_TO_LOG) {
                for line in String::from_utf8_lossy(&buffer).lines() {
                    trace!(process = %name, stream = stream_name, line = %line, "output");
                }
            }
            if flags.contains(StreamFlags::KEEP_IN_STRING) {
                buffer
            } else {
                Vec::new()
            }
        })
    })
}

async fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => Vec::new(),
    }
}

impl ProcessBuilder {
    /// Runs the child process to completion, timeout, or cancellation.
    pub(super) async fn run_child(
        &self,
        name: &str,
        child: &mut Child,
        token: CancellationToken,
    ) -> std::io::Result<ProcessOutput> {
        let stdout_handle = spawn_reader(child.stdout.take(), self.stdout_config(), name, "stdout");
        let stderr_handle = spawn_reader(child.stderr.take(), self.stderr_config(), name, "stderr");

        // Written from a separate task so a full stdout pipe cannot block us
        let stdin_handle = match (self.stdin_content(), child.stdin.take()) {
            (Some(content), Some(mut stdin)) => {
                let content = content.to_vec();
                Some(tokio::spawn(async move {
                    let _ = stdin.write_all(&content).await;
                    let _ = stdin.shutdown().await;
                }))
            }
            _ => None,
        };

        let timeout = self.timeout_duration();
        let deadline = async move {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => pending::<()>().await,
            }
        };

        let (status, timed_out, interrupted) = tokio::select! {
            status = child.wait() => (status?, false, false),
            () = deadline => {
                warn!(process = %name, timeout = ?timeout, "process timed out");
                child.kill().await.ok();
                (child.wait().await?, true, false)
            }
            () = token.cancelled() => {
                warn!(process = %name, "cancellation requested, terminating process");
                child.kill().await.ok();
                (child.wait().await?, false, true)
            }
        };

        if let Some(handle) = stdin_handle {
            let _ = handle.await;
        }
        let stdout = join_reader(stdout_handle).await;
        let stderr = join_reader(stderr_handle).await;

        Ok(ProcessOutput::new(
            status.code().unwrap_or(-1),
            stdout,
            stderr,
            timed_out,
            interrupted,
        ))
    }
}
