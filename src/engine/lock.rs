// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Advisory repository lock.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use fs4::fs_std::FileExt;
use tracing::{debug, trace};

use crate::error::{EngineError, EngineResult};
use crate::repository::RepositoryHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exclusive lock on `<git-dir>/gitduo/state.lock`, released on drop.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
    path: PathBuf,
}

impl RepoLock {
    /// Acquires the lock, polling until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryBusy` when another holder keeps the lock past
    /// `timeout`, or `Metadata` when the lock file cannot be opened.
    pub async fn acquire(repo: &RepositoryHandle, timeout: Duration) -> EngineResult<Self> {
        repo.ensure_meta_dir()?;
        let path = repo.lock_file();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| EngineError::Metadata {
                path: path.display().to_string(),
                source,
            })?;

        let started = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    trace!(path = %path.display(), "acquired repository lock");
                    return Ok(Self { file, path });
                }
                Err(e) if started.elapsed() >= timeout => {
                    debug!(path = %path.display(), error = %e, "repository lock still held");
                    return Err(EngineError::RepositoryBusy {
                        path: path.display().to_string(),
                        waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                Err(_) => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "failed to release repository lock");
        }
    }
}
