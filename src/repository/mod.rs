// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Explicit repository handle.
//!
//! ```text
//! <workdir>/
//!   .git/               git_dir
//!     gitduo/           meta_dir
//!       state.json      persisted RepoState
//!       state.lock      advisory lock
//! ```
//!
//! Every engine and provider call receives a `&RepositoryHandle`; nothing
//! keeps a process-wide current repository.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Directory under the git dir holding engine metadata.
pub const META_DIR_NAME: &str = "gitduo";

const STATE_FILE_NAME: &str = "state.json";
const LOCK_FILE_NAME: &str = "state.lock";

/// A located, non-bare repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    workdir: PathBuf,
    git_dir: PathBuf,
    meta_dir: PathBuf,
}

impl RepositoryHandle {
    /// Discovers the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotARepository` when no repository encloses `path` or the
    /// repository is bare.
    pub fn discover(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let not_a_repo = || EngineError::NotARepository {
            path: path.display().to_string(),
        };

        let repo = gix::discover(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "repository discovery failed");
            not_a_repo()
        })?;
        let workdir = repo.workdir().ok_or_else(not_a_repo)?.to_path_buf();
        let handle = Self::at(workdir, repo.git_dir());
        debug!(workdir = %handle.workdir.display(), git_dir = %handle.git_dir.display(), "discovered repository");
        Ok(handle)
    }

    /// Builds a handle from explicit paths without touching the disk.
    pub fn at(workdir: impl AsRef<Path>, git_dir: impl AsRef<Path>) -> Self {
        let workdir = absolute(workdir.as_ref());
        let git_dir = absolute(git_dir.as_ref());
        let meta_dir = git_dir.join(META_DIR_NAME);
        Self {
            workdir,
            git_dir,
            meta_dir,
        }
    }

    /// Root of the working tree.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The repository's git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Engine metadata directory.
    #[must_use]
    pub fn meta_dir(&self) -> &Path {
        &self.meta_dir
    }

    /// Path of the persisted operation record.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.meta_dir.join(STATE_FILE_NAME)
    }

    /// Path of the advisory lock file.
    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.meta_dir.join(LOCK_FILE_NAME)
    }

    /// Creates the metadata directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `Metadata` if the directory cannot be created.
    pub fn ensure_meta_dir(&self) -> EngineResult<()> {
        std::fs::create_dir_all(&self.meta_dir).map_err(|source| EngineError::Metadata {
            path: self.meta_dir.display().to_string(),
            source,
        })
    }

    /// Absolute path of a `/`-separated working-tree path.
    #[must_use]
    pub fn worktree_path(&self, rel: &str) -> PathBuf {
        crate::utility::fs::walk::join_relative(&self.workdir, rel)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    })
}
