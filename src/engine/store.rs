// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! JSON metadata store.
//!
//! The whole [`RepoState`] is rewritten on every save: serialized into a
//! temporary file next to `state.json`, synced, then renamed over it.

use std::io::{BufWriter, ErrorKind, Write};

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use super::state::{RepoState, STATE_VERSION};
use crate::error::{EngineError, EngineResult};
use crate::repository::RepositoryHandle;

/// Loads the persisted record; a missing file is an empty state.
///
/// # Errors
///
/// Returns `CorruptState` when the file exists but cannot be parsed or has an
/// unknown version. The file is left untouched.
pub fn load(repo: &RepositoryHandle) -> EngineResult<RepoState> {
    let path = repo.state_file();
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            trace!(path = %path.display(), "no state file, starting idle");
            return Ok(RepoState::default());
        }
        Err(source) => {
            return Err(EngineError::Metadata {
                path: path.display().to_string(),
                source,
            });
        }
    };

    let corrupt = |message: String| EngineError::CorruptState {
        path: path.display().to_string(),
        message,
    };
    let state: RepoState = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
    if state.version != STATE_VERSION {
        return Err(corrupt(format!(
            "unsupported version {} (expected {STATE_VERSION})",
            state.version
        )));
    }
    Ok(state)
}

/// Atomically replaces the persisted record.
///
/// # Errors
///
/// Returns `Metadata` on any I/O failure; the previous record stays intact.
pub fn save(repo: &RepositoryHandle, state: &RepoState) -> EngineResult<()> {
    repo.ensure_meta_dir()?;
    let path = repo.state_file();
    let io_err = |source: std::io::Error| EngineError::Metadata {
        path: path.display().to_string(),
        source,
    };

    let file = NamedTempFile::new_in(repo.meta_dir()).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, state).map_err(|e| io_err(e.into()))?;
    writer.write_all(b"\n").map_err(io_err)?;
    let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(&path).map_err(|e| io_err(e.error))?;

    debug!(
        path = %path.display(),
        active = state.active.as_ref().map(|d| d.id.as_str()),
        parks = state.parks.len(),
        "saved operation state"
    );
    Ok(())
}
