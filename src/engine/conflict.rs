// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Conflict resolution.
//!
//! Resolutions only touch the working tree and the persisted record; the
//! originating provider stages and commits them on `continue`.

use std::io::ErrorKind;

use tracing::{debug, info};

use super::{Engine, provider_failure};
use crate::error::{EngineError, EngineResult};
use crate::provider::markers::contains_markers;
use crate::provider::{ConflictRecord, Operation, Provider, Resolution};
use crate::repository::RepositoryHandle;

/// One side of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Ours,
    Theirs,
}

/// How to resolve one conflicted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPolicy {
    Ours,
    Theirs,
    /// Caller-supplied final content.
    Manual(Vec<u8>),
}

impl From<Side> for ResolutionPolicy {
    fn from(side: Side) -> Self {
        match side {
            Side::Ours => Self::Ours,
            Side::Theirs => Self::Theirs,
        }
    }
}

impl ResolutionPolicy {
    const fn resolution(&self) -> Resolution {
        match self {
            Self::Ours => Resolution::ResolvedOurs,
            Self::Theirs => Resolution::ResolvedTheirs,
            Self::Manual(_) => Resolution::ResolvedManual,
        }
    }
}

/// Writes the resolved content of `record` into the working tree.
async fn apply(
    provider: &dyn Provider,
    repo: &RepositoryHandle,
    record: &mut ConflictRecord,
    policy: &ResolutionPolicy,
) -> EngineResult<()> {
    let content = match policy {
        ResolutionPolicy::Manual(content) => {
            if contains_markers(content) {
                return Err(EngineError::ConflictMarkersRemain {
                    path: record.path.clone(),
                });
            }
            Some(content.clone())
        }
        ResolutionPolicy::Ours | ResolutionPolicy::Theirs => {
            let side = if *policy == ResolutionPolicy::Ours {
                &record.ours
            } else {
                &record.theirs
            };
            match side {
                Some(id) => Some(
                    provider
                        .read_blob(repo, id)
                        .await
                        .map_err(provider_failure(provider.kind(), Operation::ReadBlob))?,
                ),
                None => None,
            }
        }
    };

    let path = repo.worktree_path(&record.path);
    let io_err = |source: std::io::Error| EngineError::Metadata {
        path: path.display().to_string(),
        source,
    };
    match content {
        Some(bytes) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
            tokio::fs::write(&path, bytes).await.map_err(io_err)?;
        }
        None => match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(io_err(e)),
            _ => {}
        },
    }

    record.resolution = policy.resolution();
    record.hunks.clear();
    debug!(path = %record.path, resolution = %record.resolution, "resolved conflict");
    Ok(())
}

impl Engine {
    /// Conflict records of the active operation.
    ///
    /// # Errors
    ///
    /// `NoOperationInProgress` when idle.
    pub fn list_conflicts(&self, repo: &RepositoryHandle) -> EngineResult<Vec<ConflictRecord>> {
        self.active(repo)?
            .map(|desc| desc.conflicts)
            .ok_or(EngineError::NoOperationInProgress)
    }

    /// Resolves one path. Re-resolving a path overwrites the previous choice.
    ///
    /// # Errors
    ///
    /// `UnknownPath` when `path` has no record, `ConflictMarkersRemain` for
    /// manual content that still carries markers.
    pub async fn resolve(
        &self,
        repo: &RepositoryHandle,
        path: &str,
        policy: &ResolutionPolicy,
    ) -> EngineResult<ConflictRecord> {
        let path = path.trim_start_matches("./");
        let (_lock, mut state) = self.lock(repo).await?;
        let mut desc = state
            .active
            .clone()
            .ok_or(EngineError::NoOperationInProgress)?;
        let provider = self
            .selector()
            .select(Operation::ReadBlob, Some(desc.provider))?;

        let record = desc.conflict_mut(path).ok_or_else(|| EngineError::UnknownPath {
            path: path.to_string(),
        })?;
        apply(provider.as_ref(), repo, record, policy).await?;
        let resolved = record.clone();

        Self::persist(repo, &mut state, &desc)?;
        info!(path, resolution = %resolved.resolution, "conflict resolved");
        Ok(resolved)
    }

    /// Resolves every unresolved record with one side; returns their paths.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::resolve`]. Records resolved before a failure stay
    /// resolved.
    pub async fn resolve_all(&self, repo: &RepositoryHandle, side: Side) -> EngineResult<Vec<String>> {
        let policy = ResolutionPolicy::from(side);
        let (_lock, mut state) = self.lock(repo).await?;
        let mut desc = state
            .active
            .clone()
            .ok_or(EngineError::NoOperationInProgress)?;
        let provider = self
            .selector()
            .select(Operation::ReadBlob, Some(desc.provider))?;

        let mut resolved = Vec::new();
        for index in 0..desc.conflicts.len() {
            if desc.conflicts[index].resolution.is_resolved() {
                continue;
            }
            let applied = apply(provider.as_ref(), repo, &mut desc.conflicts[index], &policy).await;
            if let Err(e) = applied {
                Self::persist(repo, &mut state, &desc)?;
                return Err(e);
            }
            resolved.push(desc.conflicts[index].path.clone());
        }

        Self::persist(repo, &mut state, &desc)?;
        info!(count = resolved.len(), ?side, "resolved all conflicts");
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_resolution() {
        assert_eq!(ResolutionPolicy::Ours.resolution(), Resolution::ResolvedOurs);
        assert_eq!(ResolutionPolicy::Theirs.resolution(), Resolution::ResolvedTheirs);
        assert_eq!(
            ResolutionPolicy::Manual(b"x".to_vec()).resolution(),
            Resolution::ResolvedManual
        );
    }

    #[test]
    fn test_side_into_policy() {
        assert_eq!(ResolutionPolicy::from(Side::Ours), ResolutionPolicy::Ours);
        assert_eq!(ResolutionPolicy::from(Side::Theirs), ResolutionPolicy::Theirs);
    }
}
