// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Park store: named snapshots of uncommitted work.
//!
//! ```text
//! park   status dirty? -> provider.stash_create -> parks.insert(0, entry)
//! resume entry -> Unpark descriptor [Step::Unpark] -> drive
//!          clean      -> Completed, entry removed unless keep
//!          conflicts  -> Conflicted, continue/abort as any operation
//! drop   provider.stash_drop -> parks.remove
//! ```

use chrono::{DateTime, Utc};
use tracing::info;

use super::state::{OperationDescriptor, ParkContext, ParkEntry, RepoState};
use super::{Engine, provider_failure, store};
use crate::error::{EngineError, EngineResult};
use crate::provider::{Operation, OperationKind, Provider, Step};
use crate::repository::RepositoryHandle;

/// Label used when the caller gives none.
#[must_use]
pub fn default_label(now: DateTime<Utc>) -> String {
    now.format("park-%Y%m%d-%H%M%S").to_string()
}

/// First free label among `base`, `base-2`, `base-3`, ...
fn unique_label(state: &RepoState, base: String) -> String {
    let taken = |label: &str| state.parks.iter().any(|p| p.label == label);
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let label = format!("{base}-{n}");
        if !taken(&label) {
            return label;
        }
        n += 1;
    }
}

/// Reference-safe id for a new payload.
fn payload_id(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S%9f").to_string()
}

fn find(state: &RepoState, selector: Option<&str>) -> EngineResult<usize> {
    match selector {
        Some(selector) => state
            .find_park(selector)
            .ok_or_else(|| EngineError::ParkEntryNotFound {
                selector: selector.to_string(),
            }),
        None if state.parks.is_empty() => Err(EngineError::ParkEntryNotFound {
            selector: "latest".to_string(),
        }),
        None => Ok(0),
    }
}

impl Engine {
    /// Parks uncommitted work (tracked and untracked) and cleans the tree.
    ///
    /// # Errors
    ///
    /// `OperationInProgress`, `ParkLabelTaken`, `NothingToPark`, or the
    /// provider failure.
    pub async fn park(
        &self,
        repo: &RepositoryHandle,
        label: Option<&str>,
    ) -> EngineResult<ParkEntry> {
        let operation = Operation::StashCreate;
        let (_lock, mut state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;

        let now = Utc::now();
        let label = match label {
            Some(label) if state.parks.iter().any(|p| p.label == label) => {
                return Err(EngineError::ParkLabelTaken {
                    label: label.to_string(),
                });
            }
            Some(label) => label.to_string(),
            None => unique_label(&state, default_label(now)),
        };

        let provider = self.selector().select(operation, None)?;
        let failed = || provider_failure(provider.kind(), operation);
        let head = provider.head(repo).await.map_err(failed())?;
        let base = head.require_commit().map_err(failed())?.clone();

        let payload = provider
            .stash_create(repo, &payload_id(now), &label)
            .await
            .map_err(failed())?
            .ok_or(EngineError::NothingToPark)?;

        let entry = ParkEntry {
            label,
            created_at: now,
            base,
            branch: head.branch,
            provider: provider.kind(),
            payload,
        };
        state.parks.insert(0, entry.clone());
        store::save(repo, &state)?;
        info!(label = %entry.label, provider = %entry.provider, "parked work");
        Ok(entry)
    }

    /// Park entries, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `CorruptState` when the record cannot be read.
    pub fn parks(&self, repo: &RepositoryHandle) -> EngineResult<Vec<ParkEntry>> {
        Ok(store::load(repo)?.parks)
    }

    /// Re-applies a park entry (the newest when `selector` is `None`).
    ///
    /// # Errors
    ///
    /// `ParkEntryNotFound`, `OperationInProgress`, `DirtyWorkingTree`,
    /// `ProviderMismatch` when pinned to another provider than the creator.
    pub async fn resume(
        &self,
        repo: &RepositoryHandle,
        selector: Option<&str>,
        keep: bool,
    ) -> EngineResult<OperationDescriptor> {
        let operation = Operation::StashApply;
        let (_lock, mut state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        let entry = state.parks[find(&state, selector)?].clone();
        let provider = self.selector().select(operation, Some(entry.provider))?;
        let (head, orig) = Self::clean_head(provider.as_ref(), repo, operation).await?;

        let mut desc = OperationDescriptor::new(
            OperationKind::Unpark,
            provider.kind(),
            vec![entry.label.clone()],
            &head,
            orig,
        );
        desc.park = Some(ParkContext {
            label: entry.label,
            keep,
        });
        desc.pending.push_back(Step::Unpark {
            payload: entry.payload,
        });
        self.start(repo, &mut state, desc, provider.as_ref()).await
    }

    /// Removes a park entry and its payload.
    ///
    /// # Errors
    ///
    /// `ParkEntryNotFound`, `OperationInProgress` while the entry is being
    /// resumed, `ProviderMismatch` when pinned to another provider.
    pub async fn drop_park(
        &self,
        repo: &RepositoryHandle,
        selector: &str,
    ) -> EngineResult<ParkEntry> {
        let operation = Operation::StashDrop;
        let (_lock, mut state) = self.lock(repo).await?;
        let index = find(&state, Some(selector))?;
        let entry = state.parks[index].clone();
        if let Some(active) = state
            .active
            .as_ref()
            .filter(|d| d.park.as_ref().is_some_and(|p| p.label == entry.label))
        {
            return Err(EngineError::OperationInProgress {
                kind: active.kind,
                id: active.id.clone(),
            });
        }

        let provider = self.selector().select(operation, Some(entry.provider))?;
        provider
            .stash_drop(repo, &entry.payload)
            .await
            .map_err(provider_failure(provider.kind(), operation))?;
        state.parks.remove(index);
        store::save(repo, &state)?;
        info!(label = %entry.label, "dropped park entry");
        Ok(entry)
    }

    /// Drops the entry an Unpark operation resumed, unless it is kept.
    pub(super) async fn release_parked(
        &self,
        repo: &RepositoryHandle,
        state: &mut RepoState,
        desc: &OperationDescriptor,
        provider: &dyn Provider,
    ) -> EngineResult<()> {
        let Some(context) = desc.park.as_ref().filter(|p| !p.keep) else {
            return Ok(());
        };
        let Some(index) = state.parks.iter().position(|p| p.label == context.label) else {
            return Ok(());
        };
        let entry = state.parks.remove(index);
        provider
            .stash_drop(repo, &entry.payload)
            .await
            .map_err(provider_failure(provider.kind(), Operation::StashDrop))?;
        info!(label = %entry.label, "resumed park entry removed");
        Ok(())
    }
}
