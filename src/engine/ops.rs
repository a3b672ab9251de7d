// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Single-call operations routed through the selector.

use std::path::Path;

use super::{Engine, provider_failure};
use crate::error::EngineResult;
use crate::provider::{
    BranchInfo, CloneOptions, DiffEntry, HeadState, Oid, Operation, SubmoduleInfo, WorktreeInfo,
    WorktreeStatus,
};
use crate::repository::RepositoryHandle;

/// Runs `$call` on the provider selected for `$op`, mapping its failure.
macro_rules! dispatch {
    ($engine:expr, $op:expr, |$provider:ident| $call:expr) => {{
        let operation = $op;
        let $provider = $engine.selector().select(operation, None)?;
        $call
            .await
            .map_err(provider_failure($provider.kind(), operation))
    }};
}

impl Engine {
    /// Creates a repository at `path`.
    ///
    /// # Errors
    ///
    /// Selection errors or the provider failure.
    pub async fn init(&self, path: &Path) -> EngineResult<RepositoryHandle> {
        dispatch!(self, Operation::Init, |p| p.init(path))
    }

    /// Clones `url` into `dest`.
    ///
    /// # Errors
    ///
    /// Selection errors or the provider failure.
    pub async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        options: &CloneOptions,
    ) -> EngineResult<RepositoryHandle> {
        dispatch!(self, Operation::Clone, |p| p.clone_repo(url, dest, options))
    }

    /// Where HEAD points.
    ///
    /// # Errors
    ///
    /// Selection errors or the provider failure.
    pub async fn head(&self, repo: &RepositoryHandle) -> EngineResult<HeadState> {
        dispatch!(self, Operation::Head, |p| p.head(repo))
    }

    /// Working tree status.
    ///
    /// # Errors
    ///
    /// Selection errors or the provider failure.
    pub async fn status(&self, repo: &RepositoryHandle) -> EngineResult<WorktreeStatus> {
        dispatch!(self, Operation::Status, |p| p.status(repo))
    }

    /// Resolves `spec` to a commit id.
    ///
    /// # Errors
    ///
    /// Selection errors or the provider failure.
    pub async fn rev_parse(&self, repo: &RepositoryHandle, spec: &str) -> EngineResult<Oid> {
        dispatch!(self, Operation::RevParse, |p| p.rev_parse(repo, spec))
    }

    /// Raw content of a blob.
    ///
    /// # Errors
    ///
    /// Selection errors or the provider failure.
    pub async fn read_blob(&self, repo: &RepositoryHandle, id: &Oid) -> EngineResult<Vec<u8>> {
        dispatch!(self, Operation::ReadBlob, |p| p.read_blob(repo, id))
    }

    /// Local branches.
    ///
    /// # Errors
    ///
    /// Selection errors or the provider failure.
    pub async fn list_branches(&self, repo: &RepositoryHandle) -> EngineResult<Vec<BranchInfo>> {
        dispatch!(self, Operation::ListBranches, |p| p.list_branches(repo))
    }

    /// Name-status diff from `from` to `to` (the working tree when `None`).
    ///
    /// # Errors
    ///
    /// Selection errors or the provider failure.
    pub async fn diff(
        &self,
        repo: &RepositoryHandle,
        from: &str,
        to: Option<&str>,
    ) -> EngineResult<Vec<DiffEntry>> {
        dispatch!(self, Operation::Diff, |p| p.diff(repo, from, to))
    }

    /// Creates branch `name` at `start` (HEAD when `None`).
    ///
    /// # Errors
    ///
    /// `RepositoryBusy`, selection errors or the provider failure.
    pub async fn create_branch(
        &self,
        repo: &RepositoryHandle,
        name: &str,
        start: Option<&str>,
    ) -> EngineResult<Oid> {
        let _lock = self.lock(repo).await?;
        dispatch!(self, Operation::CreateBranch, |p| p.create_branch(repo, name, start))
    }

    /// Checks out branch `name`.
    ///
    /// # Errors
    ///
    /// `OperationInProgress` while a multi-step operation is active.
    pub async fn switch_branch(&self, repo: &RepositoryHandle, name: &str) -> EngineResult<()> {
        let (_lock, state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        dispatch!(self, Operation::SwitchBranch, |p| p.switch_branch(repo, name))
    }

    /// Stages paths matching `pathspecs`.
    ///
    /// # Errors
    ///
    /// `RepositoryBusy`, selection errors or the provider failure.
    pub async fn stage(
        &self,
        repo: &RepositoryHandle,
        pathspecs: &[String],
    ) -> EngineResult<Vec<String>> {
        let _lock = self.lock(repo).await?;
        dispatch!(self, Operation::Stage, |p| p.stage(repo, pathspecs))
    }

    /// Commits the index.
    ///
    /// # Errors
    ///
    /// `OperationInProgress` while a multi-step operation is active.
    pub async fn commit(&self, repo: &RepositoryHandle, message: &str) -> EngineResult<Oid> {
        let (_lock, state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        dispatch!(self, Operation::Commit, |p| p.commit(repo, message))
    }

    /// Fetches `refspecs` from `remote`.
    ///
    /// # Errors
    ///
    /// `Unsupported` without the subprocess provider.
    pub async fn fetch(
        &self,
        repo: &RepositoryHandle,
        remote: &str,
        refspecs: &[String],
    ) -> EngineResult<()> {
        let _lock = self.lock(repo).await?;
        dispatch!(self, Operation::Fetch, |p| p.fetch(repo, remote, refspecs))
    }

    /// Pushes `refspecs` to `remote`.
    ///
    /// # Errors
    ///
    /// `Unsupported` without the subprocess provider.
    pub async fn push(
        &self,
        repo: &RepositoryHandle,
        remote: &str,
        refspecs: &[String],
        force: bool,
    ) -> EngineResult<()> {
        dispatch!(self, Operation::Push, |p| p.push(repo, remote, refspecs, force))
    }

    /// Adds a linked worktree at `path`.
    ///
    /// # Errors
    ///
    /// `Unsupported` without the subprocess provider.
    pub async fn worktree_add(
        &self,
        repo: &RepositoryHandle,
        path: &Path,
        branch: Option<&str>,
    ) -> EngineResult<WorktreeInfo> {
        let _lock = self.lock(repo).await?;
        dispatch!(self, Operation::WorktreeAdd, |p| p.worktree_add(repo, path, branch))
    }

    /// Main and linked worktrees.
    ///
    /// # Errors
    ///
    /// `Unsupported` without the subprocess provider.
    pub async fn worktree_list(&self, repo: &RepositoryHandle) -> EngineResult<Vec<WorktreeInfo>> {
        dispatch!(self, Operation::WorktreeList, |p| p.worktree_list(repo))
    }

    /// Removes the linked worktree at `path`.
    ///
    /// # Errors
    ///
    /// `Unsupported` without the subprocess provider.
    pub async fn worktree_remove(
        &self,
        repo: &RepositoryHandle,
        path: &Path,
        force: bool,
    ) -> EngineResult<()> {
        let _lock = self.lock(repo).await?;
        dispatch!(self, Operation::WorktreeRemove, |p| p.worktree_remove(repo, path, force))
    }

    /// Adds a submodule.
    ///
    /// # Errors
    ///
    /// `OperationInProgress` while a multi-step operation is active,
    /// `Unsupported` without the subprocess provider.
    pub async fn submodule_add(
        &self,
        repo: &RepositoryHandle,
        url: &str,
        path: &str,
    ) -> EngineResult<()> {
        let (_lock, state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        dispatch!(self, Operation::SubmoduleAdd, |p| p.submodule_add(repo, url, path))
    }

    /// Updates (and optionally initializes) submodules.
    ///
    /// # Errors
    ///
    /// `Unsupported` without the subprocess provider.
    pub async fn submodule_update(&self, repo: &RepositoryHandle, init: bool) -> EngineResult<()> {
        let _lock = self.lock(repo).await?;
        dispatch!(self, Operation::SubmoduleUpdate, |p| p.submodule_update(repo, init))
    }

    /// Registered submodules.
    ///
    /// # Errors
    ///
    /// `Unsupported` without the subprocess provider.
    pub async fn submodule_list(&self, repo: &RepositoryHandle) -> EngineResult<Vec<SubmoduleInfo>> {
        dispatch!(self, Operation::SubmoduleList, |p| p.submodule_list(repo))
    }
}
