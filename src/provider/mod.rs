// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Capability provider interface.
//!
//! ```text
//!                 Provider (async_trait, Send + Sync)
//!                 kind() capabilities() is_available()
//!                        |
//!          +-------------+--------------+
//!          v                            v
//!   EmbeddedProvider              SubprocessProvider
//!   gix + merge3, in-process      git CLI via ProcessBuilder
//!   baseline operations           full operation set
//! ```
//!
//! Every method takes the explicit [`RepositoryHandle`]. Advanced methods
//! default to [`ProviderError::Unsupported`]; a provider overrides exactly
//! the operations it declares in [`Provider::capabilities`].

pub mod embedded;
pub mod markers;
pub mod merge3;
pub mod subprocess;
pub mod types;

use async_trait::async_trait;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ProviderError, ProviderResult};
use crate::repository::RepositoryHandle;

pub use types::*;

/// Which backend a provider is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Embedded,
    Subprocess,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Embedded => "embedded",
            Self::Subprocess => "subprocess",
        })
    }
}

macro_rules! operations {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Repository operations a provider may declare.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $($variant),+
        }

        impl Operation {
            /// Every operation, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable lowercase name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }
    };
}

operations! {
    Init => "init",
    Clone => "clone",
    Head => "head",
    Status => "status",
    RevParse => "rev-parse",
    ReadBlob => "read-blob",
    ListBranches => "list-branches",
    CreateBranch => "create-branch",
    SwitchBranch => "switch-branch",
    Stage => "stage",
    Commit => "commit",
    Diff => "diff",
    Merge => "merge",
    RebaseBegin => "rebase",
    RebaseStep => "rebase-step",
    CherryPick => "cherry-pick",
    AbortActive => "abort",
    ContinueActive => "continue",
    StashCreate => "park",
    StashList => "park-list",
    StashApply => "resume",
    StashDrop => "park-drop",
    Fetch => "fetch",
    Push => "push",
    InteractiveRebase => "interactive-rebase",
    BisectStart => "bisect-start",
    BisectMark => "bisect-mark",
    BisectReset => "bisect-reset",
    WorktreeAdd => "worktree-add",
    WorktreeList => "worktree-list",
    WorktreeRemove => "worktree-remove",
    SubmoduleAdd => "submodule-add",
    SubmoduleUpdate => "submodule-update",
    SubmoduleList => "submodule-list",
}

impl Operation {
    /// Capability bit for this operation.
    #[must_use]
    pub const fn capability(self) -> Capabilities {
        Capabilities::from_bits_retain(1 << self as u64)
    }

    /// Operations only a full-featured backend is expected to provide.
    #[must_use]
    pub const fn is_advanced(self) -> bool {
        matches!(
            self,
            Self::InteractiveRebase
                | Self::BisectStart
                | Self::BisectMark
                | Self::BisectReset
                | Self::WorktreeAdd
                | Self::WorktreeList
                | Self::WorktreeRemove
                | Self::SubmoduleAdd
                | Self::SubmoduleUpdate
                | Self::SubmoduleList
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Static set of operations a provider supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u64 {}
}

impl Capabilities {
    /// Builds a set from a list of operations.
    #[must_use]
    pub fn of(ops: &[Operation]) -> Self {
        ops.iter()
            .fold(Self::empty(), |acc, op| acc | op.capability())
    }

    /// Every known operation.
    #[must_use]
    pub fn everything() -> Self {
        Self::of(Operation::ALL)
    }

    /// Whether `op` is declared.
    #[must_use]
    pub const fn supports(self, op: Operation) -> bool {
        self.contains(op.capability())
    }

    /// Declared operations, in declaration order.
    pub fn operations(self) -> impl Iterator<Item = Operation> {
        Operation::ALL
            .iter()
            .copied()
            .filter(move |op| self.supports(*op))
    }
}

/// Message of a merge commit created for `target`.
pub(crate) fn merge_message(target: &str) -> String {
    format!("Merge branch '{target}'")
}

/// Builds the `Unsupported` error for a provider.
const fn unsupported<T>(kind: ProviderKind, operation: Operation) -> ProviderResult<T> {
    Err(ProviderError::Unsupported {
        provider: kind,
        operation,
    })
}

/// The contract both backends implement.
///
/// Providers never hold engine state: they receive plain data (steps,
/// conflict records, restore points) and return plain data.
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Static capability set.
    fn capabilities(&self) -> Capabilities;

    /// Whether the backend can run on this host.
    fn is_available(&self) -> bool;

    // --- Repository lifecycle ---

    /// Creates a repository at `path`.
    async fn init(&self, path: &Path) -> ProviderResult<RepositoryHandle>;

    /// Clones `url` into `dest`.
    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        options: &CloneOptions,
    ) -> ProviderResult<RepositoryHandle>;

    // --- Queries ---

    async fn head(&self, repo: &RepositoryHandle) -> ProviderResult<HeadState>;

    async fn status(&self, repo: &RepositoryHandle) -> ProviderResult<WorktreeStatus>;

    /// Resolves a revision to a commit id.
    async fn rev_parse(&self, repo: &RepositoryHandle, spec: &str) -> ProviderResult<Oid>;

    async fn read_blob(&self, repo: &RepositoryHandle, id: &Oid) -> ProviderResult<Vec<u8>>;

    async fn list_branches(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<BranchInfo>>;

    /// Name-status diff between two revisions, or between `from` and the
    /// working tree when `to` is `None`.
    async fn diff(
        &self,
        repo: &RepositoryHandle,
        from: &str,
        to: Option<&str>,
    ) -> ProviderResult<Vec<DiffEntry>>;

    // --- Basic mutations ---

    /// Creates `name` at `start` (HEAD when `None`).
    async fn create_branch(
        &self,
        repo: &RepositoryHandle,
        name: &str,
        start: Option<&str>,
    ) -> ProviderResult<Oid>;

    async fn switch_branch(&self, repo: &RepositoryHandle, name: &str) -> ProviderResult<()>;

    /// Stages paths matching `pathspecs`, returning the staged paths.
    async fn stage(
        &self,
        repo: &RepositoryHandle,
        pathspecs: &[String],
    ) -> ProviderResult<Vec<String>>;

    async fn commit(&self, repo: &RepositoryHandle, message: &str) -> ProviderResult<Oid>;

    // --- Multi-step operations ---

    /// Merges `commit` (named `target`) into HEAD.
    async fn merge(
        &self,
        repo: &RepositoryHandle,
        target: &str,
        commit: &Oid,
    ) -> ProviderResult<StepOutcome>;

    /// Plans a rebase onto `upstream` and detaches HEAD at the new base.
    async fn rebase_begin(
        &self,
        repo: &RepositoryHandle,
        upstream: &Oid,
    ) -> ProviderResult<RebasePlan>;

    /// Replays one commit onto HEAD.
    async fn rebase_step(&self, repo: &RepositoryHandle, commit: &Oid)
    -> ProviderResult<StepOutcome>;

    /// Moves `branch` to HEAD and re-attaches HEAD to it.
    async fn rebase_finish(
        &self,
        repo: &RepositoryHandle,
        branch: Option<&str>,
    ) -> ProviderResult<()>;

    /// Applies one commit on top of HEAD.
    async fn cherry_pick(&self, repo: &RepositoryHandle, commit: &Oid)
    -> ProviderResult<StepOutcome>;

    /// Commits the resolved state of a conflicted step.
    ///
    /// `records` hold the resolutions already written to the working tree.
    /// Returns the new commit, or `None` when nothing had to be committed.
    async fn continue_active(
        &self,
        repo: &RepositoryHandle,
        kind: OperationKind,
        step: &Step,
        records: &[ConflictRecord],
    ) -> ProviderResult<Option<Oid>>;

    /// Restores refs, HEAD, index and working tree to `restore`.
    async fn abort_active(
        &self,
        repo: &RepositoryHandle,
        restore: &RestorePoint,
    ) -> ProviderResult<()>;

    // --- Park payloads ---

    /// Snapshots uncommitted work under `id` and resets the working tree to
    /// HEAD. Returns `None` when there is nothing to snapshot.
    async fn stash_create(
        &self,
        repo: &RepositoryHandle,
        id: &str,
        label: &str,
    ) -> ProviderResult<Option<ParkPayload>>;

    /// Payloads currently stored by this provider.
    async fn stash_list(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<ParkPayload>>;

    /// Applies a payload to the working tree.
    async fn stash_apply(
        &self,
        repo: &RepositoryHandle,
        payload: &ParkPayload,
    ) -> ProviderResult<StepOutcome>;

    async fn stash_drop(&self, repo: &RepositoryHandle, payload: &ParkPayload)
    -> ProviderResult<()>;

    // --- Remote operations ---

    async fn fetch(
        &self,
        _repo: &RepositoryHandle,
        _remote: &str,
        _refspecs: &[String],
    ) -> ProviderResult<()> {
        unsupported(self.kind(), Operation::Fetch)
    }

    async fn push(
        &self,
        _repo: &RepositoryHandle,
        _remote: &str,
        _refspecs: &[String],
        _force: bool,
    ) -> ProviderResult<()> {
        unsupported(self.kind(), Operation::Push)
    }

    // --- Advanced operations ---

    /// Runs a native interactive rebase driven by `todo`.
    async fn interactive_rebase(
        &self,
        _repo: &RepositoryHandle,
        _onto: &Oid,
        _todo: &str,
    ) -> ProviderResult<StepOutcome> {
        unsupported(self.kind(), Operation::InteractiveRebase)
    }

    /// Resumes a provider-native sequencer once conflicts are resolved.
    async fn continue_native(
        &self,
        _repo: &RepositoryHandle,
        _kind: OperationKind,
        _records: &[ConflictRecord],
    ) -> ProviderResult<StepOutcome> {
        unsupported(self.kind(), Operation::InteractiveRebase)
    }

    async fn bisect_start(
        &self,
        _repo: &RepositoryHandle,
        _bad: &str,
        _good: &[String],
    ) -> ProviderResult<BisectOutcome> {
        unsupported(self.kind(), Operation::BisectStart)
    }

    async fn bisect_mark(
        &self,
        _repo: &RepositoryHandle,
        _mark: BisectMark,
        _rev: Option<&str>,
    ) -> ProviderResult<BisectOutcome> {
        unsupported(self.kind(), Operation::BisectMark)
    }

    async fn bisect_reset(&self, _repo: &RepositoryHandle) -> ProviderResult<()> {
        unsupported(self.kind(), Operation::BisectReset)
    }

    async fn worktree_add(
        &self,
        _repo: &RepositoryHandle,
        _path: &Path,
        _branch: Option<&str>,
    ) -> ProviderResult<WorktreeInfo> {
        unsupported(self.kind(), Operation::WorktreeAdd)
    }

    async fn worktree_list(&self, _repo: &RepositoryHandle) -> ProviderResult<Vec<WorktreeInfo>> {
        unsupported(self.kind(), Operation::WorktreeList)
    }

    async fn worktree_remove(
        &self,
        _repo: &RepositoryHandle,
        _path: &Path,
        _force: bool,
    ) -> ProviderResult<()> {
        unsupported(self.kind(), Operation::WorktreeRemove)
    }

    async fn submodule_add(
        &self,
        _repo: &RepositoryHandle,
        _url: &str,
        _path: &str,
    ) -> ProviderResult<()> {
        unsupported(self.kind(), Operation::SubmoduleAdd)
    }

    async fn submodule_update(&self, _repo: &RepositoryHandle, _init: bool) -> ProviderResult<()> {
        unsupported(self.kind(), Operation::SubmoduleUpdate)
    }

    async fn submodule_list(&self, _repo: &RepositoryHandle) -> ProviderResult<Vec<SubmoduleInfo>> {
        unsupported(self.kind(), Operation::SubmoduleList)
    }
}

/// The providers known to an engine instance.
#[derive(Debug, Clone)]
pub struct ProviderSet {
    embedded: Option<Arc<dyn Provider>>,
    subprocess: Option<Arc<dyn Provider>>,
}

impl ProviderSet {
    /// Registers both providers.
    #[must_use]
    pub fn new(embedded: Arc<dyn Provider>, subprocess: Arc<dyn Provider>) -> Self {
        Self {
            embedded: Some(embedded),
            subprocess: Some(subprocess),
        }
    }

    /// An empty set; providers are added with [`ProviderSet::with`].
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            embedded: None,
            subprocess: None,
        }
    }

    /// Registers `provider` under its own kind, replacing any previous one.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn Provider>) -> Self {
        match provider.kind() {
            ProviderKind::Embedded => self.embedded = Some(provider),
            ProviderKind::Subprocess => self.subprocess = Some(provider),
        }
        self
    }

    /// The registered provider of `kind`, available or not.
    #[must_use]
    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn Provider>> {
        match kind {
            ProviderKind::Embedded => self.embedded.as_ref(),
            ProviderKind::Subprocess => self.subprocess.as_ref(),
        }
    }

    /// The provider of `kind` when registered and available.
    #[must_use]
    pub fn available(&self, kind: ProviderKind) -> Option<&Arc<dyn Provider>> {
        self.get(kind).filter(|p| p.is_available())
    }
}
