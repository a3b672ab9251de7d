// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hybrid operation engine.
//!
//! ```text
//! command handler
//!       |
//!       v
//! Engine::<call>(&repo, ..)
//!   1. RepoLock::acquire        (mutating calls)
//!   2. store::load              RepoState
//!   3. Selector::select         pinned | owner | embedded | subprocess
//!   4. provider call(s)         one step at a time
//!   5. store::save              after every transition
//!   6. lock released on drop
//! ```
//!
//! Multi-step operations (merge, rebase, cherry-pick, bisect, unpark) are
//! driven by a persisted [`OperationDescriptor`]; every step's outcome is
//! written to disk before the next step starts, so `continue` and `abort`
//! work from a fresh process.

pub mod conflict;
pub mod lock;
mod ops;
pub mod park;
pub mod selector;
pub mod state;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::lock::RepoLock;
use self::selector::Selector;
use self::state::{Driver, OperationDescriptor, RepoState, Status};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, ProviderError};
use crate::provider::embedded::EmbeddedProvider;
use crate::provider::subprocess::SubprocessProvider;
use crate::provider::{
    BisectMark, HeadState, Oid, Operation, OperationKind, Provider, ProviderKind, ProviderSet,
    Step, StepOutcome,
};
use crate::repository::RepositoryHandle;

pub use self::conflict::{ResolutionPolicy, Side};

/// Default wait for the repository lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of finished operations kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Maps a provider failure to the engine error surfaced to callers.
pub(crate) fn provider_failure(
    provider: ProviderKind,
    operation: Operation,
) -> impl FnOnce(ProviderError) -> EngineError {
    move |source| {
        if source.is_interruption() {
            warn!(%operation, %provider, error = %source, "provider call interrupted");
            EngineError::Interrupted { operation }
        } else {
            EngineError::ProviderExecutionFailed {
                provider,
                operation,
                source,
            }
        }
    }
}

/// Entry point for every repository operation.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use gitduo::engine::Engine;
/// use gitduo::provider::{ProviderSet, embedded::EmbeddedProvider};
///
/// let engine = Engine::builder()
///     .providers(ProviderSet::empty().with(Arc::new(EmbeddedProvider::new())))
///     .build();
/// let outcome = engine.merge(&repo, "feature").await?;
/// ```
#[derive(Debug, Clone, Builder)]
pub struct Engine {
    providers: ProviderSet,
    /// Provider every call is pinned to, `None` for automatic selection.
    pinned: Option<ProviderKind>,
    #[builder(default = DEFAULT_LOCK_TIMEOUT)]
    lock_timeout: Duration,
    #[builder(default = DEFAULT_HISTORY_LIMIT)]
    history_limit: usize,
}

impl Engine {
    /// Builds an engine with both providers configured from `config`.
    #[must_use]
    pub fn from_config(config: &EngineConfig, cancel: CancellationToken) -> Self {
        let timeout = (config.git_timeout_secs > 0).then(|| config.git_timeout());
        let providers = ProviderSet::new(
            Arc::new(EmbeddedProvider::new()),
            Arc::new(SubprocessProvider::new(&config.git_program, timeout, cancel)),
        );
        Self::builder()
            .providers(providers)
            .maybe_pinned(config.provider.pinned())
            .lock_timeout(config.lock_timeout())
            .history_limit(config.history_limit)
            .build()
    }

    /// Registered providers.
    #[must_use]
    pub const fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    fn selector(&self) -> Selector<'_> {
        Selector::new(&self.providers, self.pinned)
    }

    async fn lock(&self, repo: &RepositoryHandle) -> EngineResult<(RepoLock, RepoState)> {
        let lock = RepoLock::acquire(repo, self.lock_timeout).await?;
        let state = store::load(repo)?;
        Ok((lock, state))
    }

    fn persist(
        repo: &RepositoryHandle,
        state: &mut RepoState,
        desc: &OperationDescriptor,
    ) -> EngineResult<()> {
        state.active = Some(desc.clone());
        store::save(repo, state)
    }

    fn ensure_idle(state: &RepoState) -> EngineResult<()> {
        match &state.active {
            Some(active) => Err(EngineError::OperationInProgress {
                kind: active.kind,
                id: active.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// HEAD of a clean working tree, the precondition of every `begin`.
    async fn clean_head(
        provider: &dyn Provider,
        repo: &RepositoryHandle,
        operation: Operation,
    ) -> EngineResult<(HeadState, Oid)> {
        let failed = || provider_failure(provider.kind(), operation);
        let head = provider.head(repo).await.map_err(failed())?;
        let orig = head.require_commit().map_err(failed())?.clone();
        let status = provider.status(repo).await.map_err(failed())?;
        if !status.is_clean() {
            return Err(EngineError::DirtyWorkingTree {
                paths: status.dirty_paths(),
            });
        }
        Ok((head, orig))
    }

    async fn resolve_rev(
        provider: &dyn Provider,
        repo: &RepositoryHandle,
        spec: &str,
    ) -> EngineResult<Oid> {
        provider
            .rev_parse(repo, spec)
            .await
            .map_err(provider_failure(provider.kind(), Operation::RevParse))
    }

    // --- Queries ---

    /// The active descriptor, if any.
    ///
    /// # Errors
    ///
    /// Returns `CorruptState` when the record cannot be read.
    pub fn active(&self, repo: &RepositoryHandle) -> EngineResult<Option<OperationDescriptor>> {
        Ok(store::load(repo)?.active)
    }

    /// Finished operations, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `CorruptState` when the record cannot be read.
    pub fn history(&self, repo: &RepositoryHandle) -> EngineResult<Vec<OperationDescriptor>> {
        Ok(store::load(repo)?.history)
    }

    // --- Begin ---

    /// Merges `target` into the current branch.
    ///
    /// # Errors
    ///
    /// `OperationInProgress`, `DirtyWorkingTree`, selection errors, or the
    /// provider failure of the merge step.
    pub async fn merge(
        &self,
        repo: &RepositoryHandle,
        target: &str,
    ) -> EngineResult<OperationDescriptor> {
        let (_lock, mut state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        let provider = self.selector().select(Operation::Merge, None)?;
        let (head, orig) = Self::clean_head(provider.as_ref(), repo, Operation::Merge).await?;
        let commit = Self::resolve_rev(provider.as_ref(), repo, target).await?;

        let mut desc = OperationDescriptor::new(
            OperationKind::Merge,
            provider.kind(),
            vec![target.to_string()],
            &head,
            orig,
        );
        desc.pending.push_back(Step::Merge {
            target: target.to_string(),
            commit,
        });
        self.start(repo, &mut state, desc, provider.as_ref()).await
    }

    /// Replays the current branch onto `upstream`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::merge`].
    pub async fn rebase(
        &self,
        repo: &RepositoryHandle,
        upstream: &str,
    ) -> EngineResult<OperationDescriptor> {
        let (_lock, mut state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        let provider = self.selector().select(Operation::RebaseBegin, None)?;
        let (head, orig) =
            Self::clean_head(provider.as_ref(), repo, Operation::RebaseBegin).await?;
        let upstream_id = Self::resolve_rev(provider.as_ref(), repo, upstream).await?;

        let mut desc = OperationDescriptor::new(
            OperationKind::Rebase,
            provider.kind(),
            vec![upstream.to_string()],
            &head,
            orig,
        );
        Self::persist(repo, &mut state, &desc)?;
        info!(id = %desc.id, upstream, "rebase started");

        let plan = match provider.rebase_begin(repo, &upstream_id).await {
            Ok(plan) => plan,
            Err(e) => {
                let err = provider_failure(provider.kind(), Operation::RebaseBegin)(e);
                return Err(self.rollback(repo, &mut state, desc, provider.as_ref(), err).await);
            }
        };
        desc.onto = Some(plan.onto);
        desc.pending = plan
            .commits
            .into_iter()
            .map(|commit| Step::Replay { commit })
            .collect();
        Self::persist(repo, &mut state, &desc)?;
        self.drive(repo, &mut state, desc, provider.as_ref(), true).await
    }

    /// Applies `revs` on top of HEAD in order.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::merge`].
    pub async fn cherry_pick(
        &self,
        repo: &RepositoryHandle,
        revs: &[String],
    ) -> EngineResult<OperationDescriptor> {
        let (_lock, mut state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        let provider = self.selector().select(Operation::CherryPick, None)?;
        let (head, orig) =
            Self::clean_head(provider.as_ref(), repo, Operation::CherryPick).await?;

        let mut desc = OperationDescriptor::new(
            OperationKind::CherryPick,
            provider.kind(),
            revs.to_vec(),
            &head,
            orig,
        );
        for rev in revs {
            let commit = Self::resolve_rev(provider.as_ref(), repo, rev).await?;
            desc.pending.push_back(Step::Pick { commit });
        }
        self.start(repo, &mut state, desc, provider.as_ref()).await
    }

    /// Runs a provider-native interactive rebase with the given todo list.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::merge`]; `Unsupported` without a capable provider.
    pub async fn interactive_rebase(
        &self,
        repo: &RepositoryHandle,
        onto: &str,
        todo: &str,
    ) -> EngineResult<OperationDescriptor> {
        let operation = Operation::InteractiveRebase;
        let (_lock, mut state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        let provider = self.selector().select(operation, None)?;
        let (head, orig) = Self::clean_head(provider.as_ref(), repo, operation).await?;
        let onto_id = Self::resolve_rev(provider.as_ref(), repo, onto).await?;

        let mut desc = OperationDescriptor::new(
            OperationKind::Rebase,
            provider.kind(),
            vec![onto.to_string()],
            &head,
            orig,
        );
        desc.driver = Driver::Native;
        desc.onto = Some(onto_id.clone());
        Self::persist(repo, &mut state, &desc)?;
        info!(id = %desc.id, onto, "interactive rebase started");

        match provider.interactive_rebase(repo, &onto_id, todo).await {
            Ok(outcome) => {
                self.settle_native(repo, &mut state, desc, outcome)
            }
            Err(e) => {
                let err = provider_failure(provider.kind(), operation)(e);
                Err(self.rollback(repo, &mut state, desc, provider.as_ref(), err).await)
            }
        }
    }

    /// Starts a bisect session between `bad` and the `good` revisions.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::interactive_rebase`].
    pub async fn bisect_start(
        &self,
        repo: &RepositoryHandle,
        bad: &str,
        good: &[String],
    ) -> EngineResult<OperationDescriptor> {
        let operation = Operation::BisectStart;
        let (_lock, mut state) = self.lock(repo).await?;
        Self::ensure_idle(&state)?;
        let provider = self.selector().select(operation, None)?;
        let (head, orig) = Self::clean_head(provider.as_ref(), repo, operation).await?;

        let targets = std::iter::once(bad.to_string())
            .chain(good.iter().cloned())
            .collect();
        let mut desc = OperationDescriptor::new(
            OperationKind::Bisect,
            provider.kind(),
            targets,
            &head,
            orig,
        );
        desc.driver = Driver::Native;
        Self::persist(repo, &mut state, &desc)?;

        match provider.bisect_start(repo, bad, good).await {
            Ok(outcome) => {
                info!(id = %desc.id, remaining = ?outcome.remaining, "bisect started");
                desc.bisect = Some(outcome);
                desc.transition(Status::Running);
                Self::persist(repo, &mut state, &desc)?;
                Ok(desc)
            }
            Err(e) => {
                let err = provider_failure(provider.kind(), operation)(e);
                Err(self.rollback(repo, &mut state, desc, provider.as_ref(), err).await)
            }
        }
    }

    /// Records a verdict for the current (or given) bisect candidate.
    ///
    /// # Errors
    ///
    /// `NoOperationInProgress` without a bisect session, `OperationInProgress`
    /// when another kind of operation is active.
    pub async fn bisect_mark(
        &self,
        repo: &RepositoryHandle,
        mark: BisectMark,
        rev: Option<&str>,
    ) -> EngineResult<OperationDescriptor> {
        let (_lock, mut state) = self.lock(repo).await?;
        let mut desc = Self::active_bisect(&state)?;
        let provider = self
            .selector()
            .select(Operation::BisectMark, Some(desc.provider))?;
        let outcome = provider
            .bisect_mark(repo, mark, rev)
            .await
            .map_err(provider_failure(provider.kind(), Operation::BisectMark))?;
        if let Some(culprit) = &outcome.culprit {
            info!(id = %desc.id, %culprit, "bisect found the first bad commit");
        }
        desc.bisect = Some(outcome);
        desc.transition(Status::Running);
        Self::persist(repo, &mut state, &desc)?;
        Ok(desc)
    }

    /// Ends the bisect session and returns to the original branch.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::bisect_mark`].
    pub async fn bisect_reset(&self, repo: &RepositoryHandle) -> EngineResult<OperationDescriptor> {
        let (_lock, mut state) = self.lock(repo).await?;
        let desc = Self::active_bisect(&state)?;
        let provider = self
            .selector()
            .select(Operation::BisectReset, Some(desc.provider))?;
        provider
            .bisect_reset(repo)
            .await
            .map_err(provider_failure(provider.kind(), Operation::BisectReset))?;
        self.finish(repo, &mut state, desc, Status::Completed)
    }

    fn active_bisect(state: &RepoState) -> EngineResult<OperationDescriptor> {
        match &state.active {
            Some(desc) if desc.kind == OperationKind::Bisect => Ok(desc.clone()),
            Some(desc) => Err(EngineError::OperationInProgress {
                kind: desc.kind,
                id: desc.id.clone(),
            }),
            None => Err(EngineError::NoOperationInProgress),
        }
    }

    // --- Lifecycle ---

    /// Resumes the active operation.
    ///
    /// # Errors
    ///
    /// `NoOperationInProgress` when idle, `UnresolvedConflicts` while any
    /// record is unresolved, `Unsupported` for bisect sessions.
    pub async fn continue_operation(
        &self,
        repo: &RepositoryHandle,
    ) -> EngineResult<OperationDescriptor> {
        let operation = Operation::ContinueActive;
        let (_lock, mut state) = self.lock(repo).await?;
        let mut desc = state
            .active
            .clone()
            .ok_or(EngineError::NoOperationInProgress)?;
        let provider = self.selector().select(operation, Some(desc.provider))?;

        if desc.kind == OperationKind::Bisect {
            return Err(EngineError::Unsupported {
                operation,
                reason: "bisect advances with good, bad or skip marks".to_string(),
            });
        }

        if desc.status == Status::Conflicted {
            let unresolved = desc.unresolved_paths();
            if !unresolved.is_empty() {
                return Err(EngineError::UnresolvedConflicts { paths: unresolved });
            }
        }

        if desc.driver == Driver::Native {
            let outcome = provider
                .continue_native(repo, desc.kind, &desc.conflicts)
                .await
                .map_err(provider_failure(provider.kind(), operation))?;
            desc.conflicts.clear();
            return self.settle_native(repo, &mut state, desc, outcome);
        }

        if let Some(step) = desc.current.clone() {
            let commit = provider
                .continue_active(repo, desc.kind, &step, &desc.conflicts)
                .await
                .map_err(provider_failure(provider.kind(), operation))?;
            debug!(id = %desc.id, ?commit, "committed resolved step");
            desc.applied.extend(commit);
            desc.current = None;
            desc.conflicts.clear();
        }
        desc.transition(Status::Running);
        Self::persist(repo, &mut state, &desc)?;
        info!(id = %desc.id, pending = desc.pending.len(), "operation resumed");
        self.drive(repo, &mut state, desc, provider.as_ref(), false).await
    }

    /// Rolls the active operation back to its pre-`begin` state.
    ///
    /// # Errors
    ///
    /// `NoOperationInProgress` when idle, or the provider failure.
    pub async fn abort(&self, repo: &RepositoryHandle) -> EngineResult<OperationDescriptor> {
        let operation = Operation::AbortActive;
        let (_lock, mut state) = self.lock(repo).await?;
        let desc = state
            .active
            .clone()
            .ok_or(EngineError::NoOperationInProgress)?;
        let provider = self.selector().select(operation, Some(desc.provider))?;
        provider
            .abort_active(repo, &desc.restore_point())
            .await
            .map_err(provider_failure(provider.kind(), operation))?;
        self.finish(repo, &mut state, desc, Status::Aborted)
    }

    /// Persists a fresh descriptor and runs its queue.
    async fn start(
        &self,
        repo: &RepositoryHandle,
        state: &mut RepoState,
        desc: OperationDescriptor,
        provider: &dyn Provider,
    ) -> EngineResult<OperationDescriptor> {
        Self::persist(repo, state, &desc)?;
        info!(id = %desc.id, kind = %desc.kind, provider = %desc.provider, steps = desc.pending.len(), "operation started");
        self.drive(repo, state, desc, provider, true).await
    }

    /// Runs pending steps until the queue empties or a step conflicts.
    ///
    /// With `fresh`, an outright failure of the first step rolls the
    /// operation back so the repository returns to idle.
    async fn drive(
        &self,
        repo: &RepositoryHandle,
        state: &mut RepoState,
        mut desc: OperationDescriptor,
        provider: &dyn Provider,
        fresh: bool,
    ) -> EngineResult<OperationDescriptor> {
        let mut first = fresh;
        while let Some(step) = desc.pending.front().cloned() {
            let operation = step_operation(&step);
            debug!(id = %desc.id, %operation, commit = ?step.commit(), "running step");
            let outcome = match run_step(provider, repo, &step).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let err = provider_failure(provider.kind(), operation)(e);
                    if first && !matches!(err, EngineError::Interrupted { .. }) {
                        return Err(self.rollback(repo, state, desc, provider, err).await);
                    }
                    return Err(err);
                }
            };
            first = false;
            desc.pending.pop_front();

            match outcome {
                StepOutcome::Clean { commit } => {
                    desc.applied.extend(commit);
                    desc.transition(Status::Running);
                    Self::persist(repo, state, &desc)?;
                }
                StepOutcome::Conflicted(records) => {
                    info!(id = %desc.id, conflicts = records.len(), "operation stopped on conflicts");
                    desc.current = Some(step);
                    desc.conflicts = records;
                    desc.transition(Status::Conflicted);
                    Self::persist(repo, state, &desc)?;
                    return Ok(desc);
                }
            }
        }

        if desc.kind == OperationKind::Rebase {
            provider
                .rebase_finish(repo, desc.orig_branch.as_deref())
                .await
                .map_err(provider_failure(provider.kind(), Operation::RebaseBegin))?;
        }
        if desc.kind == OperationKind::Unpark {
            self.release_parked(repo, state, &desc, provider).await?;
        }
        self.finish(repo, state, desc, Status::Completed)
    }

    /// Records the outcome of a provider-native sequencer.
    fn settle_native(
        &self,
        repo: &RepositoryHandle,
        state: &mut RepoState,
        mut desc: OperationDescriptor,
        outcome: StepOutcome,
    ) -> EngineResult<OperationDescriptor> {
        match outcome {
            StepOutcome::Clean { commit } => {
                desc.applied.extend(commit);
                self.finish(repo, state, desc, Status::Completed)
            }
            StepOutcome::Conflicted(records) => {
                info!(id = %desc.id, conflicts = records.len(), "native sequencer paused");
                desc.conflicts = records;
                desc.transition(Status::Conflicted);
                Self::persist(repo, state, &desc)?;
                Ok(desc)
            }
        }
    }

    /// Archives `desc` with a terminal status.
    fn finish(
        &self,
        repo: &RepositoryHandle,
        state: &mut RepoState,
        mut desc: OperationDescriptor,
        status: Status,
    ) -> EngineResult<OperationDescriptor> {
        desc.transition(status);
        state.active = Some(desc.clone());
        state.archive(self.history_limit);
        store::save(repo, state)?;
        info!(id = %desc.id, kind = %desc.kind, %status, applied = desc.applied.len(), "operation finished");
        Ok(desc)
    }

    /// Undoes a failed begin; keeps the descriptor when the rollback fails.
    async fn rollback(
        &self,
        repo: &RepositoryHandle,
        state: &mut RepoState,
        desc: OperationDescriptor,
        provider: &dyn Provider,
        err: EngineError,
    ) -> EngineError {
        warn!(id = %desc.id, error = %err, "begin failed, rolling back");
        if let Err(e) = provider.abort_active(repo, &desc.restore_point()).await {
            warn!(id = %desc.id, error = %e, "rollback failed, operation left active");
            return err;
        }
        if let Err(e) = self.finish(repo, state, desc, Status::Aborted) {
            warn!(error = %e, "failed to archive rolled back operation");
        }
        err
    }
}

/// Capability exercised by a step.
const fn step_operation(step: &Step) -> Operation {
    match step {
        Step::Merge { .. } => Operation::Merge,
        Step::Replay { .. } => Operation::RebaseStep,
        Step::Pick { .. } => Operation::CherryPick,
        Step::Unpark { .. } => Operation::StashApply,
    }
}

async fn run_step(
    provider: &dyn Provider,
    repo: &RepositoryHandle,
    step: &Step,
) -> Result<StepOutcome, ProviderError> {
    match step {
        Step::Merge { target, commit } => provider.merge(repo, target, commit).await,
        Step::Replay { commit } => provider.rebase_step(repo, commit).await,
        Step::Pick { commit } => provider.cherry_pick(repo, commit).await,
        Step::Unpark { payload } => provider.stash_apply(repo, payload).await,
    }
}

#[cfg(test)]
mod tests;
