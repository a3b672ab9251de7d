// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-process provider built on gix.
//!
//! ```text
//! merge / rebase-step / cherry-pick / resume
//!         |
//!         v
//!   merge_trees(base, ours, theirs)  -- flat trees, merge3 per blob
//!         |
//!   +-----+------------------+
//!   | clean                  | conflicts
//!   v                        v
//! write tree + commit    index = clean result (ours at conflicted paths)
//! checkout               worktree = markers / kept side
//!                        -> ConflictRecords
//! ```
//!
//! Every call opens the repository afresh; nothing is cached between calls.

mod merge;
mod odb;
mod worktree;

use std::path::Path;
use std::sync::atomic::AtomicBool;

use async_trait::async_trait;
use gix::ObjectId;
use tracing::{debug, info};

use self::merge::merge_trees;
use self::odb::{FlatTree, Odb};
use crate::error::{GixError, ProviderError, ProviderResult};
use crate::provider::merge3::MarkerLabels;
use crate::provider::{
    BranchInfo, Capabilities, CloneOptions, ConflictRecord, DiffEntry, HeadState, Oid, Operation,
    OperationKind, PARK_REF_PREFIX, ParkPayload, Provider, ProviderKind, RebasePlan, RestorePoint,
    Step, StepOutcome, WorktreeStatus, merge_message,
};
use crate::repository::RepositoryHandle;
use crate::utility::fs::walk::match_pathspecs;

/// Operations the embedded provider implements.
const EMBEDDED_OPERATIONS: &[Operation] = &[
    Operation::Init,
    Operation::Clone,
    Operation::Head,
    Operation::Status,
    Operation::RevParse,
    Operation::ReadBlob,
    Operation::ListBranches,
    Operation::CreateBranch,
    Operation::SwitchBranch,
    Operation::Stage,
    Operation::Commit,
    Operation::Diff,
    Operation::Merge,
    Operation::RebaseBegin,
    Operation::RebaseStep,
    Operation::CherryPick,
    Operation::AbortActive,
    Operation::ContinueActive,
    Operation::StashCreate,
    Operation::StashList,
    Operation::StashApply,
    Operation::StashDrop,
];

/// Provider running entirely in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedProvider;

impl EmbeddedProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn flat_tree_of(odb: &Odb, commit: Option<ObjectId>) -> ProviderResult<FlatTree> {
        commit.map_or_else(|| Ok(FlatTree::new()), |id| odb.commit_flat_tree(id))
    }

    fn head_sync(repo: &RepositoryHandle) -> ProviderResult<HeadState> {
        let odb = Odb::open(repo)?;
        Ok(HeadState {
            branch: odb.head_branch()?,
            commit: odb.head_commit()?.map(Oid::from),
        })
    }

    fn diff_sync(repo: &RepositoryHandle, from: &str, to: Option<&str>) -> ProviderResult<Vec<DiffEntry>> {
        let odb = Odb::open(repo)?;
        let from_tree = odb.commit_flat_tree(odb.resolve(from)?)?;
        match to {
            Some(to) => {
                let to_tree = odb.commit_flat_tree(odb.resolve(to)?)?;
                Ok(worktree::diff_trees(&from_tree, &to_tree))
            }
            None => worktree::diff_worktree(&odb, repo.workdir(), &from_tree),
        }
    }

    fn switch_sync(repo: &RepositoryHandle, name: &str) -> ProviderResult<()> {
        let odb = Odb::open(repo)?;
        let target = odb.branch_commit(name)?.ok_or_else(|| ProviderError::NotFound {
            what: format!("branch '{name}'"),
        })?;
        let current = Self::flat_tree_of(&odb, odb.head_commit()?)?;
        let next = odb.commit_flat_tree(target)?;

        // Refuse to overwrite local changes on paths the switch touches
        let status = worktree::status(&odb, repo.workdir())?;
        let touched: Vec<String> = status
            .dirty_paths()
            .into_iter()
            .filter(|path| current.get(path) != next.get(path))
            .collect();
        if !touched.is_empty() {
            return Err(ProviderError::Backend(format!(
                "local changes would be overwritten by switching to '{name}': {}",
                touched.join(", ")
            )));
        }

        worktree::checkout(&odb, repo.workdir(), &current, &next)?;
        let (mut index, _) = odb.read_index()?;
        for (path, entry) in &next {
            if current.get(path) != Some(entry) {
                index.insert(path.clone(), *entry);
            }
        }
        index.retain(|path, _| next.contains_key(path) || !current.contains_key(path));
        odb.write_index(&index)?;
        odb.attach_head(name, &format!("checkout: moving to {name}"))?;
        info!(branch = name, "switched branch");
        Ok(())
    }

    fn stage_sync(repo: &RepositoryHandle, pathspecs: &[String]) -> ProviderResult<Vec<String>> {
        let odb = Odb::open(repo)?;
        let root = repo.workdir();
        let (mut index, _) = odb.read_index()?;

        let mut candidates: Vec<String> = worktree::scan_outside_gitlinks(root, &index)?;
        candidates.extend(index.keys().cloned());
        candidates.sort_unstable();
        candidates.dedup();

        let (selected, unmatched) =
            match_pathspecs(&candidates, pathspecs).map_err(ProviderError::backend)?;
        if let Some(spec) = unmatched.first() {
            return Err(ProviderError::NotFound {
                what: format!("pathspec '{spec}' did not match any files"),
            });
        }

        for path in &selected {
            if index.get(path).is_some_and(|e| e.kind == gix::objs::tree::EntryKind::Commit) {
                continue;
            }
            match worktree::read_file(root, path)? {
                Some((data, kind)) => {
                    let id = odb.write_blob(&data)?;
                    index.insert(path.clone(), odb::TreeEntry { id, kind });
                }
                None => {
                    index.remove(path);
                }
            }
        }
        odb.write_index(&index)?;
        debug!(paths = selected.len(), "staged paths");
        Ok(selected)
    }

    fn commit_sync(repo: &RepositoryHandle, message: &str) -> ProviderResult<Oid> {
        let odb = Odb::open(repo)?;
        let (index, conflicted) = odb.read_index()?;
        if !conflicted.is_empty() {
            return Err(ProviderError::Backend(format!(
                "cannot commit with unmerged paths: {}",
                conflicted.join(", ")
            )));
        }
        let tree = odb.write_tree(&index)?;
        let head = odb.head_commit()?;
        if let Some(head) = head
            && odb.commit_tree(head)? == tree
        {
            return Err(ProviderError::NothingToCommit);
        }
        let id = odb.commit_on_head(message, tree, head.into_iter().collect())?;
        info!(commit = %id, "created commit");
        Ok(Oid::from(id))
    }

    fn merge_sync(repo: &RepositoryHandle, target: &str, commit: &Oid) -> ProviderResult<StepOutcome> {
        let odb = Odb::open(repo)?;
        let root = repo.workdir();
        let head = odb.require_head()?;
        let theirs = commit.to_object_id()?;
        if head == theirs {
            return Ok(StepOutcome::Clean { commit: None });
        }

        let base = odb
            .merge_base(head, theirs)?
            .ok_or_else(|| ProviderError::backend("refusing to merge unrelated histories"))?;
        if base == theirs {
            debug!(target, "already up to date");
            return Ok(StepOutcome::Clean { commit: None });
        }

        let ours_tree = odb.commit_flat_tree(head)?;
        let theirs_tree = odb.commit_flat_tree(theirs)?;
        if base == head {
            worktree::checkout(&odb, root, &ours_tree, &theirs_tree)?;
            odb.write_index(&theirs_tree)?;
            odb.advance_head(theirs, &format!("merge {target}: Fast-forward"))?;
            info!(target, commit = %theirs, "fast-forwarded");
            return Ok(StepOutcome::Clean {
                commit: Some(commit.clone()),
            });
        }

        let base_tree = odb.commit_flat_tree(base)?;
        let result = merge_trees(&odb, &base_tree, &ours_tree, &theirs_tree, MarkerLabels::default())?;
        result.materialize(&odb, root, &ours_tree)?;
        odb.write_index(&result.merged)?;
        if !result.is_clean() {
            return Ok(StepOutcome::Conflicted(result.conflicts));
        }

        let tree = odb.write_tree(&result.merged)?;
        let id = odb.commit_on_head(&merge_message(target), tree, vec![head, theirs])?;
        info!(target, commit = %id, "merged");
        Ok(StepOutcome::Clean {
            commit: Some(Oid::from(id)),
        })
    }

    fn rebase_begin_sync(repo: &RepositoryHandle, upstream: &Oid) -> ProviderResult<RebasePlan> {
        let odb = Odb::open(repo)?;
        let head = odb.require_head()?;
        let onto = upstream.to_object_id()?;
        let base = odb
            .merge_base(head, onto)?
            .ok_or_else(|| ProviderError::backend("no common ancestor with upstream"))?;

        let (onto, commits) = if base == onto {
            (head, Vec::new())
        } else {
            (onto, odb.first_parent_chain(head, base)?)
        };

        let current = odb.commit_flat_tree(head)?;
        let next = odb.commit_flat_tree(onto)?;
        worktree::checkout(&odb, repo.workdir(), &current, &next)?;
        odb.write_index(&next)?;
        odb.detach_head(onto, &format!("rebase: checkout {onto}"))?;
        debug!(onto = %onto, commits = commits.len(), "planned rebase");

        Ok(RebasePlan {
            onto: Oid::from(onto),
            commits: commits.into_iter().map(Oid::from).collect(),
        })
    }

    /// Applies `commit`'s change on top of HEAD; shared by replay and pick.
    fn apply_commit_sync(repo: &RepositoryHandle, commit: &Oid, action: &str) -> ProviderResult<StepOutcome> {
        let odb = Odb::open(repo)?;
        let root = repo.workdir();
        let id = commit.to_object_id()?;
        let info = odb.commit_info(id)?;
        let head = odb.require_head()?;
        let head_tree_id = odb.commit_tree(head)?;

        let base = Self::flat_tree_of(&odb, info.parents.first().copied())?;
        let ours = odb.flat_tree(head_tree_id)?;
        let theirs = odb.flat_tree(info.tree)?;
        let result = merge_trees(&odb, &base, &ours, &theirs, MarkerLabels::default())?;

        if !result.is_clean() {
            result.materialize(&odb, root, &ours)?;
            odb.write_index(&result.merged)?;
            return Ok(StepOutcome::Conflicted(result.conflicts));
        }

        let tree = odb.write_tree(&result.merged)?;
        if tree == head_tree_id {
            debug!(commit = %commit, "change already present, skipping");
            return Ok(StepOutcome::Clean { commit: None });
        }
        result.materialize(&odb, root, &ours)?;
        odb.write_index(&result.merged)?;
        let new = odb.commit_on_head(&info.message, tree, vec![head])?;
        debug!(action, from = %commit, to = %new, "applied commit");
        Ok(StepOutcome::Clean {
            commit: Some(Oid::from(new)),
        })
    }

    fn rebase_finish_sync(repo: &RepositoryHandle, branch: Option<&str>) -> ProviderResult<()> {
        let odb = Odb::open(repo)?;
        let head = odb.require_head()?;
        if let Some(branch) = branch {
            let message = format!("rebase (finish): refs/heads/{branch} onto {head}");
            odb.set_reference(&format!("refs/heads/{branch}"), head, false, &message)?;
            odb.attach_head(branch, &message)?;
        }
        Ok(())
    }

    fn continue_sync(
        repo: &RepositoryHandle,
        step: &Step,
        records: &[ConflictRecord],
    ) -> ProviderResult<Option<Oid>> {
        if matches!(step, Step::Unpark { .. }) {
            // Resume only touches the working tree
            return Ok(None);
        }

        let odb = Odb::open(repo)?;
        let root = repo.workdir();
        let (mut index, _) = odb.read_index()?;
        for record in records {
            match worktree::read_file(root, &record.path)? {
                Some((data, kind)) => {
                    let id = odb.write_blob(&data)?;
                    index.insert(record.path.clone(), odb::TreeEntry { id, kind });
                }
                None => {
                    index.remove(&record.path);
                }
            }
        }
        odb.write_index(&index)?;
        let tree = odb.write_tree(&index)?;
        let head = odb.require_head()?;

        let id = match step {
            Step::Merge { target, commit } => {
                odb.commit_on_head(&merge_message(target), tree, vec![head, commit.to_object_id()?])?
            }
            Step::Replay { commit } | Step::Pick { commit } => {
                if tree == odb.commit_tree(head)? {
                    return Ok(None);
                }
                let message = odb.commit_info(commit.to_object_id()?)?.message;
                odb.commit_on_head(&message, tree, vec![head])?
            }
            Step::Unpark { .. } => return Ok(None),
        };
        Ok(Some(Oid::from(id)))
    }

    fn abort_sync(repo: &RepositoryHandle, restore: &RestorePoint) -> ProviderResult<()> {
        let odb = Odb::open(repo)?;
        let target = restore.head.to_object_id()?;
        let tree = odb.commit_flat_tree(target)?;
        let (index, conflicted) = odb.read_index()?;

        worktree::reset_to(
            &odb,
            repo.workdir(),
            &tree,
            index.into_keys().chain(conflicted),
        )?;
        odb.write_index(&tree)?;

        match &restore.branch {
            Some(branch) => {
                odb.set_reference(&format!("refs/heads/{branch}"), target, false, "abort")?;
                odb.attach_head(branch, "abort")?;
            }
            None => odb.detach_head(target, "abort")?,
        }
        info!(head = %restore.head, branch = ?restore.branch, "restored repository");
        Ok(())
    }

    fn stash_create_sync(repo: &RepositoryHandle, id: &str, label: &str) -> ProviderResult<Option<ParkPayload>> {
        let odb = Odb::open(repo)?;
        let root = repo.workdir();
        if worktree::status(&odb, root)?.is_clean() {
            return Ok(None);
        }
        let head = odb.require_head()?;
        let (index, _) = odb.read_index()?;

        let mut snapshot = FlatTree::new();
        let mut paths = worktree::scan_outside_gitlinks(root, &index)?;
        paths.extend(index.keys().cloned());
        paths.sort_unstable();
        paths.dedup();
        for path in &paths {
            if let Some(entry) = index.get(path)
                && entry.kind == gix::objs::tree::EntryKind::Commit
            {
                snapshot.insert(path.clone(), *entry);
                continue;
            }
            if let Some((data, kind)) = worktree::read_file(root, path)? {
                let blob = odb.write_blob(&data)?;
                snapshot.insert(path.clone(), odb::TreeEntry { id: blob, kind });
            }
        }

        let tree = odb.write_tree(&snapshot)?;
        let reference = ParkPayload::reference_for(id);
        let commit = odb.commit_on_new_reference(&reference, &format!("park: {label}"), tree, head)?;

        let head_tree = odb.commit_flat_tree(head)?;
        worktree::reset_to(&odb, root, &head_tree, paths)?;
        odb.write_index(&head_tree)?;
        info!(id, label, commit = %commit, "parked working tree");

        Ok(Some(ParkPayload {
            id: id.to_string(),
            reference,
            commit: Oid::from(commit),
        }))
    }

    fn stash_apply_sync(repo: &RepositoryHandle, payload: &ParkPayload) -> ProviderResult<StepOutcome> {
        let odb = Odb::open(repo)?;
        let park = payload.commit.to_object_id()?;
        let info = odb.commit_info(park)?;
        let base = info.parents.first().copied().ok_or_else(|| {
            ProviderError::backend(format!("park snapshot {park} has no base commit"))
        })?;

        let base_tree = odb.commit_flat_tree(base)?;
        let ours = odb.commit_flat_tree(odb.require_head()?)?;
        let theirs = odb.flat_tree(info.tree)?;
        let labels = MarkerLabels {
            ours: "HEAD",
            theirs: "parked",
        };
        let result = merge_trees(&odb, &base_tree, &ours, &theirs, labels)?;
        result.materialize(&odb, repo.workdir(), &ours)?;

        if result.is_clean() {
            Ok(StepOutcome::Clean { commit: None })
        } else {
            Ok(StepOutcome::Conflicted(result.conflicts))
        }
    }
}

#[async_trait]
impl Provider for EmbeddedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Embedded
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::of(EMBEDDED_OPERATIONS)
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn init(&self, path: &Path) -> ProviderResult<RepositoryHandle> {
        let repo = gix::init(path).map_err(|e| GixError::Init(Box::new(e)))?;
        let workdir = repo.workdir().ok_or(GixError::BareRepository)?;
        info!(path = %workdir.display(), "initialized repository");
        Ok(RepositoryHandle::at(workdir, repo.git_dir()))
    }

    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        options: &CloneOptions,
    ) -> ProviderResult<RepositoryHandle> {
        let interrupt = AtomicBool::new(false);
        let mut prepare = gix::prepare_clone(url, dest).map_err(ProviderError::backend)?;
        let (mut checkout, _) = prepare
            .fetch_then_checkout(gix::progress::Discard, &interrupt)
            .map_err(ProviderError::backend)?;
        let (repo, _) = checkout
            .main_worktree(gix::progress::Discard, &interrupt)
            .map_err(ProviderError::backend)?;
        let workdir = repo.workdir().ok_or(GixError::BareRepository)?;
        let handle = RepositoryHandle::at(workdir, repo.git_dir());
        info!(url, path = %handle.workdir().display(), "cloned repository");

        if let Some(branch) = &options.branch {
            let odb = Odb::open(&handle)?;
            if odb.head_branch()?.as_deref() != Some(branch.as_str()) {
                if odb.branch_commit(branch)?.is_none() {
                    let start = odb.resolve(&format!("refs/remotes/origin/{branch}"))?;
                    odb.set_reference(
                        &format!("refs/heads/{branch}"),
                        start,
                        true,
                        &format!("branch: Created from origin/{branch}"),
                    )?;
                }
                Self::switch_sync(&handle, branch)?;
            }
        }
        Ok(handle)
    }

    async fn head(&self, repo: &RepositoryHandle) -> ProviderResult<HeadState> {
        Self::head_sync(repo)
    }

    async fn status(&self, repo: &RepositoryHandle) -> ProviderResult<WorktreeStatus> {
        let odb = Odb::open(repo)?;
        worktree::status(&odb, repo.workdir())
    }

    async fn rev_parse(&self, repo: &RepositoryHandle, spec: &str) -> ProviderResult<Oid> {
        Ok(Oid::from(Odb::open(repo)?.resolve(spec)?))
    }

    async fn read_blob(&self, repo: &RepositoryHandle, id: &Oid) -> ProviderResult<Vec<u8>> {
        Odb::open(repo)?.read_blob(id.to_object_id()?)
    }

    async fn list_branches(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<BranchInfo>> {
        let odb = Odb::open(repo)?;
        let current = odb.head_branch()?;
        Ok(odb
            .local_branches()?
            .into_iter()
            .map(|(name, id)| BranchInfo {
                current: current.as_deref() == Some(name.as_str()),
                name,
                commit: Oid::from(id),
            })
            .collect())
    }

    async fn diff(
        &self,
        repo: &RepositoryHandle,
        from: &str,
        to: Option<&str>,
    ) -> ProviderResult<Vec<DiffEntry>> {
        Self::diff_sync(repo, from, to)
    }

    async fn create_branch(
        &self,
        repo: &RepositoryHandle,
        name: &str,
        start: Option<&str>,
    ) -> ProviderResult<Oid> {
        let odb = Odb::open(repo)?;
        let start_spec = start.unwrap_or("HEAD");
        let id = odb.resolve(start_spec)?;
        odb.set_reference(
            &format!("refs/heads/{name}"),
            id,
            true,
            &format!("branch: Created from {start_spec}"),
        )?;
        info!(branch = name, commit = %id, "created branch");
        Ok(Oid::from(id))
    }

    async fn switch_branch(&self, repo: &RepositoryHandle, name: &str) -> ProviderResult<()> {
        Self::switch_sync(repo, name)
    }

    async fn stage(
        &self,
        repo: &RepositoryHandle,
        pathspecs: &[String],
    ) -> ProviderResult<Vec<String>> {
        Self::stage_sync(repo, pathspecs)
    }

    async fn commit(&self, repo: &RepositoryHandle, message: &str) -> ProviderResult<Oid> {
        Self::commit_sync(repo, message)
    }

    async fn merge(
        &self,
        repo: &RepositoryHandle,
        target: &str,
        commit: &Oid,
    ) -> ProviderResult<StepOutcome> {
        Self::merge_sync(repo, target, commit)
    }

    async fn rebase_begin(
        &self,
        repo: &RepositoryHandle,
        upstream: &Oid,
    ) -> ProviderResult<RebasePlan> {
        Self::rebase_begin_sync(repo, upstream)
    }

    async fn rebase_step(&self, repo: &RepositoryHandle, commit: &Oid)
    -> ProviderResult<StepOutcome> {
        Self::apply_commit_sync(repo, commit, "rebase")
    }

    async fn rebase_finish(
        &self,
        repo: &RepositoryHandle,
        branch: Option<&str>,
    ) -> ProviderResult<()> {
        Self::rebase_finish_sync(repo, branch)
    }

    async fn cherry_pick(&self, repo: &RepositoryHandle, commit: &Oid)
    -> ProviderResult<StepOutcome> {
        Self::apply_commit_sync(repo, commit, "cherry-pick")
    }

    async fn continue_active(
        &self,
        repo: &RepositoryHandle,
        kind: OperationKind,
        step: &Step,
        records: &[ConflictRecord],
    ) -> ProviderResult<Option<Oid>> {
        debug!(%kind, resolved = records.len(), "committing resolved step");
        Self::continue_sync(repo, step, records)
    }

    async fn abort_active(
        &self,
        repo: &RepositoryHandle,
        restore: &RestorePoint,
    ) -> ProviderResult<()> {
        Self::abort_sync(repo, restore)
    }

    async fn stash_create(
        &self,
        repo: &RepositoryHandle,
        id: &str,
        label: &str,
    ) -> ProviderResult<Option<ParkPayload>> {
        Self::stash_create_sync(repo, id, label)
    }

    async fn stash_list(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<ParkPayload>> {
        let odb = Odb::open(repo)?;
        Ok(odb
            .references_with_prefix(PARK_REF_PREFIX)?
            .into_iter()
            .filter_map(|(reference, commit)| {
                let id = reference.strip_prefix(PARK_REF_PREFIX)?.to_string();
                Some(ParkPayload {
                    id,
                    reference,
                    commit: Oid::from(commit),
                })
            })
            .collect())
    }

    async fn stash_apply(
        &self,
        repo: &RepositoryHandle,
        payload: &ParkPayload,
    ) -> ProviderResult<StepOutcome> {
        Self::stash_apply_sync(repo, payload)
    }

    async fn stash_drop(&self, repo: &RepositoryHandle, payload: &ParkPayload)
    -> ProviderResult<()> {
        let removed = Odb::open(repo)?.delete_reference(&payload.reference)?;
        debug!(reference = %payload.reference, removed, "dropped park payload");
        Ok(())
    }
}
