// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Object, reference and index access through gix.
//!
//! Trees are handled flattened: one map from `/`-separated path to
//! `(object id, entry kind)`, never containing `Tree` entries.

use std::collections::BTreeMap;

use gix::ObjectId;
use gix::bstr::ByteSlice;
use gix::objs::tree::EntryKind;
use gix::refs::transaction::{Change, LogChange, PreviousValue, RefEdit, RefLog};
use gix::refs::{FullName, Target};
use tracing::trace;

use crate::error::{GixError, ProviderError, ProviderResult};
use crate::repository::RepositoryHandle;

/// A non-tree entry of a flattened tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct TreeEntry {
    pub id: ObjectId,
    pub kind: EntryKind,
}

/// Path-sorted flattened tree.
pub(super) type FlatTree = BTreeMap<String, TreeEntry>;

/// Decoded commit fields the provider needs.
#[derive(Debug, Clone)]
pub(super) struct CommitInfo {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: String,
}

/// An opened repository.
pub(super) struct Odb {
    repo: gix::Repository,
}

impl Odb {
    pub fn open(handle: &RepositoryHandle) -> ProviderResult<Self> {
        let repo = gix::open(handle.workdir()).map_err(|e| GixError::Open(Box::new(e)))?;
        Ok(Self { repo })
    }

    // --- Objects ---

    pub fn read_blob(&self, id: ObjectId) -> ProviderResult<Vec<u8>> {
        let mut blob = self.repo.find_blob(id).map_err(|e| ProviderError::NotFound {
            what: format!("blob {id}: {e}"),
        })?;
        Ok(blob.take_data())
    }

    /// Blob content of an entry; gitlinks read as empty.
    pub fn read_blob_or_empty(&self, entry: &TreeEntry) -> ProviderResult<Vec<u8>> {
        if entry.kind == EntryKind::Commit {
            Ok(Vec::new())
        } else {
            self.read_blob(entry.id)
        }
    }

    pub fn write_blob(&self, data: &[u8]) -> ProviderResult<ObjectId> {
        Ok(self
            .repo
            .write_blob(data)
            .map_err(ProviderError::backend)?
            .detach())
    }

    pub fn commit_info(&self, id: ObjectId) -> ProviderResult<CommitInfo> {
        let commit = self.repo.find_commit(id).map_err(|e| ProviderError::NotFound {
            what: format!("commit {id}: {e}"),
        })?;
        let tree = commit.tree_id().map_err(ProviderError::backend)?.detach();
        let parents = commit.parent_ids().map(gix::Id::detach).collect();
        let message = commit.message_raw_sloppy().to_str_lossy().into_owned();
        Ok(CommitInfo {
            tree,
            parents,
            message,
        })
    }

    pub fn commit_tree(&self, id: ObjectId) -> ProviderResult<ObjectId> {
        Ok(self.commit_info(id)?.tree)
    }

    /// Flattens the tree of commit `id`.
    pub fn commit_flat_tree(&self, id: ObjectId) -> ProviderResult<FlatTree> {
        let tree = self.commit_tree(id)?;
        self.flat_tree(tree)
    }

    pub fn flat_tree(&self, tree: ObjectId) -> ProviderResult<FlatTree> {
        let mut out = FlatTree::new();
        self.collect_tree(tree, "", &mut out)?;
        Ok(out)
    }

    fn collect_tree(&self, tree: ObjectId, prefix: &str, out: &mut FlatTree) -> ProviderResult<()> {
        let tree = self.repo.find_tree(tree).map_err(|e| ProviderError::NotFound {
            what: format!("tree {tree}: {e}"),
        })?;

        let mut children = Vec::new();
        for entry in tree.iter() {
            let entry = entry.map_err(ProviderError::backend)?;
            let name = entry
                .inner
                .filename
                .to_str()
                .map_err(|_| ProviderError::backend("tree contains a non UTF-8 path"))?;
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}/{name}")
            };
            children.push((path, entry.inner.mode.kind(), entry.inner.oid.to_owned()));
        }

        for (path, kind, id) in children {
            if kind == EntryKind::Tree {
                self.collect_tree(id, &path, out)?;
            } else {
                out.insert(path, TreeEntry { id, kind });
            }
        }
        Ok(())
    }

    /// Writes a flattened tree, returning the root tree id.
    pub fn write_tree(&self, flat: &FlatTree) -> ProviderResult<ObjectId> {
        let empty = self
            .repo
            .write_object(&gix::objs::Tree::empty())
            .map_err(ProviderError::backend)?
            .detach();
        let tree = self.repo.find_tree(empty).map_err(ProviderError::backend)?;
        let mut editor = tree.edit().map_err(ProviderError::backend)?;
        for (path, entry) in flat {
            editor
                .upsert(path.as_str(), entry.kind, entry.id)
                .map_err(ProviderError::backend)?;
        }
        Ok(editor.write().map_err(ProviderError::backend)?.detach())
    }

    // --- Revisions ---

    /// Resolves `spec` to a commit.
    pub fn resolve(&self, spec: &str) -> ProviderResult<ObjectId> {
        let peeled = format!("{spec}^{{commit}}");
        self.repo
            .rev_parse_single(peeled.as_str())
            .map(gix::Id::detach)
            .map_err(|e| ProviderError::NotFound {
                what: format!("revision '{spec}': {e}"),
            })
    }

    pub fn merge_base(&self, a: ObjectId, b: ObjectId) -> ProviderResult<Option<ObjectId>> {
        match self.repo.merge_base(a, b) {
            Ok(id) => Ok(Some(id.detach())),
            Err(gix::repository::merge_base::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(ProviderError::backend(e)),
        }
    }

    /// First-parent chain from `tip` back to (excluding) `stop`, oldest first.
    pub fn first_parent_chain(&self, tip: ObjectId, stop: ObjectId) -> ProviderResult<Vec<ObjectId>> {
        let mut chain = Vec::new();
        let mut current = Some(tip);
        while let Some(id) = current {
            if id == stop {
                break;
            }
            chain.push(id);
            current = self.commit_info(id)?.parents.first().copied();
        }
        chain.reverse();
        Ok(chain)
    }

    // --- HEAD and references ---

    /// Short name of the branch HEAD points to, `None` when detached.
    pub fn head_branch(&self) -> ProviderResult<Option<String>> {
        Ok(self
            .repo
            .head_name()
            .map_err(ProviderError::backend)?
            .map(|name| name.shorten().to_string()))
    }

    /// HEAD commit, `None` on an unborn branch.
    pub fn head_commit(&self) -> ProviderResult<Option<ObjectId>> {
        Ok(self
            .repo
            .head()
            .map_err(ProviderError::backend)?
            .id()
            .map(gix::Id::detach))
    }

    pub fn require_head(&self) -> ProviderResult<ObjectId> {
        self.head_commit()?.ok_or_else(|| ProviderError::NotFound {
            what: "HEAD commit (branch has no commits yet)".to_string(),
        })
    }

    /// Commit a local branch points to.
    pub fn branch_commit(&self, branch: &str) -> ProviderResult<Option<ObjectId>> {
        let name = format!("refs/heads/{branch}");
        match self
            .repo
            .try_find_reference(name.as_str())
            .map_err(ProviderError::backend)?
        {
            Some(mut reference) => Ok(Some(
                reference
                    .peel_to_id_in_place()
                    .map_err(ProviderError::backend)?
                    .detach(),
            )),
            None => Ok(None),
        }
    }

    /// Local branches with their tips.
    pub fn local_branches(&self) -> ProviderResult<Vec<(String, ObjectId)>> {
        let platform = self.repo.references().map_err(ProviderError::backend)?;
        let mut branches = Vec::new();
        for reference in platform.local_branches().map_err(ProviderError::backend)? {
            let mut reference = reference.map_err(ProviderError::backend)?;
            let name = reference.name().shorten().to_string();
            let id = reference
                .peel_to_id_in_place()
                .map_err(ProviderError::backend)?
                .detach();
            branches.push((name, id));
        }
        branches.sort();
        Ok(branches)
    }

    /// References whose full name starts with `prefix`.
    pub fn references_with_prefix(&self, prefix: &str) -> ProviderResult<Vec<(String, ObjectId)>> {
        let platform = self.repo.references().map_err(ProviderError::backend)?;
        let mut found = Vec::new();
        for reference in platform.all().map_err(ProviderError::backend)? {
            let mut reference = reference.map_err(ProviderError::backend)?;
            let name = reference.name().as_bstr().to_string();
            if !name.starts_with(prefix) {
                continue;
            }
            let id = reference
                .peel_to_id_in_place()
                .map_err(ProviderError::backend)?
                .detach();
            found.push((name, id));
        }
        Ok(found)
    }

    /// Points `name` at `id`, creating it when `must_not_exist`.
    pub fn set_reference(
        &self,
        name: &str,
        id: ObjectId,
        must_not_exist: bool,
        message: &str,
    ) -> ProviderResult<()> {
        let constraint = if must_not_exist {
            PreviousValue::MustNotExist
        } else {
            PreviousValue::Any
        };
        self.repo
            .reference(name, id, constraint, message)
            .map_err(ProviderError::backend)?;
        trace!(reference = name, %id, "updated reference");
        Ok(())
    }

    pub fn delete_reference(&self, name: &str) -> ProviderResult<bool> {
        match self
            .repo
            .try_find_reference(name)
            .map_err(ProviderError::backend)?
        {
            Some(reference) => {
                reference.delete().map_err(ProviderError::backend)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn edit_head(&self, new: Target, message: &str) -> ProviderResult<()> {
        let name: FullName = "HEAD".try_into().map_err(ProviderError::backend)?;
        self.repo
            .edit_reference(RefEdit {
                change: Change::Update {
                    log: LogChange {
                        mode: RefLog::AndReference,
                        force_create_reflog: false,
                        message: message.into(),
                    },
                    expected: PreviousValue::Any,
                    new,
                },
                name,
                deref: false,
            })
            .map_err(ProviderError::backend)?;
        Ok(())
    }

    /// Attaches HEAD to `refs/heads/<branch>`.
    pub fn attach_head(&self, branch: &str, message: &str) -> ProviderResult<()> {
        let full = format!("refs/heads/{branch}");
        let target: FullName = full.as_str().try_into().map_err(ProviderError::backend)?;
        self.edit_head(Target::Symbolic(target), message)
    }

    /// Detaches HEAD at `id`.
    pub fn detach_head(&self, id: ObjectId, message: &str) -> ProviderResult<()> {
        self.edit_head(Target::Object(id), message)
    }

    /// Moves whatever HEAD points to (branch or detached HEAD) to `id`.
    pub fn advance_head(&self, id: ObjectId, message: &str) -> ProviderResult<()> {
        match self.head_branch()? {
            Some(branch) => self.set_reference(&format!("refs/heads/{branch}"), id, false, message),
            None => self.detach_head(id, message),
        }
    }

    /// Creates a commit and advances HEAD to it.
    pub fn commit_on_head(
        &self,
        message: &str,
        tree: ObjectId,
        parents: Vec<ObjectId>,
    ) -> ProviderResult<ObjectId> {
        let id = self
            .repo
            .commit("HEAD", message, tree, parents)
            .map_err(ProviderError::backend)?
            .detach();
        trace!(%id, "created commit");
        Ok(id)
    }

    /// Creates a commit on a new reference whose single parent is `parent`.
    pub fn commit_on_new_reference(
        &self,
        reference: &str,
        message: &str,
        tree: ObjectId,
        parent: ObjectId,
    ) -> ProviderResult<ObjectId> {
        // The commit constraint expects the reference at its first parent
        self.set_reference(reference, parent, true, message)?;
        Ok(self
            .repo
            .commit(reference, message, tree, [parent])
            .map_err(ProviderError::backend)?
            .detach())
    }

    // --- Index ---

    /// Stage-0 index entries, plus paths with unmerged stages.
    pub fn read_index(&self) -> ProviderResult<(FlatTree, Vec<String>)> {
        use gix::index::entry::{Flags, Mode};

        let mut flat = FlatTree::new();
        let mut conflicted = Vec::new();
        if !self.repo.index_path().exists() {
            return Ok((flat, conflicted));
        }

        let index = self.repo.open_index().map_err(ProviderError::backend)?;
        for entry in index.entries() {
            let path = entry
                .path(&index)
                .to_str()
                .map_err(|_| ProviderError::backend("index contains a non UTF-8 path"))?
                .to_string();
            if entry.flags.intersects(Flags::STAGE_MASK) {
                conflicted.push(path);
                continue;
            }
            let kind = match entry.mode {
                Mode::FILE => EntryKind::Blob,
                Mode::FILE_EXECUTABLE => EntryKind::BlobExecutable,
                Mode::SYMLINK => EntryKind::Link,
                Mode::COMMIT => EntryKind::Commit,
                _ => continue,
            };
            flat.insert(path, TreeEntry { id: entry.id, kind });
        }
        conflicted.dedup();
        Ok((flat, conflicted))
    }

    /// Replaces the index with `flat`.
    pub fn write_index(&self, flat: &FlatTree) -> ProviderResult<()> {
        use gix::index::entry::{Flags, Mode, Stat};

        let mut state = gix::index::State::new(self.repo.object_hash());
        for (path, entry) in flat {
            let mode = match entry.kind {
                EntryKind::Blob => Mode::FILE,
                EntryKind::BlobExecutable => Mode::FILE_EXECUTABLE,
                EntryKind::Link => Mode::SYMLINK,
                EntryKind::Commit => Mode::COMMIT,
                EntryKind::Tree => continue,
            };
            state.dangerously_push_entry(
                Stat::default(),
                entry.id,
                Flags::empty(),
                mode,
                path.as_str().into(),
            );
        }
        state.sort_entries();

        let mut file = gix::index::File::from_state(state, self.repo.index_path());
        file.write(Default::default())
            .map_err(ProviderError::backend)?;
        Ok(())
    }
}
