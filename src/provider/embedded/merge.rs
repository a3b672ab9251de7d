// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tree-level three-way merge over flattened trees.
//!
//! ```text
//! per path (b = base, o = ours, t = theirs):
//!   o == t          -> o
//!   b == o          -> t          (only theirs changed, may delete)
//!   b == t          -> o          (only ours changed, may delete)
//!   o, t both blobs -> merge3, conflict on overlap or binary content
//!   one side gone   -> modify/delete conflict, modified side kept
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use gix::objs::tree::EntryKind;
use tracing::debug;

use super::odb::{FlatTree, Odb, TreeEntry};
use super::worktree::{FileState, checkout, write_file};
use crate::error::ProviderResult;
use crate::provider::merge3::{MarkerLabels, is_binary, merge3};
use crate::provider::{ConflictKind, ConflictRecord, Oid};

/// Result of merging three trees.
#[derive(Debug, Default)]
pub(super) struct TreeMerge {
    /// Clean result. Conflicted paths hold the ours side, or are absent when
    /// ours deleted them; this is what the index receives.
    pub merged: FlatTree,
    /// Working-tree content of conflicted paths.
    pub worktree: BTreeMap<String, FileState>,
    pub conflicts: Vec<ConflictRecord>,
}

impl TreeMerge {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Writes the result over a working tree that currently matches `ours`.
    pub fn materialize(&self, odb: &Odb, root: &Path, ours: &FlatTree) -> ProviderResult<()> {
        checkout(odb, root, ours, &self.merged)?;
        for (path, (data, kind)) in &self.worktree {
            write_file(root, path, data, *kind)?;
        }
        Ok(())
    }
}

fn oid(entry: Option<&TreeEntry>) -> Option<Oid> {
    entry.map(|e| Oid::from(e.id))
}

const fn is_blob(kind: EntryKind) -> bool {
    matches!(kind, EntryKind::Blob | EntryKind::BlobExecutable)
}

/// Merges `ours` and `theirs` against their common `base`.
pub(super) fn merge_trees(
    odb: &Odb,
    base: &FlatTree,
    ours: &FlatTree,
    theirs: &FlatTree,
    labels: MarkerLabels<'_>,
) -> ProviderResult<TreeMerge> {
    let mut result = TreeMerge::default();
    let paths: BTreeSet<&String> = base.keys().chain(ours.keys()).chain(theirs.keys()).collect();

    for path in paths {
        let (b, o, t) = (base.get(path), ours.get(path), theirs.get(path));
        if o == t || b == t {
            if let Some(o) = o {
                result.merged.insert(path.clone(), *o);
            }
            continue;
        }
        if b == o {
            if let Some(t) = t {
                result.merged.insert(path.clone(), *t);
            }
            continue;
        }

        match (o, t) {
            (Some(o), Some(t)) => merge_both_changed(odb, path, b, o, t, labels, &mut result)?,
            (Some(o), None) => {
                result.merged.insert(path.clone(), *o);
                result.conflicts.push(ConflictRecord::new(
                    path.clone(),
                    ConflictKind::ModifyDelete,
                    oid(b),
                    oid(Some(o)),
                    None,
                ));
            }
            (None, Some(t)) => {
                let data = odb.read_blob_or_empty(t)?;
                result.worktree.insert(path.clone(), (data, t.kind));
                result.conflicts.push(ConflictRecord::new(
                    path.clone(),
                    ConflictKind::ModifyDelete,
                    oid(b),
                    None,
                    oid(Some(t)),
                ));
            }
            (None, None) => {}
        }
    }

    debug!(
        merged = result.merged.len(),
        conflicts = result.conflicts.len(),
        "merged trees"
    );
    Ok(result)
}

fn merge_both_changed(
    odb: &Odb,
    path: &str,
    b: Option<&TreeEntry>,
    o: &TreeEntry,
    t: &TreeEntry,
    labels: MarkerLabels<'_>,
    result: &mut TreeMerge,
) -> ProviderResult<()> {
    let record = |kind| ConflictRecord::new(path.to_string(), kind, oid(b), oid(Some(o)), oid(Some(t)));

    if !is_blob(o.kind) || !is_blob(t.kind) {
        result.merged.insert(path.to_string(), *o);
        result.conflicts.push(record(ConflictKind::Binary));
        return Ok(());
    }

    let base_data = match b {
        Some(b) if is_blob(b.kind) => odb.read_blob(b.id)?,
        _ => Vec::new(),
    };
    let ours_data = odb.read_blob(o.id)?;
    let theirs_data = odb.read_blob(t.id)?;

    if is_binary(&base_data) || is_binary(&ours_data) || is_binary(&theirs_data) {
        result.merged.insert(path.to_string(), *o);
        result.conflicts.push(record(ConflictKind::Binary));
        return Ok(());
    }

    // Take theirs' mode only when ours kept the base mode
    let kind = match b {
        Some(b) if b.kind == o.kind => t.kind,
        _ => o.kind,
    };

    let output = merge3(&base_data, &ours_data, &theirs_data, labels);
    if output.is_clean() {
        let id = odb.write_blob(&output.content)?;
        result.merged.insert(path.to_string(), TreeEntry { id, kind });
    } else {
        let conflict = if b.is_some() {
            ConflictKind::Content
        } else {
            ConflictKind::AddAdd
        };
        result.merged.insert(path.to_string(), *o);
        result
            .conflicts
            .push(record(conflict).with_hunks_from(&output.content));
        result
            .worktree
            .insert(path.to_string(), (output.content, kind));
    }
    Ok(())
}
