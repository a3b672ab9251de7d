// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Working-tree materialization and comparison.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use gix::objs::tree::EntryKind;
use tracing::trace;

use super::odb::{FlatTree, Odb, TreeEntry};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{ChangeKind, StatusEntry, WorktreeStatus};
use crate::utility::fs::walk::{WalkOptions, join_relative, scan_worktree};

/// Content and kind of a working-tree file.
pub(super) type FileState = (Vec<u8>, EntryKind);

/// Lists non-ignored files of the working tree.
pub(super) fn scan(root: &Path) -> ProviderResult<Vec<String>> {
    scan_worktree(root, &WalkOptions::default())
        .map(crate::utility::fs::walk::WalkResult::into_files)
        .map_err(ProviderError::backend)
}

/// Lists non-ignored files outside any gitlink directory of `tree`.
pub(super) fn scan_outside_gitlinks(root: &Path, tree: &FlatTree) -> ProviderResult<Vec<String>> {
    let gitlinks: Vec<&str> = tree
        .iter()
        .filter(|(_, e)| e.kind == EntryKind::Commit)
        .map(|(p, _)| p.as_str())
        .collect();
    let mut files = scan(root)?;
    if !gitlinks.is_empty() {
        files.retain(|path| {
            !gitlinks.iter().any(|link| {
                path.strip_prefix(link)
                    .is_some_and(|rest| rest.starts_with('/'))
            })
        });
    }
    Ok(files)
}

/// Reads a working-tree path. Directories and missing paths yield `None`.
pub(super) fn read_file(root: &Path, path: &str) -> ProviderResult<Option<FileState>> {
    let full = join_relative(root, path);
    let Ok(meta) = fs::symlink_metadata(&full) else {
        return Ok(None);
    };

    if meta.file_type().is_symlink() {
        let target = fs::read_link(&full)?;
        return Ok(Some((link_bytes(&target), EntryKind::Link)));
    }
    if !meta.is_file() {
        return Ok(None);
    }

    let data = fs::read(&full)?;
    let kind = if is_executable(&meta) {
        EntryKind::BlobExecutable
    } else {
        EntryKind::Blob
    };
    Ok(Some((data, kind)))
}

#[cfg(unix)]
fn link_bytes(target: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    target.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn link_bytes(target: &Path) -> Vec<u8> {
    target.to_string_lossy().replace('\\', "/").into_bytes()
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
const fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

/// Whether two entry kinds denote the same file type on this platform.
fn same_kind(a: EntryKind, b: EntryKind) -> bool {
    if cfg!(unix) {
        a == b
    } else {
        let plain = |k| matches!(k, EntryKind::Blob | EntryKind::BlobExecutable);
        a == b || (plain(a) && plain(b))
    }
}

/// Compares a working-tree path against a tree entry.
///
/// Gitlinks only need their directory to exist.
pub(super) fn matches_entry(
    odb: &Odb,
    root: &Path,
    path: &str,
    entry: &TreeEntry,
) -> ProviderResult<Option<ChangeKind>> {
    if entry.kind == EntryKind::Commit {
        return Ok((!join_relative(root, path).is_dir()).then_some(ChangeKind::Deleted));
    }
    let Some((data, kind)) = read_file(root, path)? else {
        return Ok(Some(ChangeKind::Deleted));
    };

    let link = |k| k == EntryKind::Link;
    if link(kind) != link(entry.kind) {
        return Ok(Some(ChangeKind::TypeChanged));
    }
    if !same_kind(kind, entry.kind) {
        return Ok(Some(ChangeKind::Modified));
    }
    if odb.read_blob(entry.id)? == data {
        Ok(None)
    } else {
        Ok(Some(ChangeKind::Modified))
    }
}

/// Writes `data` at `path`, replacing whatever is there.
pub(super) fn write_file(root: &Path, path: &str, data: &[u8], kind: EntryKind) -> ProviderResult<()> {
    let full = join_relative(root, path);
    if let Ok(meta) = fs::symlink_metadata(&full) {
        if meta.is_dir() {
            if kind == EntryKind::Commit {
                return Ok(());
            }
            fs::remove_dir_all(&full)?;
        } else {
            fs::remove_file(&full)?;
        }
    }
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)?;
    }

    match kind {
        EntryKind::Commit | EntryKind::Tree => fs::create_dir_all(&full)?,
        EntryKind::Link => write_link(&full, data)?,
        EntryKind::Blob => fs::write(&full, data)?,
        EntryKind::BlobExecutable => {
            fs::write(&full, data)?;
            make_executable(&full)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_link(full: &Path, target: &[u8]) -> std::io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    std::os::unix::fs::symlink(std::ffi::OsStr::from_bytes(target), full)
}

#[cfg(not(unix))]
fn write_link(full: &Path, target: &[u8]) -> std::io::Result<()> {
    fs::write(full, target)
}

#[cfg(unix)]
fn make_executable(full: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(full)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(full, perms)
}

#[cfg(not(unix))]
const fn make_executable(_full: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Writes a tree entry's blob to the working tree.
pub(super) fn write_entry(odb: &Odb, root: &Path, path: &str, entry: &TreeEntry) -> ProviderResult<()> {
    let data = if entry.kind == EntryKind::Commit {
        Vec::new()
    } else {
        odb.read_blob(entry.id)?
    };
    write_file(root, path, &data, entry.kind)
}

/// Removes `path` and prunes directories it leaves empty.
pub(super) fn remove_file(root: &Path, path: &str) -> ProviderResult<()> {
    let full = join_relative(root, path);
    match fs::symlink_metadata(&full) {
        Ok(meta) if meta.is_dir() => {
            // Only empty gitlink directories are removed
            let _ = fs::remove_dir(&full);
        }
        Ok(_) => fs::remove_file(&full)?,
        Err(_) => return Ok(()),
    }

    let mut dir = full.parent();
    while let Some(current) = dir {
        if current == root || fs::remove_dir(current).is_err() {
            break;
        }
        dir = current.parent();
    }
    Ok(())
}

/// Moves the working tree from `from` to `to`, touching only changed paths.
pub(super) fn checkout(odb: &Odb, root: &Path, from: &FlatTree, to: &FlatTree) -> ProviderResult<()> {
    for path in from.keys().filter(|p| !to.contains_key(*p)) {
        remove_file(root, path)?;
    }
    let mut written = 0usize;
    for (path, entry) in to {
        if from.get(path) != Some(entry) {
            write_entry(odb, root, path, entry)?;
            written += 1;
        }
    }
    trace!(written, "checked out tree");
    Ok(())
}

/// Forces the working tree to match `target` exactly.
///
/// Every non-ignored path not in `target` is removed, including untracked
/// files; `extra` lists paths (typically index entries) to consider even if
/// the scanner would not report them.
pub(super) fn reset_to(
    odb: &Odb,
    root: &Path,
    target: &FlatTree,
    extra: impl IntoIterator<Item = String>,
) -> ProviderResult<()> {
    let mut present: BTreeSet<String> = scan_outside_gitlinks(root, target)?.into_iter().collect();
    present.extend(extra);
    for path in present.iter().filter(|p| !target.contains_key(*p)) {
        remove_file(root, path)?;
    }
    for (path, entry) in target {
        if matches_entry(odb, root, path, entry)?.is_some() {
            write_entry(odb, root, path, entry)?;
        }
    }
    Ok(())
}

/// Computes staged, unstaged, untracked and conflicted paths.
pub(super) fn status(odb: &Odb, root: &Path) -> ProviderResult<WorktreeStatus> {
    let head = match odb.head_commit()? {
        Some(id) => odb.commit_flat_tree(id)?,
        None => FlatTree::new(),
    };
    let (index, conflicted) = odb.read_index()?;
    let mut status = WorktreeStatus {
        staged: diff_trees(&head, &index),
        conflicted,
        ..WorktreeStatus::default()
    };

    for (path, entry) in &index {
        if let Some(kind) = matches_entry(odb, root, path, entry)? {
            status.unstaged.push(StatusEntry {
                path: path.clone(),
                kind,
            });
        }
    }

    status.untracked = scan_outside_gitlinks(root, &index)?
        .into_iter()
        .filter(|path| !index.contains_key(path) && !status.conflicted.contains(path))
        .collect();
    status.normalize();
    Ok(status)
}

/// Name-status difference between two flattened trees.
pub(super) fn diff_trees(from: &FlatTree, to: &FlatTree) -> Vec<StatusEntry> {
    let paths: BTreeSet<&String> = from.keys().chain(to.keys()).collect();
    paths
        .into_iter()
        .filter_map(|path| {
            let kind = match (from.get(path), to.get(path)) {
                (None, Some(_)) => ChangeKind::Added,
                (Some(_), None) => ChangeKind::Deleted,
                (Some(a), Some(b)) if a == b => return None,
                (Some(a), Some(b)) if (a.kind == EntryKind::Link) != (b.kind == EntryKind::Link) => {
                    ChangeKind::TypeChanged
                }
                (Some(_), Some(_)) => ChangeKind::Modified,
                (None, None) => return None,
            };
            Some(StatusEntry {
                path: path.clone(),
                kind,
            })
        })
        .collect()
}

/// Name-status difference between a tree and the working tree.
pub(super) fn diff_worktree(odb: &Odb, root: &Path, from: &FlatTree) -> ProviderResult<Vec<StatusEntry>> {
    let mut entries = Vec::new();
    for (path, entry) in from {
        if let Some(kind) = matches_entry(odb, root, path, entry)? {
            entries.push(StatusEntry {
                path: path.clone(),
                kind,
            });
        }
    }
    for path in scan_outside_gitlinks(root, from)? {
        if !from.contains_key(&path) {
            entries.push(StatusEntry {
                path,
                kind: ChangeKind::Added,
            });
        }
    }
    entries.sort();
    Ok(entries)
}
