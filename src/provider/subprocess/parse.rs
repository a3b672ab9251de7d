// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Parsers for machine-readable git output.
//!
//! Callers run git with `-z` wherever it exists, so paths are taken
//! verbatim between NUL separators.

use std::collections::BTreeMap;
use std::path::PathBuf;

use regex::Regex;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    BisectOutcome, BranchInfo, ChangeKind, ConflictKind, ConflictRecord, Oid, StatusEntry,
    SubmoduleInfo, WorktreeInfo, WorktreeStatus,
};

fn fields(output: &[u8]) -> impl Iterator<Item = String> + '_ {
    output
        .split(|&b| b == 0)
        .filter(|f| !f.is_empty())
        .map(|f| String::from_utf8_lossy(f).into_owned())
}

/// Parses `git status --porcelain=v1 -z --no-renames --untracked-files=all`.
pub(super) fn parse_status(output: &[u8]) -> WorktreeStatus {
    let mut status = WorktreeStatus::default();
    for entry in fields(output) {
        let mut chars = entry.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        let Some(path) = entry.get(3..).map(str::to_string) else {
            continue;
        };

        match (x, y) {
            ('?', '?') => status.untracked.push(path),
            ('!', '!') => {}
            ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => status.conflicted.push(path),
            _ => {
                if let Some(kind) = ChangeKind::from_letter(x) {
                    status.staged.push(StatusEntry {
                        path: path.clone(),
                        kind,
                    });
                }
                if let Some(kind) = ChangeKind::from_letter(y) {
                    status.unstaged.push(StatusEntry { path, kind });
                }
            }
        }
    }
    status.normalize();
    status
}

/// Parses `git diff --name-status --no-renames -z`.
pub(super) fn parse_name_status(output: &[u8]) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut iter = fields(output);
    while let (Some(letter), Some(path)) = (iter.next(), iter.next()) {
        if let Some(kind) = letter.chars().next().and_then(ChangeKind::from_letter) {
            entries.push(StatusEntry { path, kind });
        }
    }
    entries.sort();
    entries
}

/// Object ids of the three stages of an unmerged path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(super) struct UnmergedPath {
    pub base: Option<Oid>,
    pub ours: Option<Oid>,
    pub theirs: Option<Oid>,
}

/// Parses `git ls-files -u -z`: `<mode> <oid> <stage>\t<path>`.
pub(super) fn parse_unmerged(output: &[u8]) -> BTreeMap<String, UnmergedPath> {
    let mut paths: BTreeMap<String, UnmergedPath> = BTreeMap::new();
    for entry in fields(output) {
        let Some((meta, path)) = entry.split_once('\t') else {
            continue;
        };
        let mut parts = meta.split_whitespace();
        let (Some(_mode), Some(oid), Some(stage)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let Ok(oid) = Oid::parse(oid) else {
            continue;
        };
        let slot = paths.entry(path.to_string()).or_default();
        match stage {
            "1" => slot.base = Some(oid),
            "2" => slot.ours = Some(oid),
            "3" => slot.theirs = Some(oid),
            _ => {}
        }
    }
    paths
}

/// Builds a conflict record from the stages and the working-tree content.
pub(super) fn conflict_record(path: String, stages: UnmergedPath, content: Option<&[u8]>) -> ConflictRecord {
    let has_markers = content.is_some_and(crate::provider::markers::contains_markers);
    let kind = match (&stages.base, &stages.ours, &stages.theirs) {
        (_, None, _) | (_, _, None) => ConflictKind::ModifyDelete,
        (None, Some(_), Some(_)) if has_markers => ConflictKind::AddAdd,
        (Some(_), Some(_), Some(_)) if has_markers => ConflictKind::Content,
        _ => ConflictKind::Binary,
    };
    let record = ConflictRecord::new(path, kind, stages.base, stages.ours, stages.theirs);
    match content {
        Some(content) => record.with_hunks_from(content),
        None => record,
    }
}

/// Format string used with `git for-each-ref` for branches.
pub(super) const BRANCH_FORMAT: &str = "%(HEAD)%00%(refname:short)%00%(objectname)";

/// Parses `for-each-ref` lines produced with [`BRANCH_FORMAT`].
pub(super) fn parse_branches(output: &str) -> Vec<BranchInfo> {
    let mut branches: Vec<BranchInfo> = output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\0');
            let head = parts.next()?;
            let name = parts.next()?.to_string();
            let commit = Oid::parse(parts.next()?).ok()?;
            Some(BranchInfo {
                name,
                commit,
                current: head == "*",
            })
        })
        .collect();
    branches.sort_by(|a, b| a.name.cmp(&b.name));
    branches
}

/// Format string used with `git for-each-ref` for plain references.
pub(super) const REF_FORMAT: &str = "%(refname)%00%(objectname)";

/// Parses `for-each-ref` lines produced with [`REF_FORMAT`].
pub(super) fn parse_refs(output: &str) -> Vec<(String, Oid)> {
    output
        .lines()
        .filter_map(|line| {
            let (name, oid) = line.split_once('\0')?;
            Some((name.to_string(), Oid::parse(oid).ok()?))
        })
        .collect()
}

/// Parses the progress text printed by `git bisect start|good|bad|skip`.
pub(super) fn parse_bisect(output: &str) -> ProviderResult<BisectOutcome> {
    let remaining = Regex::new(r"(?m)^Bisecting: (\d+) revisions? left to test")
        .map_err(ProviderError::backend)?;
    let current = Regex::new(r"(?m)^\[([0-9a-f]{40}|[0-9a-f]{64})\]").map_err(ProviderError::backend)?;
    let culprit = Regex::new(r"(?m)^([0-9a-f]{40}|[0-9a-f]{64}) is the first bad commit")
        .map_err(ProviderError::backend)?;

    let capture = |re: &Regex| {
        re.captures(output)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    Ok(BisectOutcome {
        current: capture(&current).and_then(|s| Oid::parse(&s).ok()),
        culprit: capture(&culprit).and_then(|s| Oid::parse(&s).ok()),
        remaining: capture(&remaining).and_then(|s| s.parse().ok()),
    })
}

/// Parses `git worktree list --porcelain`.
pub(super) fn parse_worktrees(output: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = Vec::new();
    let mut current: Option<WorktreeInfo> = None;
    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            worktrees.extend(current.take());
            current = Some(WorktreeInfo {
                path: PathBuf::from(path),
                head: None,
                branch: None,
            });
        } else if let Some(info) = current.as_mut() {
            if let Some(head) = line.strip_prefix("HEAD ") {
                info.head = Oid::parse(head).ok();
            } else if let Some(branch) = line.strip_prefix("branch ") {
                info.branch = Some(branch.trim_start_matches("refs/heads/").to_string());
            }
        }
    }
    worktrees.extend(current);
    worktrees
}

/// Parses `git submodule status`.
///
/// A leading `-` marks an uninitialized submodule.
pub(super) fn parse_submodules(output: &str) -> Vec<SubmoduleInfo> {
    output
        .lines()
        .filter_map(|line| {
            let flag = line.chars().next()?;
            let rest = line.get(1..)?;
            let mut parts = rest.split_whitespace();
            let commit = Oid::parse(parts.next()?).ok();
            let path = parts.next()?.to_string();
            Some(SubmoduleInfo {
                path,
                commit,
                initialized: flag != '-',
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "1111111111111111111111111111111111111111";
    const B: &str = "2222222222222222222222222222222222222222";
    const C: &str = "3333333333333333333333333333333333333333";

    #[test]
    fn test_parse_status() {
        let raw = b"M  staged.txt\0 M edited.txt\0MM both.txt\0?? new.txt\0UU conflict.txt\0 D gone.txt\0";
        let status = parse_status(raw);
        let staged: Vec<&str> = status.staged.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(staged, vec!["both.txt", "staged.txt"]);
        let unstaged: Vec<(&str, ChangeKind)> = status
            .unstaged
            .iter()
            .map(|e| (e.path.as_str(), e.kind))
            .collect();
        assert_eq!(
            unstaged,
            vec![
                ("both.txt", ChangeKind::Modified),
                ("edited.txt", ChangeKind::Modified),
                ("gone.txt", ChangeKind::Deleted),
            ]
        );
        assert_eq!(status.untracked, vec!["new.txt".to_string()]);
        assert_eq!(status.conflicted, vec!["conflict.txt".to_string()]);
    }

    #[test]
    fn test_parse_status_keeps_spaces_in_paths() {
        let status = parse_status(b"?? dir/with space.txt\0");
        assert_eq!(status.untracked, vec!["dir/with space.txt".to_string()]);
    }

    #[test]
    fn test_parse_name_status() {
        let entries = parse_name_status(b"M\0b.txt\0A\0a.txt\0D\0c.txt\0");
        let got: Vec<(&str, char)> = entries
            .iter()
            .map(|e| (e.path.as_str(), e.kind.letter()))
            .collect();
        assert_eq!(got, vec![("a.txt", 'A'), ("b.txt", 'M'), ("c.txt", 'D')]);
    }

    #[test]
    fn test_parse_unmerged_and_records() {
        let raw = format!(
            "100644 {A} 1\tfile.txt\0100644 {B} 2\tfile.txt\0100644 {C} 3\tfile.txt\0100644 {A} 1\tgone.txt\0100644 {B} 2\tgone.txt\0"
        );
        let paths = parse_unmerged(raw.as_bytes());
        assert_eq!(paths.len(), 2);

        let content = b"<<<<<<< HEAD\nx\n=======\ny\n>>>>>>> topic\n";
        let record = conflict_record(
            "file.txt".to_string(),
            paths["file.txt"].clone(),
            Some(content),
        );
        assert_eq!(record.kind, ConflictKind::Content);
        assert_eq!(record.hunks.len(), 1);
        assert_eq!(record.theirs.as_ref().map(Oid::as_str), Some(C));

        let record = conflict_record("gone.txt".to_string(), paths["gone.txt"].clone(), None);
        assert_eq!(record.kind, ConflictKind::ModifyDelete);
        assert!(record.theirs.is_none());
    }

    #[test]
    fn test_conflict_without_markers_is_binary() {
        let stages = UnmergedPath {
            base: Oid::parse(A).ok(),
            ours: Oid::parse(B).ok(),
            theirs: Oid::parse(C).ok(),
        };
        let record = conflict_record("image.png".to_string(), stages, Some(b"\0\x01"));
        assert_eq!(record.kind, ConflictKind::Binary);
    }

    #[test]
    fn test_parse_branches() {
        let raw = format!(" \0topic\0{A}\n*\0main\0{B}\n");
        let branches = parse_branches(&raw);
        let got: Vec<(&str, bool)> = branches
            .iter()
            .map(|b| (b.name.as_str(), b.current))
            .collect();
        assert_eq!(got, vec![("main", true), ("topic", false)]);
    }

    #[test]
    fn test_parse_refs() {
        let raw = format!("refs/gitduo/park/p1\0{A}\n");
        let refs = parse_refs(&raw);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].0, "refs/gitduo/park/p1");
    }

    #[test]
    fn test_parse_bisect_progress_and_result() {
        let progress = format!(
            "Bisecting: 3 revisions left to test after this (roughly 2 steps)\n[{A}] middle commit\n"
        );
        let outcome = parse_bisect(&progress).unwrap();
        assert_eq!(outcome.remaining, Some(3));
        assert_eq!(outcome.current.as_ref().map(Oid::as_str), Some(A));
        assert!(outcome.culprit.is_none());

        let done = format!("{B} is the first bad commit\ncommit {B}\n");
        let outcome = parse_bisect(&done).unwrap();
        assert_eq!(outcome.culprit.as_ref().map(Oid::as_str), Some(B));
    }

    #[test]
    fn test_parse_worktrees() {
        let raw = format!(
            "worktree /repo\nHEAD {A}\nbranch refs/heads/main\n\nworktree /repo-wt\nHEAD {B}\ndetached\n"
        );
        let worktrees = parse_worktrees(&raw);
        assert_eq!(worktrees.len(), 2);
        assert_eq!(worktrees[0].branch.as_deref(), Some("main"));
        assert_eq!(worktrees[1].path, PathBuf::from("/repo-wt"));
        assert!(worktrees[1].branch.is_none());
    }

    #[test]
    fn test_parse_submodules() {
        let raw = format!(" {A} libs/a (heads/main)\n-{B} libs/b\n");
        let subs = parse_submodules(&raw);
        assert_eq!(subs.len(), 2);
        assert!(subs[0].initialized);
        assert_eq!(subs[1].path, "libs/b");
        assert!(!subs[1].initialized);
    }
}
