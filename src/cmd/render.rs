// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Plain-text rendering of engine values for the terminal.

use crate::collab::PullRequest;
use crate::engine::state::{OperationDescriptor, ParkEntry, Status};
use crate::provider::{
    BisectOutcome, BranchInfo, ConflictRecord, HeadState, OperationKind, StatusEntry,
    WorktreeStatus,
};

/// First status line.
#[must_use]
pub fn head_line(head: &HeadState) -> String {
    match (&head.branch, &head.commit) {
        (Some(branch), Some(_)) => format!("On branch {branch}"),
        (Some(branch), None) => format!("No commits yet on {branch}"),
        (None, Some(commit)) => format!("HEAD detached at {}", commit.short()),
        (None, None) => "HEAD is unborn".to_string(),
    }
}

/// Two-column status lines: index column, worktree column, path.
#[must_use]
pub fn status_lines(status: &WorktreeStatus) -> Vec<String> {
    let staged = status
        .staged
        .iter()
        .map(|e| format!("{}  {}", e.kind.letter(), e.path));
    let unstaged = status
        .unstaged
        .iter()
        .map(|e| format!(" {} {}", e.kind.letter(), e.path));
    let conflicted = status.conflicted.iter().map(|p| format!("UU {p}"));
    let untracked = status.untracked.iter().map(|p| format!("?? {p}"));
    staged
        .chain(unstaged)
        .chain(conflicted)
        .chain(untracked)
        .collect()
}

#[must_use]
pub fn diff_line(entry: &StatusEntry) -> String {
    format!("{}\t{}", entry.kind.letter(), entry.path)
}

#[must_use]
pub fn branch_line(branch: &BranchInfo) -> String {
    let marker = if branch.current { '*' } else { ' ' };
    format!("{marker} {} {}", branch.name, branch.commit.short())
}

#[must_use]
pub fn conflict_line(record: &ConflictRecord) -> String {
    format!(
        "{:<10} {:<13} {}",
        record.resolution.to_string(),
        record.kind.to_string(),
        record.path
    )
}

/// Summary of a descriptor after a command touched it.
#[must_use]
pub fn operation_lines(desc: &OperationDescriptor) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({}, {})",
        desc.kind,
        desc.status,
        desc.provider,
        desc.targets.join(" ")
    )];

    if !desc.applied.is_empty() || !desc.pending.is_empty() {
        lines.push(format!(
            "  applied {}, pending {}",
            desc.applied.len(),
            desc.pending.len()
        ));
    }
    if let Some(outcome) = &desc.bisect {
        lines.extend(bisect_lines(outcome).into_iter().map(|l| format!("  {l}")));
    }
    lines.extend(desc.conflicts.iter().map(|c| format!("  {}", conflict_line(c))));

    if desc.status == Status::Conflicted {
        let hint = if desc.conflicts.iter().all(|c| c.resolution.is_resolved()) {
            "  all conflicts fixed; run `duo continue`"
        } else {
            "  fix conflicts with `duo fix`, then run `duo continue` (or `duo abort`)"
        };
        lines.push(hint.to_string());
    } else if desc.status == Status::Running && desc.kind != OperationKind::Bisect {
        lines.push("  interrupted; run `duo continue` or `duo abort`".to_string());
    }
    lines
}

#[must_use]
pub fn bisect_lines(outcome: &BisectOutcome) -> Vec<String> {
    if let Some(culprit) = &outcome.culprit {
        return vec![format!("first bad commit: {culprit}")];
    }
    let mut lines = Vec::new();
    if let Some(current) = &outcome.current {
        lines.push(format!("testing {}", current.short()));
    }
    if let Some(remaining) = outcome.remaining {
        lines.push(format!("about {remaining} revision(s) left"));
    }
    lines
}

#[must_use]
pub fn park_line(index: usize, entry: &ParkEntry) -> String {
    format!(
        "{index}: {} on {} ({}, {})",
        entry.label,
        entry.branch.as_deref().unwrap_or("detached HEAD"),
        entry.provider,
        entry.created_at.format("%Y-%m-%d %H:%M")
    )
}

#[must_use]
pub fn pr_line(pr: &PullRequest) -> String {
    let draft = if pr.draft { " (draft)" } else { "" };
    format!(
        "#{} {}{draft} [{} -> {}]",
        pr.number, pr.title, pr.head.ref_name, pr.base.ref_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::PrBranch;
    use crate::provider::{ChangeKind, ConflictKind, Oid, ParkPayload, ProviderKind, Resolution};
    use chrono::{TimeZone, Utc};

    fn oid(c: char) -> Oid {
        Oid::parse(&c.to_string().repeat(40)).unwrap()
    }

    #[test]
    fn test_head_line() {
        let head = |branch: Option<&str>, commit| HeadState {
            branch: branch.map(str::to_string),
            commit,
        };
        assert_eq!(head_line(&head(Some("main"), Some(oid('a')))), "On branch main");
        assert_eq!(head_line(&head(Some("main"), None)), "No commits yet on main");
        assert_eq!(head_line(&head(None, Some(oid('b')))), "HEAD detached at bbbbbbb");
    }

    #[test]
    fn test_status_lines() {
        let status = WorktreeStatus {
            staged: vec![StatusEntry {
                path: "a.rs".to_string(),
                kind: ChangeKind::Added,
            }],
            unstaged: vec![StatusEntry {
                path: "b.rs".to_string(),
                kind: ChangeKind::Modified,
            }],
            untracked: vec!["new.txt".to_string()],
            conflicted: vec!["c.rs".to_string()],
        };
        assert_eq!(
            status_lines(&status),
            vec!["A  a.rs", " M b.rs", "UU c.rs", "?? new.txt"]
        );
    }

    #[test]
    fn test_conflict_line() {
        let mut record = ConflictRecord::new(
            "src/lib.rs".to_string(),
            ConflictKind::ModifyDelete,
            None,
            Some(oid('a')),
            None,
        );
        insta::assert_snapshot!(conflict_line(&record), @"unresolved modify/delete src/lib.rs");
        record.resolution = Resolution::ResolvedOurs;
        insta::assert_snapshot!(conflict_line(&record), @"ours       modify/delete src/lib.rs");
    }

    #[test]
    fn test_bisect_lines() {
        let searching = BisectOutcome {
            current: Some(oid('c')),
            culprit: None,
            remaining: Some(3),
        };
        assert_eq!(
            bisect_lines(&searching),
            vec!["testing ccccccc", "about 3 revision(s) left"]
        );
        let found = BisectOutcome {
            culprit: Some(oid('d')),
            ..searching
        };
        assert_eq!(bisect_lines(&found), vec![format!("first bad commit: {}", oid('d'))]);
    }

    #[test]
    fn test_park_line() {
        let entry = ParkEntry {
            label: "wip".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0).unwrap(),
            base: oid('a'),
            branch: None,
            provider: ProviderKind::Subprocess,
            payload: ParkPayload {
                id: "1".to_string(),
                reference: ParkPayload::reference_for("1"),
                commit: oid('b'),
            },
        };
        insta::assert_snapshot!(park_line(2, &entry), @"2: wip on detached HEAD (subprocess, 2026-05-01 09:30)");
    }

    #[test]
    fn test_pr_line() {
        let branch = |name: &str| PrBranch {
            ref_name: name.to_string(),
            sha: String::new(),
        };
        let pr = PullRequest {
            number: 9,
            title: "Speed up status".to_string(),
            state: "open".to_string(),
            html_url: String::new(),
            head: branch("fast"),
            base: branch("main"),
            user: None,
            draft: true,
        };
        insta::assert_snapshot!(pr_line(&pr), @"#9 Speed up status (draft) [fast -> main]");
    }

}
