// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::SubprocessProvider;
use crate::error::ProviderError;
use crate::provider::{
    BisectMark, ConflictKind, Oid, Operation, OperationKind, Provider, RestorePoint, Step,
    StepOutcome,
};
use crate::repository::RepositoryHandle;

// =============================================================================
// Helpers
// =============================================================================

fn provider() -> SubprocessProvider {
    SubprocessProvider::new("git", Some(Duration::from_secs(60)), CancellationToken::new())
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@test.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@test.com")
        .output()
        .expect("git should run");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn commit_file(dir: &Path, path: &str, content: &str, message: &str) -> Oid {
    fs::write(dir.join(path), content).unwrap();
    git(dir, &["add", path]);
    git(dir, &["commit", "-q", "-m", message]);
    Oid::parse(&git(dir, &["rev-parse", "HEAD"])).unwrap()
}

fn setup() -> (TempDir, RepositoryHandle) {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "user.email", "test@test.com"]);
    commit_file(dir, "file.txt", "1\n2\n3\n4\n5\n6\n7\n", "initial");
    let handle = RepositoryHandle::discover(dir).unwrap();
    (temp, handle)
}

fn read(handle: &RepositoryHandle, path: &str) -> String {
    fs::read_to_string(handle.worktree_path(path)).unwrap()
}

// =============================================================================
// Availability
// =============================================================================

#[tokio::test]
async fn test_missing_executable_is_unavailable() {
    let (_temp, handle) = setup();
    let provider = SubprocessProvider::new(
        "nonexistent-git-12345",
        None,
        CancellationToken::new(),
    );
    assert!(!provider.is_available());
    assert!(provider.capabilities().supports(Operation::BisectStart));
    let err = provider.head(&handle).await.unwrap_err();
    assert!(err.to_string().contains("nonexistent-git-12345"), "{err}");
}

#[tokio::test]
async fn test_cancelled_token_interrupts() {
    let (_temp, handle) = setup();
    let token = CancellationToken::new();
    token.cancel();
    let provider = SubprocessProvider::new("git", None, token);
    let err = provider.status(&handle).await.unwrap_err();
    assert!(matches!(err, ProviderError::Interrupted { .. }), "{err:?}");
    assert!(err.is_interruption());
}

// =============================================================================
// Basic operations
// =============================================================================

#[tokio::test]
async fn test_head_status_stage_commit() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    let provider = provider();

    let head = provider.head(&handle).await.unwrap();
    assert_eq!(head.branch.as_deref(), Some("main"));
    assert_eq!(head.commit.unwrap().as_str(), git(dir, &["rev-parse", "HEAD"]));

    fs::write(dir.join("file.txt"), "changed\n").unwrap();
    fs::write(dir.join("new file.txt"), "new\n").unwrap();
    let status = provider.status(&handle).await.unwrap();
    assert_eq!(status.unstaged.len(), 1);
    assert_eq!(status.untracked, vec!["new file.txt".to_string()]);

    let staged = provider.stage(&handle, &[".".to_string()]).await.unwrap();
    assert_eq!(staged, vec!["file.txt".to_string(), "new file.txt".to_string()]);
    let commit = provider.commit(&handle, "second").await.unwrap();
    assert_eq!(commit.as_str(), git(dir, &["rev-parse", "HEAD"]));
    assert!(provider.status(&handle).await.unwrap().is_clean());

    let err = provider.commit(&handle, "again").await.unwrap_err();
    assert!(matches!(err, ProviderError::NothingToCommit));
}

#[tokio::test]
async fn test_rev_parse_read_blob_and_branches() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    let provider = provider();

    let blob = provider.rev_parse(&handle, "HEAD").await.unwrap();
    assert_eq!(blob.as_str(), git(dir, &["rev-parse", "HEAD"]));
    assert!(matches!(
        provider.rev_parse(&handle, "missing").await,
        Err(ProviderError::NotFound { .. })
    ));

    let id = Oid::parse(&git(dir, &["rev-parse", "HEAD:file.txt"])).unwrap();
    assert_eq!(
        provider.read_blob(&handle, &id).await.unwrap(),
        b"1\n2\n3\n4\n5\n6\n7\n"
    );

    provider.create_branch(&handle, "topic", None).await.unwrap();
    provider.switch_branch(&handle, "topic").await.unwrap();
    let branches = provider.list_branches(&handle).await.unwrap();
    let names: Vec<(&str, bool)> = branches
        .iter()
        .map(|b| (b.name.as_str(), b.current))
        .collect();
    assert_eq!(names, vec![("main", false), ("topic", true)]);
}

#[tokio::test]
async fn test_diff_name_status() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    let first = git(dir, &["rev-parse", "HEAD"]);
    commit_file(dir, "added.txt", "a\n", "add");

    let diff = provider().diff(&handle, &first, Some("HEAD")).await.unwrap();
    assert_eq!(diff.len(), 1);
    assert_eq!(diff[0].path, "added.txt");
    assert_eq!(diff[0].kind.letter(), 'A');
}

// =============================================================================
// Multi-step operations
// =============================================================================

#[tokio::test]
async fn test_merge_conflict_continue() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    git(dir, &["branch", "feature"]);
    commit_file(dir, "file.txt", "1\n2\nmain3\nmain4\nmain5\n6\n7\n", "main edit");
    git(dir, &["checkout", "-q", "feature"]);
    let feature = commit_file(dir, "file.txt", "1\n2\nf3\nf4\nf5\n6\n7\n", "feature edit");
    git(dir, &["checkout", "-q", "main"]);
    let provider = provider();

    let outcome = provider.merge(&handle, "feature", &feature).await.unwrap();
    let StepOutcome::Conflicted(records) = outcome else {
        panic!("expected conflicts, got {outcome:?}");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ConflictKind::Content);
    assert_eq!(records[0].hunks.len(), 1);
    assert!(records[0].base.is_some());

    fs::write(handle.worktree_path("file.txt"), "1\n2\nf3\nf4\nf5\n6\n7\n").unwrap();
    let step = Step::Merge {
        target: "feature".to_string(),
        commit: feature,
    };
    let commit = provider
        .continue_active(&handle, OperationKind::Merge, &step, &records)
        .await
        .unwrap();
    assert!(commit.is_some());
    assert_eq!(
        git(dir, &["rev-list", "--parents", "-n", "1", "HEAD"])
            .split_whitespace()
            .count(),
        3
    );
    assert_eq!(git(dir, &["log", "-1", "--format=%s"]), "Merge branch 'feature'");
}

#[tokio::test]
async fn test_abort_restores_branch_and_tree() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    git(dir, &["branch", "feature"]);
    let before = commit_file(dir, "file.txt", "main\n", "main edit");
    git(dir, &["checkout", "-q", "feature"]);
    let feature = commit_file(dir, "file.txt", "feature\n", "feature edit");
    git(dir, &["checkout", "-q", "main"]);
    let provider = provider();

    let outcome = provider.merge(&handle, "feature", &feature).await.unwrap();
    assert!(matches!(outcome, StepOutcome::Conflicted(_)));
    fs::write(dir.join("stray.txt"), "x\n").unwrap();

    let restore = RestorePoint {
        branch: Some("main".to_string()),
        head: before.clone(),
        native: None,
    };
    provider.abort_active(&handle, &restore).await.unwrap();
    assert_eq!(read(&handle, "file.txt"), "main\n");
    assert!(!dir.join("stray.txt").exists());
    assert_eq!(git(dir, &["rev-parse", "HEAD"]), before.as_str());
    assert!(!handle.git_dir().join("MERGE_HEAD").exists());
    assert!(provider.status(&handle).await.unwrap().is_clean());
}

#[tokio::test]
async fn test_rebase_steps_and_finish() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    git(dir, &["checkout", "-q", "-b", "feature"]);
    commit_file(dir, "b.txt", "b\n", "one");
    commit_file(dir, "c.txt", "c\n", "two");
    git(dir, &["checkout", "-q", "main"]);
    let upstream = commit_file(dir, "d.txt", "d\n", "upstream");
    git(dir, &["checkout", "-q", "feature"]);
    let provider = provider();

    let plan = provider.rebase_begin(&handle, &upstream).await.unwrap();
    assert_eq!(plan.onto, upstream);
    assert_eq!(plan.commits.len(), 2);
    for commit in &plan.commits {
        let outcome = provider.rebase_step(&handle, commit).await.unwrap();
        assert!(matches!(outcome, StepOutcome::Clean { commit: Some(_) }));
    }
    provider.rebase_finish(&handle, Some("feature")).await.unwrap();
    assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "feature");
    assert_eq!(git(dir, &["log", "--format=%s", "-3"]), "two\none\nupstream");
}

#[tokio::test]
async fn test_empty_cherry_pick_is_skipped() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    git(dir, &["checkout", "-q", "-b", "feature"]);
    let pick = commit_file(dir, "p.txt", "p\n", "pick me");
    git(dir, &["checkout", "-q", "main"]);
    let provider = provider();

    let first = provider.cherry_pick(&handle, &pick).await.unwrap();
    assert!(matches!(first, StepOutcome::Clean { commit: Some(_) }));
    let second = provider.cherry_pick(&handle, &pick).await.unwrap();
    assert_eq!(second, StepOutcome::Clean { commit: None });
    assert!(!handle.git_dir().join("CHERRY_PICK_HEAD").exists());
}

#[tokio::test]
async fn test_interactive_rebase_reorders() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    let base = Oid::parse(&git(dir, &["rev-parse", "HEAD"])).unwrap();
    let one = commit_file(dir, "a.txt", "a\n", "one");
    let two = commit_file(dir, "b.txt", "b\n", "two");

    let todo = format!("pick {two} two\npick {one} one\n");
    let outcome = provider()
        .interactive_rebase(&handle, &base, &todo)
        .await
        .unwrap();
    assert!(matches!(outcome, StepOutcome::Clean { commit: Some(_) }));
    assert_eq!(git(dir, &["log", "--format=%s", "-2"]), "one\ntwo");
    assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "main");
}

#[tokio::test]
async fn test_bisect_finds_first_bad_commit() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    let good = git(dir, &["rev-parse", "HEAD"]);
    commit_file(dir, "ok1.txt", "1\n", "fine one");
    let culprit = commit_file(dir, "bug.txt", "bug\n", "introduce bug");
    commit_file(dir, "ok2.txt", "2\n", "fine two");
    commit_file(dir, "ok3.txt", "3\n", "fine three");
    let provider = provider();

    let mut outcome = provider
        .bisect_start(&handle, "HEAD", &[good])
        .await
        .unwrap();
    for _ in 0..6 {
        if outcome.culprit.is_some() {
            break;
        }
        let mark = if dir.join("bug.txt").exists() {
            BisectMark::Bad
        } else {
            BisectMark::Good
        };
        outcome = provider.bisect_mark(&handle, mark, None).await.unwrap();
    }
    assert_eq!(outcome.culprit, Some(culprit));
    provider.bisect_reset(&handle).await.unwrap();
    assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "main");
}

// =============================================================================
// Park payloads
// =============================================================================

#[tokio::test]
async fn test_stash_round_trip_pins_reference() {
    let (_temp, handle) = setup();
    let dir = handle.workdir();
    fs::write(dir.join("file.txt"), "wip\n").unwrap();
    fs::write(dir.join("scratch.txt"), "scratch\n").unwrap();
    let provider = provider();

    let payload = provider
        .stash_create(&handle, "p1", "wip")
        .await
        .unwrap()
        .expect("payload");
    assert!(provider.status(&handle).await.unwrap().is_clean());
    assert_eq!(git(dir, &["stash", "list"]), "", "git's own stash list is untouched");
    assert_eq!(provider.stash_list(&handle).await.unwrap(), vec![payload.clone()]);

    let outcome = provider.stash_apply(&handle, &payload).await.unwrap();
    assert_eq!(outcome, StepOutcome::Clean { commit: None });
    assert_eq!(read(&handle, "file.txt"), "wip\n");
    assert_eq!(read(&handle, "scratch.txt"), "scratch\n");

    provider.stash_drop(&handle, &payload).await.unwrap();
    assert!(provider.stash_list(&handle).await.unwrap().is_empty());
}

// =============================================================================
// Worktrees
// =============================================================================

#[tokio::test]
async fn test_worktree_add_list_remove() {
    let (_temp, handle) = setup();
    let outside = tempfile::tempdir().unwrap();
    let provider = provider();
    let path = outside.path().join("linked");

    let info = provider
        .worktree_add(&handle, &path, Some("side"))
        .await
        .unwrap();
    assert_eq!(info.branch.as_deref(), Some("side"));
    assert!(path.join("file.txt").exists());

    let listed = provider.worktree_list(&handle).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|w| w.branch.as_deref() == Some("side")));

    provider.worktree_remove(&handle, &path, false).await.unwrap();
    assert_eq!(provider.worktree_list(&handle).await.unwrap().len(), 1);
}
