// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the operation engine.
//!
//! Every scenario runs against real repositories created with the `git`
//! binary, once per provider.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use gitduo::engine::state::Status;
use gitduo::engine::{Engine, ResolutionPolicy, Side};
use gitduo::error::EngineError;
use gitduo::provider::embedded::EmbeddedProvider;
use gitduo::provider::subprocess::SubprocessProvider;
use gitduo::provider::{OperationKind, ProviderKind, ProviderSet};
use gitduo::repository::RepositoryHandle;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const PROVIDERS: [ProviderKind; 2] = [ProviderKind::Embedded, ProviderKind::Subprocess];

// =============================================================================
// Helpers
// =============================================================================

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

fn commit_file(dir: &Path, path: &str, content: &str, message: &str) -> String {
    fs::write(dir.join(path), content).unwrap();
    git(dir, &["add", path]);
    git(dir, &["commit", "-q", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

fn setup() -> (TempDir, RepositoryHandle) {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "user.email", "test@test.com"]);
    commit_file(dir, "file.txt", "1\n2\n3\n4\n5\n6\n7\n", "initial");
    let repo = RepositoryHandle::discover(dir).unwrap();
    (temp, repo)
}

/// `main` and `feature` rewrite lines 3-5 differently.
fn diverge(dir: &Path) {
    git(dir, &["branch", "feature"]);
    commit_file(dir, "file.txt", "1\n2\nmain3\nmain4\nmain5\n6\n7\n", "main edit");
    git(dir, &["checkout", "-q", "feature"]);
    commit_file(dir, "file.txt", "1\n2\nf3\nf4\nf5\n6\n7\n", "feature edit");
    git(dir, &["checkout", "-q", "main"]);
}

fn providers(cancel: CancellationToken) -> ProviderSet {
    ProviderSet::new(
        Arc::new(EmbeddedProvider::new()),
        Arc::new(SubprocessProvider::new(
            "git",
            Some(Duration::from_secs(60)),
            cancel,
        )),
    )
}

fn engine(kind: Option<ProviderKind>) -> Engine {
    Engine::builder()
        .providers(providers(CancellationToken::new()))
        .maybe_pinned(kind)
        .lock_timeout(Duration::from_secs(2))
        .build()
}

fn read(repo: &RepositoryHandle, path: &str) -> String {
    fs::read_to_string(repo.worktree_path(path)).unwrap()
}

fn parent_count(dir: &Path) -> usize {
    git(dir, &["rev-list", "--parents", "-n", "1", "HEAD"])
        .split_whitespace()
        .count()
        - 1
}

// =============================================================================
// Merge
// =============================================================================

#[tokio::test]
async fn merge_conflict_resolve_and_continue() {
    for kind in PROVIDERS {
        let (_temp, repo) = setup();
        let dir = repo.workdir();
        diverge(dir);
        let engine = engine(Some(kind));

        let desc = engine.merge(&repo, "feature").await.unwrap();
        assert_eq!(desc.provider, kind);
        assert_eq!(desc.status, Status::Conflicted, "{kind}");
        let paths: Vec<&str> = desc.conflicts.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["file.txt"], "{kind}");

        engine
            .resolve(&repo, "file.txt", &ResolutionPolicy::Theirs)
            .await
            .unwrap();
        let desc = engine.continue_operation(&repo).await.unwrap();

        assert_eq!(desc.status, Status::Completed, "{kind}");
        assert_eq!(read(&repo, "file.txt"), "1\n2\nf3\nf4\nf5\n6\n7\n", "{kind}");
        assert_eq!(parent_count(dir), 2, "{kind}");
        assert_eq!(git(dir, &["status", "--porcelain"]), "", "{kind}");
        assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "main");
    }
}

#[tokio::test]
async fn merge_clean_completes_immediately() {
    for kind in PROVIDERS {
        let (_temp, repo) = setup();
        let dir = repo.workdir();
        git(dir, &["checkout", "-q", "-b", "feature"]);
        commit_file(dir, "feature.txt", "f\n", "feature only");
        git(dir, &["checkout", "-q", "main"]);
        commit_file(dir, "main.txt", "m\n", "main only");

        let desc = engine(Some(kind)).merge(&repo, "feature").await.unwrap();
        assert_eq!(desc.status, Status::Completed, "{kind}");
        assert_eq!(desc.applied.len(), 1, "{kind}");
        assert!(repo.worktree_path("feature.txt").exists(), "{kind}");
        assert_eq!(parent_count(dir), 2, "{kind}");
    }
}

#[tokio::test]
async fn operation_survives_engine_restart() {
    for kind in PROVIDERS {
        let (_temp, repo) = setup();
        diverge(repo.workdir());

        engine(Some(kind)).merge(&repo, "feature").await.unwrap();
        assert!(repo.state_file().exists());

        // A fresh engine finds the persisted operation.
        let restarted = engine(None);
        let active = restarted.active(&repo).unwrap().expect("active operation");
        assert_eq!(active.kind, OperationKind::Merge);
        assert_eq!(active.provider, kind);

        restarted.resolve_all(&repo, Side::Ours).await.unwrap();
        let desc = restarted.continue_operation(&repo).await.unwrap();
        assert_eq!(desc.status, Status::Completed, "{kind}");
        assert_eq!(read(&repo, "file.txt"), "1\n2\nmain3\nmain4\nmain5\n6\n7\n");
    }
}

#[tokio::test]
async fn pinning_another_provider_is_a_mismatch() {
    let (_temp, repo) = setup();
    diverge(repo.workdir());
    engine(Some(ProviderKind::Embedded))
        .merge(&repo, "feature")
        .await
        .unwrap();

    let err = engine(Some(ProviderKind::Subprocess))
        .abort(&repo)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            EngineError::ProviderMismatch {
                requested: ProviderKind::Subprocess,
                owner: ProviderKind::Embedded,
                ..
            }
        ),
        "{err:?}"
    );

    engine(None).abort(&repo).await.unwrap();
}

// =============================================================================
// Rebase
// =============================================================================

#[tokio::test]
async fn rebase_abort_restores_branch() {
    for kind in PROVIDERS {
        let (_temp, repo) = setup();
        let dir = repo.workdir();
        diverge(dir);
        git(dir, &["checkout", "-q", "feature"]);
        let before = git(dir, &["rev-parse", "HEAD"]);
        let engine = engine(Some(kind));

        let desc = engine.rebase(&repo, "main").await.unwrap();
        assert_eq!(desc.status, Status::Conflicted, "{kind}");

        let desc = engine.abort(&repo).await.unwrap();
        assert_eq!(desc.status, Status::Aborted);
        assert_eq!(git(dir, &["rev-parse", "HEAD"]), before, "{kind}");
        assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "feature", "{kind}");
        assert_eq!(git(dir, &["status", "--porcelain"]), "", "{kind}");
        assert!(engine.active(&repo).unwrap().is_none());
    }
}

#[tokio::test]
async fn rebase_replays_clean_commits() {
    for kind in PROVIDERS {
        let (_temp, repo) = setup();
        let dir = repo.workdir();
        git(dir, &["branch", "feature"]);
        commit_file(dir, "upstream.txt", "u\n", "upstream");
        git(dir, &["checkout", "-q", "feature"]);
        commit_file(dir, "one.txt", "1\n", "one");
        commit_file(dir, "two.txt", "2\n", "two");

        let desc = engine(Some(kind)).rebase(&repo, "main").await.unwrap();
        assert_eq!(desc.status, Status::Completed, "{kind}");
        assert_eq!(desc.applied.len(), 2, "{kind}");
        assert_eq!(git(dir, &["log", "--format=%s", "-4"]), "two\none\nupstream\ninitial");
        assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "feature");
    }
}

#[tokio::test]
async fn rebase_resumes_after_conflicted_step() {
    for kind in PROVIDERS {
        let (_temp, repo) = setup();
        let dir = repo.workdir();
        git(dir, &["branch", "feature"]);
        commit_file(dir, "file.txt", "1\n2\nmain3\n4\n5\n6\n7\n", "main edit");
        git(dir, &["checkout", "-q", "feature"]);
        commit_file(dir, "a.txt", "a\n", "c1");
        commit_file(dir, "file.txt", "1\n2\nf3\n4\n5\n6\n7\n", "c2");
        commit_file(dir, "c.txt", "c\n", "c3");
        let engine = engine(Some(kind));

        let desc = engine.rebase(&repo, "main").await.unwrap();
        assert_eq!(desc.status, Status::Conflicted, "{kind}");
        assert_eq!(desc.applied.len(), 1, "{kind}");
        assert_eq!(desc.pending.len(), 1, "{kind}");

        engine.resolve_all(&repo, Side::Theirs).await.unwrap();
        let desc = engine.continue_operation(&repo).await.unwrap();
        assert_eq!(desc.status, Status::Completed, "{kind}");
        assert_eq!(desc.applied.len(), 3, "{kind}");
        assert_eq!(read(&repo, "file.txt"), "1\n2\nf3\n4\n5\n6\n7\n", "{kind}");
        assert_eq!(
            git(dir, &["log", "--format=%s", "-4"]),
            "c3\nc2\nc1\nmain edit",
            "{kind}"
        );
        assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "feature", "{kind}");
        assert!(engine.active(&repo).unwrap().is_none(), "{kind}");
    }
}

#[tokio::test]
async fn interactive_rebase_uses_native_sequencer() {
    let (_temp, repo) = setup();
    let dir = repo.workdir();
    let one = commit_file(dir, "a.txt", "a\n", "one");
    let two = commit_file(dir, "b.txt", "b\n", "two");
    let todo = format!("pick {two} two\npick {one} one\n");

    let desc = engine(None)
        .interactive_rebase(&repo, "HEAD~2", &todo)
        .await
        .unwrap();
    assert_eq!(desc.provider, ProviderKind::Subprocess);
    assert_eq!(desc.status, Status::Completed);
    assert_eq!(git(dir, &["log", "--format=%s", "-2"]), "one\ntwo");
}

// =============================================================================
// Cherry-pick
// =============================================================================

#[tokio::test]
async fn cherry_pick_applies_in_order() {
    for kind in PROVIDERS {
        let (_temp, repo) = setup();
        let dir = repo.workdir();
        git(dir, &["checkout", "-q", "-b", "topic"]);
        let a = commit_file(dir, "a.txt", "a\n", "add a");
        let b = commit_file(dir, "b.txt", "b\n", "add b");
        git(dir, &["checkout", "-q", "main"]);

        let desc = engine(Some(kind))
            .cherry_pick(&repo, &[a, b])
            .await
            .unwrap();
        assert_eq!(desc.status, Status::Completed, "{kind}");
        assert_eq!(git(dir, &["log", "--format=%s", "-3"]), "add b\nadd a\ninitial");
    }
}

// =============================================================================
// Bisect
// =============================================================================

#[tokio::test]
async fn bisect_session_is_tracked() {
    let (_temp, repo) = setup();
    let dir = repo.workdir();
    let good = git(dir, &["rev-parse", "HEAD"]);
    commit_file(dir, "ok.txt", "1\n", "fine");
    let culprit = commit_file(dir, "bug.txt", "bug\n", "introduce bug");
    commit_file(dir, "later.txt", "2\n", "later");
    let engine = engine(None);

    let mut desc = engine.bisect_start(&repo, "HEAD", &[good]).await.unwrap();
    assert_eq!(desc.kind, OperationKind::Bisect);
    for _ in 0..5 {
        if desc.bisect.as_ref().and_then(|b| b.culprit.as_ref()).is_some() {
            break;
        }
        let mark = if dir.join("bug.txt").exists() {
            gitduo::provider::BisectMark::Bad
        } else {
            gitduo::provider::BisectMark::Good
        };
        desc = engine.bisect_mark(&repo, mark, None).await.unwrap();
    }
    let found = desc.bisect.and_then(|b| b.culprit).expect("culprit");
    assert_eq!(found.as_str(), culprit);

    let err = engine.merge(&repo, "main").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationInProgress { kind: OperationKind::Bisect, .. }));

    let desc = engine.bisect_reset(&repo).await.unwrap();
    assert_eq!(desc.status, Status::Completed);
    assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "main");
}

// =============================================================================
// Begin failures
// =============================================================================

#[tokio::test]
async fn failed_first_step_rolls_back() {
    for kind in PROVIDERS {
        let (_temp, repo) = setup();
        let dir = repo.workdir();
        let before = git(dir, &["rev-parse", "HEAD"]);
        git(dir, &["checkout", "-q", "--orphan", "other"]);
        git(dir, &["rm", "-q", "-rf", "."]);
        commit_file(dir, "other.txt", "o\n", "unrelated");
        git(dir, &["checkout", "-q", "main"]);
        let engine = engine(Some(kind));

        let err = engine.merge(&repo, "other").await.unwrap_err();
        assert!(matches!(err, EngineError::ProviderExecutionFailed { .. }), "{kind}: {err:?}");
        assert!(engine.active(&repo).unwrap().is_none(), "{kind}");
        let history = engine.history(&repo).unwrap();
        assert_eq!(history[0].kind, OperationKind::Merge, "{kind}");
        assert_eq!(history[0].status, Status::Aborted, "{kind}");
        assert_eq!(git(dir, &["rev-parse", "HEAD"]), before, "{kind}");
        assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "main", "{kind}");
        assert_eq!(git(dir, &["status", "--porcelain"]), "", "{kind}");

        git(dir, &["branch", "topic"]);
        git(dir, &["checkout", "-q", "topic"]);
        commit_file(dir, "topic.txt", "t\n", "topic");
        git(dir, &["checkout", "-q", "main"]);
        let desc = engine.merge(&repo, "topic").await.unwrap();
        assert_eq!(desc.status, Status::Completed, "{kind}");
        assert_eq!(read(&repo, "topic.txt"), "t\n", "{kind}");
    }
}

#[tokio::test]
async fn engine_from_default_config_merges() {
    let (_temp, repo) = setup();
    let dir = repo.workdir();
    git(dir, &["branch", "topic"]);
    git(dir, &["checkout", "-q", "topic"]);
    commit_file(dir, "topic.txt", "t\n", "topic");
    git(dir, &["checkout", "-q", "main"]);

    let config = gitduo::config::EngineConfig::default();
    let engine = Engine::from_config(&config, CancellationToken::new());
    let desc = engine.merge(&repo, "topic").await.unwrap();
    assert_eq!(desc.status, Status::Completed);
    assert_eq!(desc.provider, ProviderKind::Embedded);
    assert_eq!(read(&repo, "topic.txt"), "t\n");
}

// =============================================================================
// Interruption
// =============================================================================

#[tokio::test]
async fn cancelled_subprocess_reports_interruption() {
    let (_temp, repo) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let engine = Engine::builder()
        .providers(providers(cancel))
        .pinned(ProviderKind::Subprocess)
        .build();

    let err = engine.merge(&repo, "main").await.unwrap_err();
    assert!(matches!(err, EngineError::Interrupted { .. }), "{err:?}");
    assert!(engine.active(&repo).unwrap().is_none());
}
