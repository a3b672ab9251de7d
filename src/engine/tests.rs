// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use super::lock::RepoLock;
use super::selector::Selector;
use super::state::{Driver, OperationDescriptor, RepoState, Status};
use super::*;
use crate::error::ProviderResult;
use crate::provider::{
    BranchInfo, Capabilities, CloneOptions, ConflictKind, ConflictRecord, DiffEntry,
    ParkPayload, RebasePlan, Resolution, RestorePoint, WorktreeStatus,
};

// =============================================================================
// Helpers
// =============================================================================

/// Provider that only answers capability queries.
#[derive(Debug)]
struct Stub {
    kind: ProviderKind,
    caps: Capabilities,
    available: bool,
}

impl Stub {
    fn new(kind: ProviderKind, caps: Capabilities, available: bool) -> Arc<dyn Provider> {
        Arc::new(Self {
            kind,
            caps,
            available,
        })
    }
}

fn stub<T>() -> ProviderResult<T> {
    Err(ProviderError::backend("stub"))
}

#[async_trait]
impl Provider for Stub {
    fn kind(&self) -> ProviderKind {
        self.kind
    }
    fn capabilities(&self) -> Capabilities {
        self.caps
    }
    fn is_available(&self) -> bool {
        self.available
    }
    async fn init(&self, _: &Path) -> ProviderResult<RepositoryHandle> {
        stub()
    }
    async fn clone_repo(&self, _: &str, _: &Path, _: &CloneOptions) -> ProviderResult<RepositoryHandle> {
        stub()
    }
    async fn head(&self, _: &RepositoryHandle) -> ProviderResult<HeadState> {
        stub()
    }
    async fn status(&self, _: &RepositoryHandle) -> ProviderResult<WorktreeStatus> {
        stub()
    }
    async fn rev_parse(&self, _: &RepositoryHandle, _: &str) -> ProviderResult<Oid> {
        stub()
    }
    async fn read_blob(&self, _: &RepositoryHandle, _: &Oid) -> ProviderResult<Vec<u8>> {
        stub()
    }
    async fn list_branches(&self, _: &RepositoryHandle) -> ProviderResult<Vec<BranchInfo>> {
        stub()
    }
    async fn diff(&self, _: &RepositoryHandle, _: &str, _: Option<&str>) -> ProviderResult<Vec<DiffEntry>> {
        stub()
    }
    async fn create_branch(&self, _: &RepositoryHandle, _: &str, _: Option<&str>) -> ProviderResult<Oid> {
        stub()
    }
    async fn switch_branch(&self, _: &RepositoryHandle, _: &str) -> ProviderResult<()> {
        stub()
    }
    async fn stage(&self, _: &RepositoryHandle, _: &[String]) -> ProviderResult<Vec<String>> {
        stub()
    }
    async fn commit(&self, _: &RepositoryHandle, _: &str) -> ProviderResult<Oid> {
        stub()
    }
    async fn merge(&self, _: &RepositoryHandle, _: &str, _: &Oid) -> ProviderResult<StepOutcome> {
        stub()
    }
    async fn rebase_begin(&self, _: &RepositoryHandle, _: &Oid) -> ProviderResult<RebasePlan> {
        stub()
    }
    async fn rebase_step(&self, _: &RepositoryHandle, _: &Oid) -> ProviderResult<StepOutcome> {
        stub()
    }
    async fn rebase_finish(&self, _: &RepositoryHandle, _: Option<&str>) -> ProviderResult<()> {
        stub()
    }
    async fn cherry_pick(&self, _: &RepositoryHandle, _: &Oid) -> ProviderResult<StepOutcome> {
        stub()
    }
    async fn continue_active(
        &self,
        _: &RepositoryHandle,
        _: OperationKind,
        _: &Step,
        _: &[ConflictRecord],
    ) -> ProviderResult<Option<Oid>> {
        stub()
    }
    async fn abort_active(&self, _: &RepositoryHandle, _: &RestorePoint) -> ProviderResult<()> {
        stub()
    }
    async fn stash_create(&self, _: &RepositoryHandle, _: &str, _: &str) -> ProviderResult<Option<ParkPayload>> {
        stub()
    }
    async fn stash_list(&self, _: &RepositoryHandle) -> ProviderResult<Vec<ParkPayload>> {
        stub()
    }
    async fn stash_apply(&self, _: &RepositoryHandle, _: &ParkPayload) -> ProviderResult<StepOutcome> {
        stub()
    }
    async fn stash_drop(&self, _: &RepositoryHandle, _: &ParkPayload) -> ProviderResult<()> {
        stub()
    }
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

fn commit_file(dir: &Path, path: &str, content: &str, message: &str) {
    fs::write(dir.join(path), content).unwrap();
    git(dir, &["add", path]);
    git(dir, &["commit", "-q", "-m", message]);
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

/// Embedded provider plus an unavailable subprocess provider.
fn embedded_engine() -> Engine {
    let providers = ProviderSet::new(
        Arc::new(EmbeddedProvider::new()),
        Stub::new(ProviderKind::Subprocess, Capabilities::everything(), false),
    );
    Engine::builder()
        .providers(providers)
        .lock_timeout(Duration::from_millis(200))
        .build()
}

fn read(repo: &RepositoryHandle, path: &str) -> String {
    fs::read_to_string(repo.worktree_path(path)).unwrap()
}

/// `main` changes lines 3-5 one way, `feature` another.
fn diverge(dir: &Path) {
    git(dir, &["branch", "feature"]);
    commit_file(dir, "file.txt", "1\n2\nmain3\nmain4\nmain5\n6\n7\n", "main edit");
    git(dir, &["checkout", "-q", "feature"]);
    commit_file(dir, "file.txt", "1\n2\nf3\nf4\nf5\n6\n7\n", "feature edit");
    git(dir, &["checkout", "-q", "main"]);
}

// =============================================================================
// Selector
// =============================================================================

fn baseline() -> Capabilities {
    Capabilities::everything() - Capabilities::of(&[Operation::BisectStart, Operation::Fetch])
}

#[test]
fn test_selector_prefers_embedded() {
    let set = ProviderSet::new(
        Stub::new(ProviderKind::Embedded, baseline(), true),
        Stub::new(ProviderKind::Subprocess, Capabilities::everything(), true),
    );
    let selector = Selector::new(&set, None);
    let chosen = selector.select(Operation::Merge, None).unwrap();
    assert_eq!(chosen.kind(), ProviderKind::Embedded);
    let chosen = selector.select(Operation::BisectStart, None).unwrap();
    assert_eq!(chosen.kind(), ProviderKind::Subprocess);
}

#[test]
fn test_selector_advanced_without_subprocess_is_unsupported() {
    let set = ProviderSet::new(
        Stub::new(ProviderKind::Embedded, baseline(), true),
        Stub::new(ProviderKind::Subprocess, Capabilities::everything(), false),
    );
    let err = Selector::new(&set, None)
        .select(Operation::BisectStart, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::Unsupported { operation: Operation::BisectStart, .. }));
}

#[test]
fn test_selector_pinned_provider() {
    let set = ProviderSet::new(
        Stub::new(ProviderKind::Embedded, baseline(), true),
        Stub::new(ProviderKind::Subprocess, Capabilities::everything(), true),
    );
    let pinned = Selector::new(&set, Some(ProviderKind::Subprocess));
    assert_eq!(
        pinned.select(Operation::Merge, None).unwrap().kind(),
        ProviderKind::Subprocess
    );

    let pinned = Selector::new(&set, Some(ProviderKind::Embedded));
    let err = pinned.select(Operation::Fetch, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "operation 'fetch' is not supported: the embedded provider does not declare it"
    );
}

#[test]
fn test_selector_owner_rules() {
    let set = ProviderSet::new(
        Stub::new(ProviderKind::Embedded, baseline(), true),
        Stub::new(ProviderKind::Subprocess, Capabilities::everything(), false),
    );
    let auto = Selector::new(&set, None);
    assert_eq!(
        auto.select(Operation::ContinueActive, Some(ProviderKind::Embedded))
            .unwrap()
            .kind(),
        ProviderKind::Embedded
    );
    let err = auto
        .select(Operation::ContinueActive, Some(ProviderKind::Subprocess))
        .unwrap_err();
    assert!(matches!(err, EngineError::Unsupported { .. }));

    let pinned = Selector::new(&set, Some(ProviderKind::Embedded));
    let err = pinned
        .select(Operation::AbortActive, Some(ProviderKind::Subprocess))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::ProviderMismatch {
            requested: ProviderKind::Embedded,
            owner: ProviderKind::Subprocess,
            ..
        }
    ));
}

#[test]
fn test_selector_empty_set() {
    let set = ProviderSet::empty();
    let err = Selector::new(&set, None)
        .select(Operation::Status, None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "operation 'status' is not supported: no available provider declares it"
    );
    let err = Selector::new(&set, None)
        .select(Operation::BisectStart, None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "operation 'bisect-start' is not supported: it needs the git executable, which was not found"
    );
}

// =============================================================================
// State, store and lock
// =============================================================================

fn descriptor(id: &str) -> OperationDescriptor {
    let head = HeadState {
        branch: Some("main".to_string()),
        commit: None,
    };
    let oid = Oid::parse(&"a".repeat(40)).unwrap();
    let mut desc = OperationDescriptor::new(
        OperationKind::Merge,
        ProviderKind::Embedded,
        vec!["feature".to_string()],
        &head,
        oid,
    );
    desc.id = id.to_string();
    desc
}

#[test]
fn test_archive_keeps_most_recent() {
    let mut state = RepoState::default();
    for i in 0..5 {
        state.active = Some(descriptor(&format!("op-{i}")));
        state.archive(3);
    }
    assert!(state.active.is_none());
    let ids: Vec<&str> = state.history.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["op-4", "op-3", "op-2"]);
}

#[test]
fn test_restore_point_marks_native_sequencers() {
    let mut desc = descriptor("x");
    assert_eq!(desc.restore_point().native, None);
    assert_eq!(desc.restore_point().branch.as_deref(), Some("main"));
    desc.driver = Driver::Native;
    assert_eq!(desc.restore_point().native, Some(OperationKind::Rebase));
    desc.kind = OperationKind::Bisect;
    assert_eq!(desc.restore_point().native, Some(OperationKind::Bisect));
}

#[test]
fn test_unresolved_paths() {
    let mut desc = descriptor("x");
    desc.conflicts = vec![
        ConflictRecord::new("a".to_string(), ConflictKind::Content, None, None, None),
        ConflictRecord::new("b".to_string(), ConflictKind::Binary, None, None, None),
    ];
    desc.conflict_mut("a").unwrap().resolution = Resolution::ResolvedOurs;
    assert_eq!(desc.unresolved_paths(), vec!["b".to_string()]);
}

#[test]
fn test_store_round_trip_and_missing_file() {
    let (_temp, repo) = setup();
    assert_eq!(store::load(&repo).unwrap(), RepoState::default());

    let mut state = RepoState::default();
    state.active = Some(descriptor("op-1"));
    store::save(&repo, &state).unwrap();
    assert!(repo.state_file().exists());
    assert_eq!(store::load(&repo).unwrap(), state);
}

#[test]
fn test_store_corrupt_state_is_kept() {
    let (_temp, repo) = setup();
    repo.ensure_meta_dir().unwrap();
    fs::write(repo.state_file(), "{ not json").unwrap();
    let err = store::load(&repo).unwrap_err();
    assert!(matches!(err, EngineError::CorruptState { .. }));
    assert_eq!(fs::read_to_string(repo.state_file()).unwrap(), "{ not json");

    fs::write(repo.state_file(), r#"{"version": 99}"#).unwrap();
    let err = store::load(&repo).unwrap_err();
    assert!(err.to_string().contains("unsupported version 99"), "{err}");
}

#[tokio::test]
async fn test_lock_is_exclusive() {
    let (_temp, repo) = setup();
    let held = RepoLock::acquire(&repo, Duration::from_millis(100)).await.unwrap();
    let err = RepoLock::acquire(&repo, Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RepositoryBusy { waited_ms: 100, .. }));
    drop(held);
    RepoLock::acquire(&repo, Duration::from_millis(100)).await.unwrap();
}

// =============================================================================
// Operation lifecycle
// =============================================================================

#[tokio::test]
async fn test_merge_conflict_resolve_theirs_and_continue() {
    let (_temp, repo) = setup();
    diverge(repo.workdir());
    let engine = embedded_engine();

    let desc = engine.merge(&repo, "feature").await.unwrap();
    assert_eq!(desc.status, Status::Conflicted);
    assert_eq!(desc.conflicts.len(), 1);
    assert_eq!(desc.conflicts[0].path, "file.txt");

    let err = engine.continue_operation(&repo).await.unwrap_err();
    assert!(matches!(err, EngineError::UnresolvedConflicts { ref paths } if paths == &["file.txt"]));

    let record = engine
        .resolve(&repo, "file.txt", &ResolutionPolicy::Theirs)
        .await
        .unwrap();
    assert_eq!(record.resolution, Resolution::ResolvedTheirs);
    let desc = engine.continue_operation(&repo).await.unwrap();
    assert_eq!(desc.status, Status::Completed);
    assert_eq!(read(&repo, "file.txt"), "1\n2\nf3\nf4\nf5\n6\n7\n");
    assert!(engine.active(&repo).unwrap().is_none());
    assert_eq!(engine.history(&repo).unwrap()[0].id, desc.id);
}

#[tokio::test]
async fn test_only_one_active_operation() {
    let (_temp, repo) = setup();
    diverge(repo.workdir());
    let engine = embedded_engine();
    engine.merge(&repo, "feature").await.unwrap();

    let err = engine.merge(&repo, "feature").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationInProgress { kind: OperationKind::Merge, .. }));
    let err = engine.park(&repo, None).await.unwrap_err();
    assert!(matches!(err, EngineError::OperationInProgress { .. }));
}

#[tokio::test]
async fn test_abort_restores_pre_begin_state() {
    let (_temp, repo) = setup();
    let dir = repo.workdir();
    diverge(dir);
    let before = git(dir, &["rev-parse", "HEAD"]);
    let engine = embedded_engine();

    engine.merge(&repo, "feature").await.unwrap();
    let desc = engine.abort(&repo).await.unwrap();
    assert_eq!(desc.status, Status::Aborted);
    assert_eq!(git(dir, &["rev-parse", "HEAD"]), before);
    assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "main");
    assert_eq!(read(&repo, "file.txt"), "1\n2\nmain3\nmain4\nmain5\n6\n7\n");
    assert_eq!(git(dir, &["status", "--porcelain"]), "");

    let err = engine.abort(&repo).await.unwrap_err();
    assert!(matches!(err, EngineError::NoOperationInProgress));
}

#[tokio::test]
async fn test_begin_requires_clean_tree() {
    let (_temp, repo) = setup();
    fs::write(repo.worktree_path("scratch.txt"), "x").unwrap();
    let engine = embedded_engine();
    let err = engine.merge(&repo, "main").await.unwrap_err();
    assert!(matches!(err, EngineError::DirtyWorkingTree { ref paths } if paths == &["scratch.txt"]));
    assert!(engine.active(&repo).unwrap().is_none());
}

#[tokio::test]
async fn test_rebase_resumes_after_conflict() {
    let (_temp, repo) = setup();
    let dir = repo.workdir();
    git(dir, &["branch", "feature"]);
    commit_file(dir, "file.txt", "1\n2\nmain3\n4\n5\n6\n7\n", "main edit");
    git(dir, &["checkout", "-q", "feature"]);
    commit_file(dir, "a.txt", "a\n", "c1");
    commit_file(dir, "file.txt", "1\n2\nf3\n4\n5\n6\n7\n", "c2");
    commit_file(dir, "c.txt", "c\n", "c3");
    let engine = embedded_engine();

    let desc = engine.rebase(&repo, "main").await.unwrap();
    assert_eq!(desc.status, Status::Conflicted);
    assert_eq!(desc.applied.len(), 1);
    assert_eq!(desc.pending.len(), 1);

    engine.resolve_all(&repo, Side::Theirs).await.unwrap();
    let desc = engine.continue_operation(&repo).await.unwrap();
    assert_eq!(desc.status, Status::Completed);
    assert_eq!(desc.applied.len(), 3);
    assert_eq!(git(dir, &["log", "--format=%s", "-4"]), "c3\nc2\nc1\nmain edit");
    assert_eq!(git(dir, &["symbolic-ref", "--short", "HEAD"]), "feature");
}

#[tokio::test]
async fn test_resolve_errors_and_idempotence() {
    let (_temp, repo) = setup();
    diverge(repo.workdir());
    let engine = embedded_engine();
    engine.merge(&repo, "feature").await.unwrap();

    let err = engine
        .resolve(&repo, "missing.txt", &ResolutionPolicy::Ours)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownPath { .. }));

    let markers = b"<<<<<<< ours\na\n=======\nb\n>>>>>>> theirs\n".to_vec();
    let err = engine
        .resolve(&repo, "file.txt", &ResolutionPolicy::Manual(markers))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConflictMarkersRemain { .. }));

    for _ in 0..2 {
        engine
            .resolve(&repo, "./file.txt", &ResolutionPolicy::Ours)
            .await
            .unwrap();
        assert_eq!(read(&repo, "file.txt"), "1\n2\nmain3\nmain4\nmain5\n6\n7\n");
    }
    let conflicts = engine.list_conflicts(&repo).unwrap();
    assert_eq!(conflicts[0].resolution, Resolution::ResolvedOurs);
}

#[tokio::test]
async fn test_bisect_needs_subprocess() {
    let (_temp, repo) = setup();
    let engine = embedded_engine();
    let err = engine
        .bisect_start(&repo, "HEAD", &["HEAD~1".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unsupported { operation: Operation::BisectStart, .. }));
    let err = engine.continue_operation(&repo).await.unwrap_err();
    assert!(matches!(err, EngineError::NoOperationInProgress));
}

// =============================================================================
// Park store
// =============================================================================

#[tokio::test]
async fn test_park_and_resume_round_trip() {
    let (_temp, repo) = setup();
    let dir = repo.workdir();
    fs::write(dir.join("file.txt"), "edited\n").unwrap();
    fs::write(dir.join("new.txt"), "new\n").unwrap();
    let engine = embedded_engine();

    let entry = engine.park(&repo, Some("wip")).await.unwrap();
    assert_eq!(entry.label, "wip");
    assert_eq!(entry.branch.as_deref(), Some("main"));
    assert_eq!(read(&repo, "file.txt"), "1\n2\n3\n4\n5\n6\n7\n");
    assert!(!dir.join("new.txt").exists());

    let err = engine.park(&repo, Some("other")).await.unwrap_err();
    assert!(matches!(err, EngineError::NothingToPark));

    let desc = engine.resume(&repo, None, false).await.unwrap();
    assert_eq!(desc.kind, OperationKind::Unpark);
    assert_eq!(desc.status, Status::Completed);
    assert_eq!(read(&repo, "file.txt"), "edited\n");
    assert_eq!(read(&repo, "new.txt"), "new\n");
    assert!(engine.parks(&repo).unwrap().is_empty());
}

#[tokio::test]
async fn test_park_labels_and_drop() {
    let (_temp, repo) = setup();
    let dir = repo.workdir();
    let engine = embedded_engine();

    fs::write(dir.join("a.txt"), "a\n").unwrap();
    engine.park(&repo, Some("first")).await.unwrap();
    fs::write(dir.join("b.txt"), "b\n").unwrap();
    let err = engine.park(&repo, Some("first")).await.unwrap_err();
    assert!(matches!(err, EngineError::ParkLabelTaken { .. }));
    engine.park(&repo, Some("second")).await.unwrap();

    let labels: Vec<String> = engine
        .parks(&repo)
        .unwrap()
        .into_iter()
        .map(|p| p.label)
        .collect();
    assert_eq!(labels, vec!["second".to_string(), "first".to_string()]);

    let dropped = engine.drop_park(&repo, "1").await.unwrap();
    assert_eq!(dropped.label, "first");
    let err = engine.drop_park(&repo, "first").await.unwrap_err();
    assert!(matches!(err, EngineError::ParkEntryNotFound { .. }));

    let desc = engine.resume(&repo, Some("second"), true).await.unwrap();
    assert_eq!(desc.status, Status::Completed);
    assert_eq!(engine.parks(&repo).unwrap().len(), 1);
}
