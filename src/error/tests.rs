// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{ConfigError, EngineError, GixError, ProcessError, ProviderError};
use crate::provider::{Operation, ProviderKind};

#[test]
fn test_config_error_display() {
    let err = ConfigError::MissingKey {
        section: "collab".to_string(),
        key: "repository".to_string(),
    };
    insta::assert_snapshot!(err.to_string(), @"missing required config key 'repository' in section '[collab]'");
}

#[test]
fn test_unresolved_conflicts_lists_paths() {
    let err = EngineError::UnresolvedConflicts {
        paths: vec!["a.txt".to_string(), "src/b.rs".to_string()],
    };
    insta::assert_snapshot!(err.to_string(), @"unresolved conflicts remain: a.txt, src/b.rs");
}

#[test]
fn test_provider_mismatch_display() {
    let err = EngineError::ProviderMismatch {
        operation: Operation::ContinueActive,
        requested: ProviderKind::Embedded,
        owner: ProviderKind::Subprocess,
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"operation 'continue' must run on the subprocess provider that started it, not embedded"
    );
}

#[test]
fn test_process_error_maps_to_provider_error() {
    let timeout = ProviderError::from(ProcessError::Timeout {
        command: "git merge".to_string(),
        timeout_secs: 3,
    });
    assert!(timeout.is_interruption());

    let failed = ProviderError::from(ProcessError::NonZeroExit {
        command: "git merge".to_string(),
        code: 128,
        stderr: "fatal: bad revision".to_string(),
    });
    assert!(!failed.is_interruption());
    assert!(matches!(failed, ProviderError::CommandFailed { code: 128, .. }));
}

#[test]
fn test_interrupted_process_stays_resumable() {
    let err = ProviderError::from(ProcessError::Interrupted {
        command: "git rebase --continue".to_string(),
    });
    assert!(err.is_interruption());
    insta::assert_snapshot!(err.to_string(), @"`git rebase --continue` was interrupted");
}

#[test]
fn test_bare_repository_is_transparent() {
    let err = ProviderError::from(GixError::BareRepository);
    assert_eq!(err.to_string(), "repository has no worktree (bare repository)");
    assert!(!err.is_interruption());
}

#[test]
fn test_dirty_tree_suggests_commit_or_park() {
    let err = EngineError::DirtyWorkingTree {
        paths: vec!["file.txt".to_string(), "notes.txt".to_string()],
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"working tree has uncommitted changes: file.txt, notes.txt; commit or park them first"
    );
}
