// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persisted operation record.
//!
//! ```text
//! Idle --begin--> Running --step--> Running ... --last step--> Completed
//!                    |                                            |
//!                    +--conflict--> Conflicted --continue--> Running
//!                    |                  |
//!                    +------abort-------+-----------------> Aborted
//!
//! Completed / Aborted descriptors move from `active` to `history`.
//! ```

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::{
    BisectOutcome, ConflictRecord, HeadState, Oid, OperationKind, ParkPayload, ProviderKind,
    RestorePoint, Step,
};

/// Current on-disk format.
pub const STATE_VERSION: u32 = 1;

/// Lifecycle position of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Running,
    Conflicted,
    Completed,
    Aborted,
}

impl Status {
    /// Completed and Aborted descriptors never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Conflicted => "conflicted",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        })
    }
}

/// Who sequences the steps of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// The engine pops `pending` one step at a time.
    #[default]
    Engine,
    /// A provider-native sequencer (interactive rebase, bisect) keeps the queue.
    Native,
}

/// Park entry being resumed by an `Unpark` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkContext {
    pub label: String,
    /// Keep the entry after a successful resume.
    pub keep: bool,
}

/// One multi-step operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub id: String,
    pub kind: OperationKind,
    pub provider: ProviderKind,
    pub targets: Vec<String>,
    pub orig_branch: Option<String>,
    pub orig_head: Oid,
    #[serde(default)]
    pub onto: Option<Oid>,
    #[serde(default)]
    pub pending: VecDeque<Step>,
    /// Step stopped on conflicts, committed by `continue`.
    #[serde(default)]
    pub current: Option<Step>,
    #[serde(default)]
    pub applied: Vec<Oid>,
    #[serde(default)]
    pub driver: Driver,
    pub status: Status,
    #[serde(default)]
    pub conflicts: Vec<ConflictRecord>,
    #[serde(default)]
    pub park: Option<ParkContext>,
    #[serde(default)]
    pub bisect: Option<BisectOutcome>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OperationDescriptor {
    /// A Running descriptor anchored at `head`.
    #[must_use]
    pub fn new(
        kind: OperationKind,
        provider: ProviderKind,
        targets: Vec<String>,
        head: &HeadState,
        orig_head: Oid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{kind}-{}", now.format("%Y%m%d%H%M%S%3f")),
            kind,
            provider,
            targets,
            orig_branch: head.branch.clone(),
            orig_head,
            onto: None,
            pending: VecDeque::new(),
            current: None,
            applied: Vec::new(),
            driver: Driver::Engine,
            status: Status::Running,
            conflicts: Vec::new(),
            park: None,
            bisect: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Where `abort` returns the repository to.
    #[must_use]
    pub fn restore_point(&self) -> RestorePoint {
        let native = match (self.driver, self.kind) {
            (Driver::Native, OperationKind::Bisect) => Some(OperationKind::Bisect),
            (Driver::Native, _) => Some(OperationKind::Rebase),
            (Driver::Engine, _) => None,
        };
        RestorePoint {
            branch: self.orig_branch.clone(),
            head: self.orig_head.clone(),
            native,
        }
    }

    /// Moves to `status` and stamps `updated_at`.
    pub fn transition(&mut self, status: Status) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Paths whose records are still unresolved.
    #[must_use]
    pub fn unresolved_paths(&self) -> Vec<String> {
        self.conflicts
            .iter()
            .filter(|r| !r.resolution.is_resolved())
            .map(|r| r.path.clone())
            .collect()
    }

    /// Record for `path`.
    pub fn conflict_mut(&mut self, path: &str) -> Option<&mut ConflictRecord> {
        self.conflicts.iter_mut().find(|r| r.path == path)
    }
}

/// A named snapshot of uncommitted work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkEntry {
    pub label: String,
    pub created_at: DateTime<Utc>,
    /// Commit the work was parked against.
    pub base: Oid,
    pub branch: Option<String>,
    pub provider: ProviderKind,
    pub payload: ParkPayload,
}

/// Everything the engine persists for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    pub version: u32,
    #[serde(default)]
    pub active: Option<OperationDescriptor>,
    /// Most recent first.
    #[serde(default)]
    pub parks: Vec<ParkEntry>,
    /// Finished operations, most recent first.
    #[serde(default)]
    pub history: Vec<OperationDescriptor>,
}

impl Default for RepoState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            active: None,
            parks: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl RepoState {
    /// Moves the active descriptor into history, keeping at most `limit`.
    pub fn archive(&mut self, limit: usize) -> Option<OperationDescriptor> {
        let finished = self.active.take()?;
        self.history.insert(0, finished.clone());
        self.history.truncate(limit);
        Some(finished)
    }

    /// Index of the park entry named by `selector`.
    ///
    /// A selector is a label, or a position in the most-recent-first list.
    /// Labels win over positions.
    #[must_use]
    pub fn find_park(&self, selector: &str) -> Option<usize> {
        self.parks
            .iter()
            .position(|p| p.label == selector)
            .or_else(|| {
                selector
                    .parse::<usize>()
                    .ok()
                    .filter(|i| *i < self.parks.len())
            })
    }
}
