// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Plain data exchanged between the engine and providers.
//!
//! Everything here is serializable: the engine persists steps, conflict
//! records and park payloads verbatim in the metadata store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{ProviderError, ProviderResult};

/// Hex object id as stored in metadata.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Oid(String);

impl Oid {
    /// Wraps a hex id, normalizing to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `hex` is not a full-length hex object id.
    pub fn parse(hex: &str) -> ProviderResult<Self> {
        let hex = hex.trim();
        if matches!(hex.len(), 40 | 64) && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(hex.to_ascii_lowercase()))
        } else {
            Err(ProviderError::NotFound {
                what: format!("object id '{hex}'"),
            })
        }
    }

    /// Full hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(7)]
    }

    /// Converts to a gix object id.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the stored hex is malformed.
    pub fn to_object_id(&self) -> ProviderResult<gix::ObjectId> {
        gix::ObjectId::from_hex(self.0.as_bytes()).map_err(ProviderError::backend)
    }
}

impl From<gix::ObjectId> for Oid {
    fn from(id: gix::ObjectId) -> Self {
        Self(id.to_hex().to_string())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Multi-step operation kinds governed by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Merge,
    Rebase,
    CherryPick,
    Bisect,
    Unpark,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Merge => "merge",
            Self::Rebase => "rebase",
            Self::CherryPick => "cherry-pick",
            Self::Bisect => "bisect",
            Self::Unpark => "unpark",
        })
    }
}

/// One queued unit of work of a multi-step operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Merge `commit` (named `target`) into HEAD.
    Merge { target: String, commit: Oid },
    /// Replay one commit of a rebase onto the detached HEAD.
    Replay { commit: Oid },
    /// Apply one commit on top of HEAD.
    Pick { commit: Oid },
    /// Apply a park payload to the working tree.
    Unpark { payload: ParkPayload },
}

impl Step {
    /// Commit this step applies, if any.
    #[must_use]
    pub const fn commit(&self) -> Option<&Oid> {
        match self {
            Self::Merge { commit, .. } | Self::Replay { commit } | Self::Pick { commit } => {
                Some(commit)
            }
            Self::Unpark { payload } => Some(&payload.commit),
        }
    }
}

/// Result of executing one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step applied; `commit` is the new commit, `None` when nothing had
    /// to be committed (up to date, empty replay, worktree-only apply).
    Clean { commit: Option<Oid> },
    /// The step stopped with conflicts. An empty list means a provider-native
    /// sequencer paused without conflicts (for example an `edit` todo line).
    Conflicted(Vec<ConflictRecord>),
}

/// Kind of a conflicted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    /// Both sides changed overlapping lines.
    Content,
    /// Both sides added the path with different content.
    AddAdd,
    /// One side modified the path, the other deleted it.
    ModifyDelete,
    /// Non-text content that cannot be merged line-wise.
    Binary,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Content => "content",
            Self::AddAdd => "add/add",
            Self::ModifyDelete => "modify/delete",
            Self::Binary => "binary",
        })
    }
}

/// Resolution state of a conflicted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    #[default]
    Unresolved,
    ResolvedOurs,
    ResolvedTheirs,
    ResolvedManual,
}

impl Resolution {
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unresolved => "unresolved",
            Self::ResolvedOurs => "ours",
            Self::ResolvedTheirs => "theirs",
            Self::ResolvedManual => "manual",
        })
    }
}

/// Byte range of one conflict-marker block in a working-tree file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub start: usize,
    pub end: usize,
}

/// One conflicted path of the active operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub path: String,
    pub kind: ConflictKind,
    #[serde(default)]
    pub hunks: Vec<Hunk>,
    pub base: Option<Oid>,
    pub ours: Option<Oid>,
    pub theirs: Option<Oid>,
    #[serde(default)]
    pub resolution: Resolution,
}

impl ConflictRecord {
    /// A fresh unresolved record.
    #[must_use]
    pub const fn new(
        path: String,
        kind: ConflictKind,
        base: Option<Oid>,
        ours: Option<Oid>,
        theirs: Option<Oid>,
    ) -> Self {
        Self {
            path,
            kind,
            hunks: Vec::new(),
            base,
            ours,
            theirs,
            resolution: Resolution::Unresolved,
        }
    }

    /// Attaches marker ranges found in `content`.
    #[must_use]
    pub fn with_hunks_from(mut self, content: &[u8]) -> Self {
        self.hunks = super::markers::scan_markers(content);
        self
    }
}

/// Commits a rebase will replay, oldest first, and where they land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebasePlan {
    pub onto: Oid,
    pub commits: Vec<Oid>,
}

/// Repository position to restore on abort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorePoint {
    /// Branch HEAD was attached to, `None` when detached.
    pub branch: Option<String>,
    pub head: Oid,
    /// Set when a provider-native sequencer must be aborted as well.
    #[serde(default)]
    pub native: Option<OperationKind>,
}

/// Opaque handle to a parked snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkPayload {
    /// Unique id, also the last component of `reference`.
    pub id: String,
    /// Reference keeping the snapshot commit reachable.
    pub reference: String,
    /// Snapshot commit.
    pub commit: Oid,
}

/// Namespace holding park snapshot references.
pub const PARK_REF_PREFIX: &str = "refs/gitduo/park/";

impl ParkPayload {
    /// Reference name for a park id.
    #[must_use]
    pub fn reference_for(id: &str) -> String {
        format!("{PARK_REF_PREFIX}{id}")
    }
}

/// Where HEAD points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadState {
    /// Short branch name, `None` when detached.
    pub branch: Option<String>,
    /// Commit, `None` on an unborn branch.
    pub commit: Option<Oid>,
}

impl HeadState {
    /// Commit id or a `NotFound` error on an unborn branch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when HEAD has no commit yet.
    pub fn require_commit(&self) -> ProviderResult<&Oid> {
        self.commit.as_ref().ok_or_else(|| ProviderError::NotFound {
            what: "HEAD commit (branch has no commits yet)".to_string(),
        })
    }
}

/// Change classification used by status and diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    TypeChanged,
}

impl ChangeKind {
    /// Single-letter status code.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::TypeChanged => 'T',
        }
    }

    /// Parses git's name-status letter.
    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(Self::Added),
            'M' => Some(Self::Modified),
            'D' => Some(Self::Deleted),
            'T' => Some(Self::TypeChanged),
            _ => None,
        }
    }
}

/// A path with a change classification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StatusEntry {
    pub path: String,
    pub kind: ChangeKind,
}

/// Working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorktreeStatus {
    /// Index vs HEAD.
    pub staged: Vec<StatusEntry>,
    /// Working tree vs index.
    pub unstaged: Vec<StatusEntry>,
    /// Non-ignored files unknown to the index.
    pub untracked: Vec<String>,
    /// Paths with unmerged index entries.
    pub conflicted: Vec<String>,
}

impl WorktreeStatus {
    /// True when nothing is staged, modified, untracked or conflicted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.unstaged.is_empty()
            && self.untracked.is_empty()
            && self.conflicted.is_empty()
    }

    /// Every path that makes the tree dirty, sorted and deduplicated.
    #[must_use]
    pub fn dirty_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .staged
            .iter()
            .chain(&self.unstaged)
            .map(|e| e.path.clone())
            .chain(self.untracked.iter().cloned())
            .chain(self.conflicted.iter().cloned())
            .collect();
        paths.sort_unstable();
        paths.dedup();
        paths
    }

    pub(crate) fn normalize(&mut self) {
        self.staged.sort();
        self.staged.dedup();
        self.unstaged.sort();
        self.unstaged.dedup();
        self.untracked.sort_unstable();
        self.untracked.dedup();
        self.conflicted.sort_unstable();
        self.conflicted.dedup();
    }
}

/// A local branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub name: String,
    pub commit: Oid,
    pub current: bool,
}

/// One changed path between two revisions.
pub type DiffEntry = StatusEntry;

/// Clone parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Branch to check out instead of the remote HEAD.
    pub branch: Option<String>,
}

/// Verdict recorded for a bisect candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BisectMark {
    Good,
    Bad,
    Skip,
}

impl fmt::Display for BisectMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "good",
            Self::Bad => "bad",
            Self::Skip => "skip",
        })
    }
}

/// State of a bisect session after a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BisectOutcome {
    /// Commit checked out for testing.
    pub current: Option<Oid>,
    /// First bad commit once found.
    pub culprit: Option<Oid>,
    /// Estimated revisions left to test.
    pub remaining: Option<u32>,
}

/// A linked or main worktree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub head: Option<Oid>,
    pub branch: Option<String>,
}

/// A registered submodule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmoduleInfo {
    pub path: String,
    pub commit: Option<Oid>,
    pub initialized: bool,
}
