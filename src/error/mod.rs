// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//! anyhow::Result at the command layer; typed errors below it:
//!
//!   Engine   Unsupported, ProviderMismatch, OperationInProgress,
//!            UnresolvedConflicts, RepositoryBusy, CorruptState, ...
//!   Provider Unsupported, CommandFailed, Timeout, Interrupted, Backend
//!   Process  SpawnFailed, NonZeroExit, Timeout
//!   Config   MissingKey, InvalidValue
//!   Network  HttpError, Reqwest, InvalidUrl, InvalidResponse
//!
//! ProcessError -> ProviderError -> EngineError::ProviderExecutionFailed
//! ```

use thiserror::Error;

use crate::provider::{Operation, OperationKind, ProviderKind};

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`EngineError`].
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Result type using [`ProviderError`].
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// --- Gix Errors ---

/// Wrapper for gix errors raised while locating or opening a repository.
///
/// Large error types are boxed to keep enum size manageable.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to open repository.
    #[error("failed to open repository: {0}")]
    Open(#[from] Box<gix::open::Error>),

    /// Failed to initialize a repository.
    #[error("failed to initialize repository: {0}")]
    Init(#[from] Box<gix::init::Error>),

    /// Repository has no worktree (bare repository).
    #[error("repository has no worktree (bare repository)")]
    BareRepository,
}

// --- Engine Errors ---

/// Errors surfaced by the hybrid operation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No available provider can perform the operation.
    #[error("operation '{operation}' is not supported: {reason}")]
    Unsupported { operation: Operation, reason: String },

    /// The pinned provider differs from the one that owns the active lifecycle.
    #[error(
        "operation '{operation}' must run on the {owner} provider that started it, not {requested}"
    )]
    ProviderMismatch {
        operation: Operation,
        requested: ProviderKind,
        owner: ProviderKind,
    },

    /// A multi-step operation is already active.
    #[error("a {kind} operation is already in progress ({id})")]
    OperationInProgress { kind: OperationKind, id: String },

    /// `continue`/`abort` called while idle.
    #[error("no operation in progress")]
    NoOperationInProgress,

    /// Another process holds the repository lock.
    #[error("repository is busy: lock {path} held for more than {waited_ms} ms")]
    RepositoryBusy { path: String, waited_ms: u64 },

    /// `continue` requested while conflicts remain.
    #[error("unresolved conflicts remain: {}", paths.join(", "))]
    UnresolvedConflicts { paths: Vec<String> },

    /// Resolution requested for a path without a conflict record.
    #[error("no conflict recorded for '{path}'")]
    UnknownPath { path: String },

    /// Manual resolution content still contains conflict markers.
    #[error("resolution for '{path}' still contains conflict markers")]
    ConflictMarkersRemain { path: String },

    /// The working tree must be clean for this operation.
    #[error("working tree has uncommitted changes: {}; commit or park them first", paths.join(", "))]
    DirtyWorkingTree { paths: Vec<String> },

    /// The selected provider failed.
    #[error("{provider} provider failed during '{operation}': {source}")]
    ProviderExecutionFailed {
        provider: ProviderKind,
        operation: Operation,
        #[source]
        source: ProviderError,
    },

    /// A step was cancelled or timed out; the operation is still resumable.
    #[error("'{operation}' was interrupted; run continue to resume or abort to roll back")]
    Interrupted { operation: Operation },

    /// The persisted operation record could not be read.
    #[error("corrupt operation state at {path}: {message}")]
    CorruptState { path: String, message: String },

    /// No park entry matches the selector.
    #[error("no park entry matches '{selector}'")]
    ParkEntryNotFound { selector: String },

    /// Park labels are unique.
    #[error("a park entry named '{label}' already exists")]
    ParkLabelTaken { label: String },

    /// Nothing uncommitted to park.
    #[error("no local changes to park")]
    NothingToPark,

    /// Path is not inside a git repository.
    #[error("not a git repository: {path}")]
    NotARepository { path: String },

    /// Failure reading or writing engine metadata.
    #[error("metadata i/o failed on '{path}': {source}")]
    Metadata {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// --- Provider Errors ---

/// Errors reported by a capability provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider does not declare this operation.
    #[error("{provider} provider does not support '{operation}'")]
    Unsupported {
        provider: ProviderKind,
        operation: Operation,
    },

    /// A git command exited unsuccessfully.
    #[error("`{command}` exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// A git command exceeded its time budget.
    #[error("`{command}` timed out after {timeout_secs} seconds")]
    Timeout { command: String, timeout_secs: u64 },

    /// A git command was cancelled.
    #[error("`{command}` was interrupted")]
    Interrupted { command: String },

    /// Revision, blob or reference lookup failed.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Commit requested with nothing staged.
    #[error("nothing to commit")]
    NothingToCommit,

    /// Repository could not be opened.
    #[error(transparent)]
    Gix(#[from] GixError),

    /// Object database or reference backend failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// Working tree I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Wraps any displayable backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    /// True for failures that leave an operation resumable.
    #[must_use]
    pub const fn is_interruption(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Interrupted { .. })
    }
}

impl From<ProcessError> for ProviderError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NonZeroExit {
                command,
                code,
                stderr,
            } => Self::CommandFailed {
                command,
                code,
                stderr,
            },
            ProcessError::Timeout {
                command,
                timeout_secs,
            } => Self::Timeout {
                command,
                timeout_secs,
            },
            ProcessError::Interrupted { command } => Self::Interrupted { command },
            ProcessError::SpawnFailed { source, .. } => Self::Io(source),
            other => Self::Backend(other.to_string()),
        }
    }
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with a code outside the accepted set.
    #[error("process '{command}' exited with code {code}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Process timed out.
    #[error("process '{command}' timed out after {timeout_secs} seconds")]
    Timeout { command: String, timeout_secs: u64 },

    /// Process was cancelled through its token.
    #[error("process '{command}' was interrupted")]
    Interrupted { command: String },

    /// Failed to read process output.
    #[error("failed to read output from process '{command}': {message}")]
    OutputError { command: String, message: String },
}

// --- Network Errors ---

/// Network operation errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP error response.
    #[error("http error {status}: {url}")]
    HttpError { status: u16, url: String },

    /// Error from reqwest library.
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The API answered with a body we could not interpret.
    #[error("unexpected response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

#[cfg(test)]
mod tests;
