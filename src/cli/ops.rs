// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the multi-step operations and conflict fixing.
//!
//! ```text
//! merge TARGET
//! rebase UPSTREAM [-i --todo FILE]
//! cherry-pick COMMIT...
//! bisect {start BAD GOOD... | good [REV] | bad [REV] | skip [REV] | reset}
//! fix {list | ours [PATH...] | theirs [PATH...] | manual PATH [--from FILE]}
//! ```

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the `merge` command.
#[derive(Debug, Clone, Args)]
pub struct MergeArgs {
    /// Branch or commit to merge into the current branch.
    pub target: String,
}

/// Arguments for the `rebase` command.
#[derive(Debug, Clone, Args)]
pub struct RebaseArgs {
    /// Upstream the current branch is replayed onto.
    pub upstream: String,

    /// Runs an interactive rebase driven by a todo list.
    #[arg(short = 'i', long, requires = "todo")]
    pub interactive: bool,

    /// Todo list in git's rebase format.
    #[arg(long, value_name = "FILE", requires = "interactive")]
    pub todo: Option<PathBuf>,
}

/// Arguments for the `cherry-pick` command.
#[derive(Debug, Clone, Args)]
pub struct CherryPickArgs {
    /// Commits to apply, in order.
    #[arg(required = true, value_name = "COMMIT")]
    pub commits: Vec<String>,
}

/// Arguments for the `bisect` command.
#[derive(Debug, Clone, Args)]
pub struct BisectArgs {
    #[command(subcommand)]
    pub subcommand: BisectSubcommand,
}

/// Bisect subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum BisectSubcommand {
    /// Starts a session between a bad and one or more good revisions.
    Start {
        /// Known bad revision.
        bad: String,
        /// Known good revisions.
        #[arg(required = true)]
        good: Vec<String>,
    },

    /// Marks the current (or given) revision good.
    Good { rev: Option<String> },

    /// Marks the current (or given) revision bad.
    Bad { rev: Option<String> },

    /// Skips the current (or given) revision.
    Skip { rev: Option<String> },

    /// Ends the session and returns to the original branch.
    Reset,
}

/// Arguments for the `fix` command.
#[derive(Debug, Clone, Args)]
pub struct FixArgs {
    #[command(subcommand)]
    pub subcommand: FixSubcommand,
}

/// Conflict fixing subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum FixSubcommand {
    /// Lists conflicted paths of the active operation.
    List,

    /// Takes our side for the given paths (all unresolved when none).
    Ours {
        #[arg(value_name = "PATH")]
        paths: Vec<String>,
    },

    /// Takes their side for the given paths (all unresolved when none).
    Theirs {
        #[arg(value_name = "PATH")]
        paths: Vec<String>,
    },

    /// Accepts hand-edited content for a path.
    Manual {
        /// Conflicted path.
        path: String,
        /// File holding the final content, the working-tree file when omitted.
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,
    },
}
