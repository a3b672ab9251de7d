// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the everyday repository commands.
//!
//! ```text
//! init [PATH]
//! clone URL [DEST] [-b BRANCH]
//! status
//! branch [list | create NAME [START] | switch NAME]
//! stage PATHSPEC...
//! commit -m MESSAGE
//! diff [FROM] [TO]
//! ```

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the `init` command.
#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    /// Directory to create the repository in.
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

/// Arguments for the `clone` command.
#[derive(Debug, Clone, Args)]
pub struct CloneArgs {
    /// Repository to clone.
    pub url: String,

    /// Destination directory, derived from the URL when omitted.
    #[arg(value_name = "DEST")]
    pub dest: Option<PathBuf>,

    /// Branch to check out instead of the remote HEAD.
    #[arg(short = 'b', long)]
    pub branch: Option<String>,
}

impl CloneArgs {
    /// Destination directory: `dest`, or the last URL component without `.git`.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }
        let tail = self
            .url
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .unwrap_or_default();
        let name = tail.strip_suffix(".git").unwrap_or(tail);
        PathBuf::from(if name.is_empty() { "repository" } else { name })
    }
}

/// Arguments for the `branch` command.
#[derive(Debug, Clone, Args)]
pub struct BranchArgs {
    /// Branch subcommand, `list` when omitted.
    #[command(subcommand)]
    pub subcommand: Option<BranchSubcommand>,
}

/// Branch subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum BranchSubcommand {
    /// Lists local branches.
    List,

    /// Creates a branch.
    Create {
        /// New branch name.
        name: String,
        /// Start point, HEAD when omitted.
        start: Option<String>,
    },

    /// Checks out a branch.
    Switch {
        /// Branch to check out.
        name: String,
    },
}

/// Arguments for the `stage` command.
#[derive(Debug, Clone, Args)]
pub struct StageArgs {
    /// Paths, directories or glob patterns.
    #[arg(required = true, value_name = "PATHSPEC")]
    pub pathspecs: Vec<String>,
}

/// Arguments for the `commit` command.
#[derive(Debug, Clone, Args)]
pub struct CommitArgs {
    /// Commit message.
    #[arg(short = 'm', long, required = true)]
    pub message: String,
}

/// Arguments for the `diff` command.
#[derive(Debug, Clone, Args)]
pub struct DiffArgs {
    /// Base revision.
    #[arg(default_value = "HEAD")]
    pub from: String,

    /// Revision to compare with, the working tree when omitted.
    pub to: Option<String>,
}
