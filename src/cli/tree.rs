// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Worktree and submodule command arguments.

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the `worktree` command.
#[derive(Debug, Clone, Args)]
pub struct WorktreeArgs {
    #[command(subcommand)]
    pub subcommand: WorktreeSubcommand,
}

/// Worktree subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum WorktreeSubcommand {
    /// Adds a linked worktree.
    Add {
        path: PathBuf,
        /// Branch to check out (created when missing).
        #[arg(short = 'b', long)]
        branch: Option<String>,
    },

    /// Lists worktrees.
    List,

    /// Removes a linked worktree.
    Remove {
        path: PathBuf,
        /// Removes it even with local changes.
        #[arg(short = 'f', long)]
        force: bool,
    },
}

/// Arguments for the `submodule` command.
#[derive(Debug, Clone, Args)]
pub struct SubmoduleArgs {
    #[command(subcommand)]
    pub subcommand: SubmoduleSubcommand,
}

/// Submodule subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum SubmoduleSubcommand {
    /// Adds a submodule.
    Add { url: String, path: String },

    /// Updates submodules to their recorded commits.
    Update {
        /// Initializes submodules first.
        #[arg(long)]
        init: bool,
    },

    /// Lists registered submodules.
    List,
}
