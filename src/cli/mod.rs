// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for gitduo using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! duo [global options] <command>
//! init | clone | status | branch | stage | commit | diff
//! merge | rebase | cherry-pick | bisect
//! continue | abort | fix
//! park {save|list|resume|drop}
//! worktree | submodule
//! pr {create|list|checkout|review}
//! options | inis | version
//! ```

pub mod global;
pub mod ops;
pub mod park;
pub mod pr;
pub mod repo;
pub mod tree;


use crate::cli::global::GlobalOptions;
use crate::cli::ops::{BisectArgs, CherryPickArgs, FixArgs, MergeArgs, RebaseArgs};
use crate::cli::park::ParkArgs;
use crate::cli::pr::PrArgs;
use crate::cli::repo::{BranchArgs, CloneArgs, CommitArgs, DiffArgs, InitArgs, StageArgs};
use crate::cli::tree::{SubmoduleArgs, WorktreeArgs};
use clap::{Parser, Subcommand};

/// Hybrid Git Workflow Engine
///
/// A git front end whose multi-step operations survive interruptions.
#[derive(Debug, Parser)]
#[command(
    name = "duo",
    author,
    version,
    about = "Hybrid Git Workflow Engine",
    long_about = "gitduo Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Runs git operations through an embedded library where it can\n\
                  and through the git binary where it must. Merges, rebases,\n\
                  cherry-picks and resumes are recorded under .git/gitduo so\n\
                  `duo continue` and `duo abort` work after a crash.",
    after_help = "CONFIG FILES:\n\n\
                  duo reads ~/.config/gitduo/gitduo.toml, then gitduo.toml in the\n\
                  current directory, then every --ini file, then DUO_* environment\n\
                  variables (DUO_ENGINE__PROVIDER=subprocess). Later sources win.\n\
                  Use --no-default-inis to only load --ini files."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the config files used by duo.
    Inis,

    /// Creates a repository.
    Init(InitArgs),

    /// Clones a repository.
    Clone(CloneArgs),

    /// Shows the working tree status and the active operation.
    Status,

    /// Lists, creates or switches branches.
    Branch(BranchArgs),

    /// Stages paths.
    Stage(StageArgs),

    /// Records staged changes.
    Commit(CommitArgs),

    /// Lists changed paths between revisions.
    Diff(DiffArgs),

    /// Merges a branch into the current branch.
    Merge(MergeArgs),

    /// Replays the current branch onto an upstream.
    Rebase(RebaseArgs),

    /// Applies commits on top of HEAD.
    #[command(name = "cherry-pick")]
    CherryPick(CherryPickArgs),

    /// Binary search for the commit that introduced a bug.
    Bisect(BisectArgs),

    /// Resumes the active operation after conflicts are fixed.
    Continue,

    /// Rolls the active operation back.
    Abort,

    /// Lists and resolves conflicts.
    Fix(FixArgs),

    /// Parks and resumes uncommitted work.
    Park(ParkArgs),

    /// Manages linked worktrees.
    Worktree(WorktreeArgs),

    /// Manages submodules.
    Submodule(SubmoduleArgs),

    /// Works with pull requests.
    Pr(PrArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
