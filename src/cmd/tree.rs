// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Worktree and submodule commands.

use crate::cli::tree::{SubmoduleArgs, SubmoduleSubcommand, WorktreeArgs, WorktreeSubcommand};
use crate::engine::Engine;
use crate::error::Result;
use crate::provider::WorktreeInfo;
use crate::repository::RepositoryHandle;

fn worktree_line(info: &WorktreeInfo) -> String {
    format!(
        "{:<40} {} [{}]",
        info.path.display(),
        info.head.as_ref().map_or("-------", |h| h.short()),
        info.branch.as_deref().unwrap_or("detached")
    )
}

/// Main handler for the worktree command.
///
/// # Errors
///
/// Returns an error without the subprocess provider or when git fails.
pub async fn run_worktree_command(
    args: &WorktreeArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    match &args.subcommand {
        WorktreeSubcommand::Add { path, branch } => {
            let info = engine.worktree_add(repo, path, branch.as_deref()).await?;
            println!("{}", worktree_line(&info));
        }
        WorktreeSubcommand::List => {
            for info in engine.worktree_list(repo).await? {
                println!("{}", worktree_line(&info));
            }
        }
        WorktreeSubcommand::Remove { path, force } => {
            engine.worktree_remove(repo, path, *force).await?;
            println!("removed {}", path.display());
        }
    }
    Ok(())
}

/// Main handler for the submodule command.
///
/// # Errors
///
/// Returns an error without the subprocess provider or when git fails.
pub async fn run_submodule_command(
    args: &SubmoduleArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    match &args.subcommand {
        SubmoduleSubcommand::Add { url, path } => {
            engine.submodule_add(repo, url, path).await?;
            println!("added submodule {path}");
        }
        SubmoduleSubcommand::Update { init } => {
            engine.submodule_update(repo, *init).await?;
        }
        SubmoduleSubcommand::List => {
            for sub in engine.submodule_list(repo).await? {
                let state = if sub.initialized { ' ' } else { '-' };
                let commit = sub.commit.as_ref().map_or("-------", |c| c.short());
                println!("{state}{commit} {}", sub.path);
            }
        }
    }
    Ok(())
}
