// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Everyday repository commands.

use anyhow::Context;
use tracing::info;

use super::render;
use crate::cli::repo::{
    BranchArgs, BranchSubcommand, CloneArgs, CommitArgs, DiffArgs, InitArgs, StageArgs,
};
use crate::engine::Engine;
use crate::error::Result;
use crate::provider::CloneOptions;
use crate::repository::RepositoryHandle;

/// Creates a repository.
///
/// # Errors
///
/// Returns an error if the directory cannot be initialized.
pub async fn run_init_command(args: &InitArgs, engine: &Engine) -> Result<()> {
    let repo = engine
        .init(&args.path)
        .await
        .with_context(|| format!("failed to initialize '{}'", args.path.display()))?;
    println!("Initialized repository in {}", repo.git_dir().display());
    Ok(())
}

/// Clones a repository.
///
/// # Errors
///
/// Returns an error if the clone fails.
pub async fn run_clone_command(args: &CloneArgs, engine: &Engine) -> Result<()> {
    let dest = args.destination();
    let options = CloneOptions {
        branch: args.branch.clone(),
    };
    let repo = engine
        .clone_repo(&args.url, &dest, &options)
        .await
        .with_context(|| format!("failed to clone '{}'", args.url))?;
    info!(url = %args.url, dest = %repo.workdir().display(), "cloned");
    println!("Cloned into {}", repo.workdir().display());
    Ok(())
}

/// Shows HEAD, changed paths and the active operation.
///
/// # Errors
///
/// Returns an error if the repository cannot be read.
pub async fn run_status_command(engine: &Engine, repo: &RepositoryHandle) -> Result<()> {
    let head = engine.head(repo).await?;
    println!("{}", render::head_line(&head));

    if let Some(active) = engine.active(repo)? {
        for line in render::operation_lines(&active) {
            println!("{line}");
        }
    }

    let status = engine.status(repo).await?;
    if status.is_clean() {
        println!("nothing to commit, working tree clean");
    } else {
        for line in render::status_lines(&status) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Lists, creates or switches branches.
///
/// # Errors
///
/// Returns an error if the branch operation fails.
pub async fn run_branch_command(
    args: &BranchArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    match args.subcommand.as_ref().unwrap_or(&BranchSubcommand::List) {
        BranchSubcommand::List => {
            for branch in engine.list_branches(repo).await? {
                println!("{}", render::branch_line(&branch));
            }
        }
        BranchSubcommand::Create { name, start } => {
            let commit = engine
                .create_branch(repo, name, start.as_deref())
                .await
                .with_context(|| format!("failed to create branch '{name}'"))?;
            println!("Created branch {name} at {}", commit.short());
        }
        BranchSubcommand::Switch { name } => {
            engine
                .switch_branch(repo, name)
                .await
                .with_context(|| format!("failed to switch to '{name}'"))?;
            println!("Switched to branch {name}");
        }
    }
    Ok(())
}

/// Stages paths.
///
/// # Errors
///
/// Returns an error if staging fails.
pub async fn run_stage_command(
    args: &StageArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    let staged = engine.stage(repo, &args.pathspecs).await?;
    if staged.is_empty() {
        anyhow::bail!("no paths match {}", args.pathspecs.join(" "));
    }
    for path in &staged {
        println!("staged {path}");
    }
    Ok(())
}

/// Commits the index.
///
/// # Errors
///
/// Returns an error if nothing is staged or the commit fails.
pub async fn run_commit_command(
    args: &CommitArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    let commit = engine.commit(repo, &args.message).await?;
    let subject = args.message.lines().next().unwrap_or_default();
    println!("[{}] {subject}", commit.short());
    Ok(())
}

/// Lists changed paths.
///
/// # Errors
///
/// Returns an error if a revision cannot be resolved.
pub async fn run_diff_command(
    args: &DiffArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    for entry in engine.diff(repo, &args.from, args.to.as_deref()).await? {
        println!("{}", render::diff_line(&entry));
    }
    Ok(())
}
