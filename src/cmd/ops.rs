// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Multi-step operations, lifecycle control and conflict fixing.

use anyhow::Context;

use super::{render, report};
use crate::cli::ops::{
    BisectArgs, BisectSubcommand, CherryPickArgs, FixArgs, FixSubcommand, MergeArgs, RebaseArgs,
};
use crate::engine::state::OperationDescriptor;
use crate::engine::{Engine, ResolutionPolicy, Side};
use crate::error::Result;
use crate::provider::BisectMark;
use crate::repository::RepositoryHandle;

/// Merges a branch into the current branch.
///
/// # Errors
///
/// Returns an error if the merge cannot start or stops on conflicts.
pub async fn run_merge_command(
    args: &MergeArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    report(&engine.merge(repo, &args.target).await?)
}

/// Rebases the current branch, interactively when a todo list is given.
///
/// # Errors
///
/// Returns an error if the todo file is unreadable, the rebase cannot start,
/// or it stops on conflicts.
pub async fn run_rebase_command(
    args: &RebaseArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    let desc = match &args.todo {
        Some(todo) if args.interactive => {
            let todo = tokio::fs::read_to_string(todo)
                .await
                .with_context(|| format!("failed to read todo list '{}'", todo.display()))?;
            engine.interactive_rebase(repo, &args.upstream, &todo).await?
        }
        _ => engine.rebase(repo, &args.upstream).await?,
    };
    report(&desc)
}

/// Applies commits on top of HEAD.
///
/// # Errors
///
/// Returns an error if the cherry-pick cannot start or stops on conflicts.
pub async fn run_cherry_pick_command(
    args: &CherryPickArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    report(&engine.cherry_pick(repo, &args.commits).await?)
}

/// Drives a bisect session.
///
/// # Errors
///
/// Returns an error without a bisect-capable provider or session.
pub async fn run_bisect_command(
    args: &BisectArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    let (mark, rev) = match &args.subcommand {
        BisectSubcommand::Start { bad, good } => {
            let desc = engine.bisect_start(repo, bad, good).await?;
            print_bisect(&desc);
            return Ok(());
        }
        BisectSubcommand::Reset => {
            let desc = engine.bisect_reset(repo).await?;
            println!(
                "bisect finished, back on {}",
                desc.orig_branch.as_deref().unwrap_or_else(|| desc.orig_head.short())
            );
            return Ok(());
        }
        BisectSubcommand::Good { rev } => (BisectMark::Good, rev),
        BisectSubcommand::Bad { rev } => (BisectMark::Bad, rev),
        BisectSubcommand::Skip { rev } => (BisectMark::Skip, rev),
    };
    let desc = engine.bisect_mark(repo, mark, rev.as_deref()).await?;
    print_bisect(&desc);
    Ok(())
}

fn print_bisect(desc: &OperationDescriptor) {
    for line in desc.bisect.as_ref().map(render::bisect_lines).unwrap_or_default() {
        println!("{line}");
    }
}

/// Resumes the active operation.
///
/// # Errors
///
/// Returns an error while conflicts remain or when nothing is in progress.
pub async fn run_continue_command(engine: &Engine, repo: &RepositoryHandle) -> Result<()> {
    report(&engine.continue_operation(repo).await?)
}

/// Rolls the active operation back.
///
/// # Errors
///
/// Returns an error when nothing is in progress or the rollback fails.
pub async fn run_abort_command(engine: &Engine, repo: &RepositoryHandle) -> Result<()> {
    let desc = engine.abort(repo).await?;
    println!("{} {} aborted", desc.kind, desc.id);
    Ok(())
}

/// Lists or resolves conflicts of the active operation.
///
/// # Errors
///
/// Returns an error for unknown paths, leftover markers in manual content,
/// or when nothing is in progress.
pub async fn run_fix_command(
    args: &FixArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    let (side, paths) = match &args.subcommand {
        FixSubcommand::List => {
            let conflicts = engine.list_conflicts(repo)?;
            if conflicts.is_empty() {
                println!("no conflicts");
            }
            for record in &conflicts {
                println!("{}", render::conflict_line(record));
            }
            return Ok(());
        }
        FixSubcommand::Manual { path, from } => {
            let source = from
                .clone()
                .unwrap_or_else(|| repo.worktree_path(path));
            let content = tokio::fs::read(&source)
                .await
                .with_context(|| format!("failed to read '{}'", source.display()))?;
            let record = engine
                .resolve(repo, path, &ResolutionPolicy::Manual(content))
                .await?;
            println!("{}", render::conflict_line(&record));
            return Ok(());
        }
        FixSubcommand::Ours { paths } => (Side::Ours, paths),
        FixSubcommand::Theirs { paths } => (Side::Theirs, paths),
    };

    if paths.is_empty() {
        let resolved = engine.resolve_all(repo, side).await?;
        println!("resolved {} path(s)", resolved.len());
        return Ok(());
    }
    let policy = ResolutionPolicy::from(side);
    for path in paths {
        let record = engine.resolve(repo, path, &policy).await?;
        println!("{}", render::conflict_line(&record));
    }
    Ok(())
}
