// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! PR command: talk to the forge, check pull requests out locally.
//!
//! ```text
//! create/list/review --> CollabProvider (GitHub REST)
//! checkout           --> Engine::fetch(+pull/<n>/head:refs/heads/pr-<n>)
//!                        Engine::switch_branch(pr-<n>)
//! ```


use anyhow::Context;
use tracing::{debug, info};

use super::render;
use crate::cli::pr::{PrArgs, PrOperation};
use crate::collab::{self, CollabProvider, GitHubProvider, NewPullRequest, ReviewEvent};
use crate::config::Config;
use crate::config::types::CollabConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::repository::RepositoryHandle;

/// `[collab]` settings with the command-line token applied.
fn collab_config(config: &Config, token: Option<&str>) -> CollabConfig {
    let mut collab = config.collab.clone();
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        collab.token = token.to_string();
    }
    collab
}

/// Main handler for the pr command.
///
/// # Errors
///
/// Returns an error if `collab.repository` is unset, the API call fails, or
/// the checkout cannot fetch or switch.
pub async fn run_pr_command(
    args: &PrArgs,
    config: &Config,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    let collab = collab_config(config, args.github_token.as_deref());

    if let PrOperation::Checkout { number } = &args.operation {
        return checkout(*number, &collab, engine, repo).await;
    }

    let forge = GitHubProvider::from_config(&collab)?;
    debug!(repository = %collab.repository, "pull request provider ready");
    run_forge_operation(&args.operation, &forge, &collab, engine, repo).await
}

async fn run_forge_operation(
    operation: &PrOperation,
    forge: &dyn CollabProvider,
    collab: &CollabConfig,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    match operation {
        PrOperation::Create {
            title,
            base,
            head,
            body,
            draft,
        } => {
            let head = match head {
                Some(head) => head.clone(),
                None => engine
                    .head(repo)
                    .await?
                    .branch
                    .context("HEAD is detached; pass --head")?,
            };
            let pr = forge
                .create_pr(&NewPullRequest {
                    title: title.clone(),
                    head,
                    base: base.clone(),
                    body: body.clone(),
                    draft: *draft,
                })
                .await
                .context("failed to create pull request")?;
            info!(number = pr.number, "pull request created");
            println!("{}", render::pr_line(&pr));
            if !pr.html_url.is_empty() {
                println!("{}", pr.html_url);
            }
        }
        PrOperation::List { state } => {
            let prs = forge
                .list_prs(state.as_str())
                .await
                .context("failed to list pull requests")?;
            if prs.is_empty() {
                println!("no {} pull requests", state.as_str());
            }
            for pr in &prs {
                println!("{}", render::pr_line(pr));
            }
        }
        PrOperation::Review {
            number,
            verdict,
            body,
        } => {
            let event = ReviewEvent::from(*verdict);
            let review = forge
                .review_pr(*number, event, body)
                .await
                .with_context(|| format!("failed to review #{number}"))?;
            info!(number, %event, id = review.id, "review submitted");
            println!("#{number}: {}", review.state);
        }
        PrOperation::Checkout { number } => checkout(*number, collab, engine, repo).await?,
    }
    Ok(())
}

async fn checkout(
    number: u64,
    collab: &CollabConfig,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    let refspec = collab::checkout_refspec(number);
    engine
        .fetch(repo, &collab.remote, &[refspec])
        .await
        .with_context(|| format!("failed to fetch #{number} from '{}'", collab.remote))?;
    let branch = collab::checkout_branch(number);
    engine.switch_branch(repo, &branch).await?;
    println!("Switched to branch {branch}");
    Ok(())
}
