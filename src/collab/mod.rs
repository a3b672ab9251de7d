// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pull request collaboration providers.
//!
//! ```text
//! CollabProvider (async_trait)
//!   create_pr  list_prs  get_pr  review_pr
//!        |
//!        v
//! GitHubProvider  reqwest -> {api_url}/repos/{owner}/{name}/pulls...
//! ```
//!
//! `pr checkout` does not live here: it fetches `pull/<n>/head` through the
//! engine like any other fetch.

pub mod github;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

pub use github::GitHubProvider;

/// Result type of collaboration calls.
pub type CollabResult<T> = std::result::Result<T, NetworkError>;

/// Branch end of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrBranch {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub sha: String,
}

/// Pull request author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrUser {
    pub login: String,
}

/// A pull request as reported by the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub html_url: String,
    pub head: PrBranch,
    pub base: PrBranch,
    #[serde(default)]
    pub user: Option<PrUser>,
    #[serde(default)]
    pub draft: bool,
}

/// Fields of a pull request to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    /// Source branch.
    pub head: String,
    /// Target branch.
    pub base: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    pub draft: bool,
}

/// Review verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    Approve,
    RequestChanges,
    Comment,
}

impl fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::RequestChanges => "request-changes",
            Self::Comment => "comment",
        })
    }
}

/// A submitted review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Review {
    pub id: u64,
    pub state: String,
    #[serde(default)]
    pub html_url: String,
}

/// Forge operations on pull requests.
#[async_trait]
pub trait CollabProvider: Send + Sync + fmt::Debug {
    async fn create_pr(&self, pr: &NewPullRequest) -> CollabResult<PullRequest>;

    /// Pull requests in `state` (`open`, `closed` or `all`).
    async fn list_prs(&self, state: &str) -> CollabResult<Vec<PullRequest>>;

    async fn get_pr(&self, number: u64) -> CollabResult<PullRequest>;

    async fn review_pr(&self, number: u64, event: ReviewEvent, body: &str) -> CollabResult<Review>;
}

/// Local branch a checked-out pull request lands on.
#[must_use]
pub fn checkout_branch(number: u64) -> String {
    format!("pr-{number}")
}

/// Refspec fetching the head of pull request `number` into its local branch.
#[must_use]
pub fn checkout_refspec(number: u64) -> String {
    format!("+pull/{number}/head:refs/heads/{}", checkout_branch(number))
}
