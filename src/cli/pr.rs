// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI arguments for the `pr` command.
//!
//! ```text
//! duo pr <operation>
//! create   → open a pull request from the current branch
//! list     → pull requests in a state
//! checkout → fetch pull/<n>/head into pr-<n> and switch to it
//! review   → approve, request changes or comment
//!
//! USAGE:
//! $ duo pr create --title "Fix crash" --base main
//! $ duo pr checkout 123 --github-token $TOKEN
//! $ duo pr review 123 --verdict approve -m "LGTM"
//! ```

use clap::{Args, Subcommand, ValueEnum};

use crate::collab::ReviewEvent;

/// Arguments for the `pr` command.
#[derive(Debug, Clone, Args)]
pub struct PrArgs {
    /// GitHub API token, overrides collab.token.
    #[arg(long = "github-token", value_name = "TOKEN", env = "GITHUB_TOKEN")]
    pub github_token: Option<String>,

    #[command(subcommand)]
    pub operation: PrOperation,
}

/// PR operations.
#[derive(Debug, Clone, Subcommand)]
pub enum PrOperation {
    /// Opens a pull request.
    Create {
        #[arg(short = 't', long)]
        title: String,
        /// Target branch.
        #[arg(long)]
        base: String,
        /// Source branch, the current branch when omitted.
        #[arg(long)]
        head: Option<String>,
        #[arg(short = 'b', long, default_value = "")]
        body: String,
        #[arg(long)]
        draft: bool,
    },

    /// Lists pull requests.
    List {
        #[arg(long, value_enum, default_value_t = PrState::Open)]
        state: PrState,
    },

    /// Fetches a pull request head and checks it out.
    Checkout { number: u64 },

    /// Submits a review.
    Review {
        number: u64,
        #[arg(long, value_enum, default_value_t = ReviewVerdict::Comment)]
        verdict: ReviewVerdict,
        #[arg(short = 'm', long, default_value = "")]
        body: String,
    },
}

/// Pull request state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrState {
    Open,
    Closed,
    All,
}

impl PrState {
    /// Value of the API `state` parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Review verdict as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewVerdict {
    Approve,
    RequestChanges,
    Comment,
}

impl From<ReviewVerdict> for ReviewEvent {
    fn from(verdict: ReviewVerdict) -> Self {
        match verdict {
            ReviewVerdict::Approve => Self::Approve,
            ReviewVerdict::RequestChanges => Self::RequestChanges,
            ReviewVerdict::Comment => Self::Comment,
        }
    }
}
