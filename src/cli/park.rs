// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Park command arguments.
//!
//! ```text
//! park save [-m LABEL]       → snapshot and clean the tree
//! park list                  → entries, newest first
//! park resume [SEL] [--keep] → re-apply (newest by default)
//! park drop SEL              → delete an entry
//! ```
//!
//! `SEL` is a label or an index from `park list`.

use clap::{Args, Subcommand};

/// Arguments for the `park` command.
#[derive(Debug, Clone, Args)]
pub struct ParkArgs {
    /// Park subcommand, `save` when omitted.
    #[command(subcommand)]
    pub subcommand: Option<ParkSubcommand>,
}

/// Park subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ParkSubcommand {
    /// Parks uncommitted work.
    Save {
        /// Label of the entry, a timestamp when omitted.
        #[arg(short = 'm', long)]
        label: Option<String>,
    },

    /// Lists park entries.
    List,

    /// Re-applies a park entry.
    Resume {
        /// Label or index, the newest entry when omitted.
        selector: Option<String>,
        /// Keeps the entry after a successful resume.
        #[arg(long)]
        keep: bool,
    },

    /// Deletes a park entry.
    Drop {
        /// Label or index.
        selector: String,
    },
}
