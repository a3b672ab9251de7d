// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers --> Engine
//!   config, ops, park, pr, repo, tree
//! ```

pub mod config;
pub mod ops;
pub mod park;
pub mod pr;
pub mod render;
pub mod repo;
pub mod tree;

use std::path::Path;

use anyhow::Context;

use crate::engine::state::{OperationDescriptor, Status};
use crate::error::Result;
use crate::repository::RepositoryHandle;

/// Locates the repository commands operate on.
///
/// # Errors
///
/// Returns an error when `start` is not inside a non-bare repository.
pub fn open_repository(start: &Path) -> Result<RepositoryHandle> {
    RepositoryHandle::discover(start)
        .with_context(|| format!("cannot open a repository at '{}'", start.display()))
}

/// Prints a descriptor and turns a conflicted stop into an error exit.
fn report(desc: &OperationDescriptor) -> Result<()> {
    for line in render::operation_lines(desc) {
        println!("{line}");
    }
    if desc.status == Status::Conflicted {
        anyhow::bail!(
            "{} stopped with {} unresolved path(s)",
            desc.kind,
            desc.unresolved_paths().len()
        );
    }
    Ok(())
}
