// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Park command implementation.

use super::{render, report};
use crate::cli::park::{ParkArgs, ParkSubcommand};
use crate::engine::Engine;
use crate::error::Result;
use crate::repository::RepositoryHandle;

/// Main handler for the park command.
///
/// # Errors
///
/// Returns an error if there is nothing to park, the entry is unknown, or a
/// resume stops on conflicts.
pub async fn run_park_command(
    args: &ParkArgs,
    engine: &Engine,
    repo: &RepositoryHandle,
) -> Result<()> {
    let save = ParkSubcommand::Save { label: None };
    match args.subcommand.as_ref().unwrap_or(&save) {
        ParkSubcommand::Save { label } => {
            let entry = engine.park(repo, label.as_deref()).await?;
            println!("{}", render::park_line(0, &entry));
        }
        ParkSubcommand::List => {
            let parks = engine.parks(repo)?;
            if parks.is_empty() {
                println!("no parked work");
            }
            for (index, entry) in parks.iter().enumerate() {
                println!("{}", render::park_line(index, entry));
            }
        }
        ParkSubcommand::Resume { selector, keep } => {
            report(&engine.resume(repo, selector.as_deref(), *keep).await?)?;
        }
        ParkSubcommand::Drop { selector } => {
            let entry = engine.drop_park(repo, selector).await?;
            println!("dropped {}", entry.label);
        }
    }
    Ok(())
}
