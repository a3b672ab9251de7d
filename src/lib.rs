// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |         repo / ops / park / pr
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          engine           |
//!              |  selector, state machine, |
//!              |  conflicts, park store    |
//!              '--+-----------+--------+---'
//!                 |           |        |
//!                 v           v        v
//!             embedded   subprocess  collab
//!             gix+merge3  git CLI    GitHub
//!
//!   +-----------------------------------------+
//!   |  core   process runner                  |
//!   +-----------------------------------------+
//!   |  foundation   error, logging, config,   |
//!   |               repository, utility       |
//!   +-----------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod collab;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod logging;
pub mod provider;
pub mod repository;
pub mod utility;
