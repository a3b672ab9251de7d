// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Async process spawning and management.
//!
//! ```text
//! ProcessBuilder::new("git")
//!   .args() .cwd() .env() .capture_output() .timeout()
//!   .run() / .run_with_cancellation(token)
//!       --> tokio::process::Command
//!           collect stdout/stderr as bytes
//!           race: exit | timeout | cancel  (kill on the latter two)
//!       --> ProcessOutput { exit_code, stdout, stderr, timed_out, interrupted }
//! ```

pub mod builder;
mod io;
mod runner;
