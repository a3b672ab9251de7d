// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Filesystem utilities with parallel traversal.
//!
//! ```text
//! walk:  scan_worktree()    ignore::WalkParallel (multi-core), .git skipped
//!        match_pathspecs()  exact path, directory prefix, or wax glob
//!        WalkOptions        hidden, gitignore, threads, skip names
//! ```

pub mod walk;
