// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core runtime services.
//!
//! ```text
//!        core
//!         |
//!         v
//!      process
//!         |
//!   Builder -> Output
//!   timeout + cancellation
//! ```

pub mod process;
