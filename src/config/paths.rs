// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Well-known configuration file locations.
//!
//! ```text
//! $XDG_CONFIG_HOME/gitduo/gitduo.toml   (or ~/.config/gitduo/gitduo.toml)
//! ./gitduo.toml
//! ```

use std::path::{Path, PathBuf};

/// File name looked up in every configuration directory.
pub const CONFIG_FILE_NAME: &str = "gitduo.toml";

/// Per-user configuration file, if a home or XDG directory is known.
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    let from_xdg = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let base = from_xdg.or_else(|| {
        std::env::var_os("HOME")
            .filter(|v| !v.is_empty())
            .map(|home| Path::new(&home).join(".config"))
    })?;
    Some(base.join("gitduo").join(CONFIG_FILE_NAME))
}

/// Configuration file in the current directory.
#[must_use]
pub fn local_config_file() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}
