// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for gitduo.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. user gitduo.toml (~/.config/gitduo)
//! 3. local gitduo.toml (cwd)
//! 4. --ini files
//! 5. DUO_* env vars
//! 6. --set / CLI overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! DUO_ENGINE__PROVIDER=subprocess      → engine.provider = "subprocess"
//! DUO_ENGINE__GIT_TIMEOUT_SECS=30      → engine.git_timeout_secs = 30
//! DUO_COLLAB__TOKEN=ghp_...            → collab.token = "ghp_..."
//! ```

pub mod loader;
pub mod paths;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
pub use types::{CollabConfig, EngineConfig, GlobalConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Engine and provider options.
    pub engine: EngineConfig,
    /// Pull request provider options.
    pub collab: CollabConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gitduo::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("gitduo.toml")
    ///     .with_env_prefix("DUO")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Validate values that serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::InvalidValue` for a zero git timeout, an empty
    /// git program, or an API URL without an http(s) scheme.
    pub fn validate(&self) -> Result<()> {
        if self.engine.git_timeout_secs == 0 {
            return Err(invalid("engine", "git_timeout_secs", "must be greater than 0").into());
        }
        if self.engine.git_program.trim().is_empty() {
            return Err(invalid("engine", "git_program", "must not be empty").into());
        }
        if !(self.collab.api_url.starts_with("http://")
            || self.collab.api_url.starts_with("https://"))
        {
            return Err(invalid("collab", "api_url", "must start with http:// or https://").into());
        }
        if !self.collab.repository.is_empty() {
            self.collab.owner_and_name()?;
        }
        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Tokens are hidden with a `[hidden]` marker. Output is ordered by key.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_engine_options(&mut options);
        self.format_collab_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
    }

    fn format_engine_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("engine.provider".into(), self.engine.provider.to_string());
        options.insert("engine.git_program".into(), self.engine.git_program.clone());
        options.insert(
            "engine.git_timeout_secs".into(),
            self.engine.git_timeout_secs.to_string(),
        );
        options.insert(
            "engine.lock_timeout_ms".into(),
            self.engine.lock_timeout_ms.to_string(),
        );
        options.insert(
            "engine.history_limit".into(),
            self.engine.history_limit.to_string(),
        );
    }

    fn format_collab_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("collab.api_url".into(), self.collab.api_url.clone());
        options.insert("collab.repository".into(), self.collab.repository.clone());
        options.insert("collab.remote".into(), self.collab.remote.clone());
        if !self.collab.token.is_empty() {
            options.insert("collab.token".into(), "[hidden]".into());
        }
    }
}

fn invalid(section: &str, key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}
