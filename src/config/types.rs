// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for gitduo.
//!
//! # Config Structure
//!
//! ```text
//! Config: GlobalConfig, EngineConfig, CollabConfig
//! ProviderPreference: auto (default) | embedded | subprocess
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LogLevel;
use crate::provider::ProviderKind;

/// Which provider the engine should use.
///
/// `auto` lets the selector prefer the embedded provider and fall back to
/// the `git` binary; the other values pin every operation to one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderPreference {
    #[default]
    Auto,
    Embedded,
    Subprocess,
}

impl ProviderPreference {
    /// The provider this preference pins, if any.
    #[must_use]
    pub const fn pinned(self) -> Option<ProviderKind> {
        match self {
            Self::Auto => None,
            Self::Embedded => Some(ProviderKind::Embedded),
            Self::Subprocess => Some(ProviderKind::Subprocess),
        }
    }
}

impl std::fmt::Display for ProviderPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Embedded => write!(f, "embedded"),
            Self::Subprocess => write!(f, "subprocess"),
        }
    }
}

impl FromStr for ProviderPreference {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "embedded" => Ok(Self::Embedded),
            "subprocess" | "git" => Ok(Self::Subprocess),
            _ => Err(ConfigError::InvalidValue {
                section: "engine".to_string(),
                key: "provider".to_string(),
                message: format!("expected auto, embedded or subprocess, got '{s}'"),
            }),
        }
    }
}

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file; no file logging when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
        }
    }
}

/// Engine behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Provider preference.
    pub provider: ProviderPreference,
    /// Name or path of the git executable used by the subprocess provider.
    pub git_program: String,
    /// Upper bound for a single git invocation.
    pub git_timeout_secs: u64,
    /// How long to wait for another process to release the repository lock.
    pub lock_timeout_ms: u64,
    /// Number of finished operations kept in the history.
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderPreference::Auto,
            git_program: "git".to_string(),
            git_timeout_secs: 300,
            lock_timeout_ms: 5_000,
            history_limit: 20,
        }
    }
}

impl EngineConfig {
    /// Timeout applied to every git invocation.
    #[must_use]
    pub const fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    /// Maximum wait for the repository lock.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Collaboration (pull request) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollabConfig {
    /// REST API base URL.
    pub api_url: String,
    /// Repository as `owner/name`.
    pub repository: String,
    /// Remote used to fetch pull request heads.
    pub remote: String,
    /// API token.
    pub token: String,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            repository: String::new(),
            remote: "origin".to_string(),
            token: String::new(),
        }
    }
}

impl CollabConfig {
    /// Splits `repository` into owner and name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` when unset and `InvalidValue` when
    /// not of the form `owner/name`.
    pub fn owner_and_name(&self) -> std::result::Result<(&str, &str), ConfigError> {
        if self.repository.is_empty() {
            return Err(ConfigError::MissingKey {
                section: "collab".to_string(),
                key: "repository".to_string(),
            });
        }
        match self.repository.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok((owner, name))
            }
            _ => Err(ConfigError::InvalidValue {
                section: "collab".to_string(),
                key: "repository".to_string(),
                message: format!("expected owner/name, got '{}'", self.repository),
            }),
        }
    }
}
