// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Informational commands: options, inis, version.

use crate::config::Config;
use crate::engine::Engine;
use crate::provider::ProviderKind;

/// Display current configuration options.
pub fn run_options_command(config: &Config) {
    for line in config.format_options() {
        println!("{line}");
    }
}

/// Display loaded configuration files.
pub fn run_inis_command(config_files: &[String]) {
    if config_files.is_empty() {
        println!("No configuration files loaded");
    } else {
        for line in config_files {
            println!("{line}");
        }
    }
}

/// Display the version and the providers usable on this host.
pub fn run_version_command(engine: &Engine) {
    println!("{}", env!("CARGO_PKG_VERSION"));
    let providers: Vec<String> = [ProviderKind::Embedded, ProviderKind::Subprocess]
        .into_iter()
        .filter(|kind| engine.providers().available(*kind).is_some())
        .map(|kind| kind.to_string())
        .collect();
    println!("providers: {}", providers.join(", "));
}
