// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Engine --> Command Dispatch
//!   repo | ops | fix | park | worktree | submodule | pr | config
//! ```

use std::io::IsTerminal;
use std::process::ExitCode;

use gitduo::cli::global::GlobalOptions;
use gitduo::cli::{self, Command};
use gitduo::cmd::config::{run_inis_command, run_options_command, run_version_command};
use gitduo::cmd::ops::{
    run_abort_command, run_bisect_command, run_cherry_pick_command, run_continue_command,
    run_fix_command, run_merge_command, run_rebase_command,
};
use gitduo::cmd::park::run_park_command;
use gitduo::cmd::pr::run_pr_command;
use gitduo::cmd::repo::{
    run_branch_command, run_clone_command, run_commit_command, run_diff_command,
    run_init_command, run_stage_command, run_status_command,
};
use gitduo::cmd::tree::{run_submodule_command, run_worktree_command};
use gitduo::cmd::open_repository;
use gitduo::config::Config;
use gitduo::config::loader::ConfigLoader;
use gitduo::config::paths::{local_config_file, user_config_file};
use gitduo::engine::Engine;
use gitduo::logging::init_logging;
use gitduo::logging::{LogConfig, LogLevel};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    if let Some(Command::Inis) = cli.command {
        run_inis_command(&build_config_loader(&cli.global).format_loaded_files());
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli.global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = build_log_config(&cli.global, &config);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());
    let engine = Engine::from_config(&config.engine, cancel);

    match dispatch_command(&cli, &config, &engine).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Ctrl-C cancels running git invocations; the operation stays resumable.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping");
            cancel.cancel();
        }
    });
}

fn build_log_config(global: &GlobalOptions, config: &Config) -> LogConfig {
    let console_level = global
        .log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(config.global.output_log_level);

    let file_level = global
        .file_log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(config.global.file_log_level);

    let log_file = global
        .log_file
        .as_ref()
        .or(config.global.log_file.as_ref())
        .map(|p| p.display().to_string());

    LogConfig::builder()
        .with_console_level(console_level)
        .with_file_level(file_level)
        .maybe_with_log_file(log_file)
        .with_json_file(global.log_json)
        .with_console_ansi(std::io::stderr().is_terminal())
        .build()
}

async fn dispatch_command(
    cli: &cli::Cli,
    config: &Config,
    engine: &Engine,
) -> gitduo::error::Result<()> {
    let Some(command) = &cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        anyhow::bail!("No command specified");
    };

    match command {
        Command::Version => {
            run_version_command(engine);
            return Ok(());
        }
        Command::Options => {
            run_options_command(config);
            return Ok(());
        }
        Command::Init(args) => return run_init_command(args, engine).await,
        Command::Clone(args) => return run_clone_command(args, engine).await,
        _ => {}
    }

    let repo = open_repository(cli.global.start_dir())?;
    match command {
        Command::Status => run_status_command(engine, &repo).await,
        Command::Branch(args) => run_branch_command(args, engine, &repo).await,
        Command::Stage(args) => run_stage_command(args, engine, &repo).await,
        Command::Commit(args) => run_commit_command(args, engine, &repo).await,
        Command::Diff(args) => run_diff_command(args, engine, &repo).await,
        Command::Merge(args) => run_merge_command(args, engine, &repo).await,
        Command::Rebase(args) => run_rebase_command(args, engine, &repo).await,
        Command::CherryPick(args) => run_cherry_pick_command(args, engine, &repo).await,
        Command::Bisect(args) => run_bisect_command(args, engine, &repo).await,
        Command::Continue => run_continue_command(engine, &repo).await,
        Command::Abort => run_abort_command(engine, &repo).await,
        Command::Fix(args) => run_fix_command(args, engine, &repo).await,
        Command::Park(args) => run_park_command(args, engine, &repo).await,
        Command::Worktree(args) => run_worktree_command(args, engine, &repo).await,
        Command::Submodule(args) => run_submodule_command(args, engine, &repo).await,
        Command::Pr(args) => run_pr_command(args, config, engine, &repo).await,
        Command::Version
        | Command::Options
        | Command::Inis
        | Command::Init(_)
        | Command::Clone(_) => Ok(()),
    }
}

fn build_config_loader(global: &GlobalOptions) -> ConfigLoader {
    let mut loader = ConfigLoader::new();
    if !global.no_default_inis {
        if let Some(user) = user_config_file() {
            loader = loader.add_toml_file_optional(user);
        }
        loader = loader.add_toml_file_optional(local_config_file());
    }
    for ini_path in &global.inis {
        loader = loader.add_toml_file(ini_path);
    }
    loader.with_env_prefix("DUO")
}

fn load_config(global: &GlobalOptions) -> gitduo::error::Result<Config> {
    build_config_loader(global)
        .apply_overrides(&global.to_config_overrides())?
        .build()
}
