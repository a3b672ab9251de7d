// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the command-line surface.
//!
//! Parses realistic argument lists and runs the `duo` binary end to end.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use clap::Parser;
use gitduo::cli::global::GlobalOptions;
use gitduo::cli::{Cli, Command as DuoCommand};
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@test.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@test.com")
        .output()
        .expect("git should run");
    assert!(output.status.success(), "git {args:?} failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn commit_file(dir: &Path, path: &str, content: &str, message: &str) {
    fs::write(dir.join(path), content).unwrap();
    git(dir, &["add", path]);
    git(dir, &["commit", "-q", "-m", message]);
}

fn setup() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "user.email", "test@test.com"]);
    commit_file(dir, "file.txt", "1\n2\n3\n", "initial");
    temp
}

/// Runs `duo` isolated from the user's config and environment overrides.
fn duo(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_duo"))
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("DUO_ENGINE__PROVIDER")
        .env_remove("GITHUB_TOKEN")
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@test.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@test.com")
        .output()
        .expect("duo should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn cli_global_options_become_overrides() {
    let cli = Cli::try_parse_from([
        "duo",
        "--provider",
        "embedded",
        "--file-log-level",
        "5",
        "--log-file",
        "/tmp/duo.log",
        "merge",
        "feature",
    ])
    .unwrap();
    assert!(matches!(cli.command, Some(DuoCommand::Merge(ref m)) if m.target == "feature"));
    assert_eq!(
        cli.global.to_config_overrides(),
        vec![
            "global/file_log_level=5",
            "global/log_file=/tmp/duo.log",
            "engine/provider=embedded",
        ]
    );
}

#[test]
fn cli_default_global_options_have_no_overrides() {
    assert!(GlobalOptions::default().to_config_overrides().is_empty());
}

#[test]
fn cli_global_options_must_precede_command() {
    assert!(Cli::try_parse_from(["duo", "status", "--provider", "embedded"]).is_err());
}

#[test]
fn cli_subcommands_parse() {
    for args in [
        &["duo", "init"][..],
        &["duo", "clone", "https://example.com/r.git", "-b", "dev"],
        &["duo", "stage", "src/**/*.rs"],
        &["duo", "commit", "-m", "message"],
        &["duo", "diff", "HEAD~1"],
        &["duo", "continue"],
        &["duo", "abort"],
        &["duo", "fix", "list"],
        &["duo", "park"],
        &["duo", "park", "drop", "0"],
        &["duo", "worktree", "add", "../wt", "-b", "topic"],
        &["duo", "submodule", "update", "--init"],
        &["duo", "pr", "checkout", "7"],
        &["duo", "options"],
        &["duo", "inis"],
    ] {
        assert!(Cli::try_parse_from(args).is_ok(), "failed to parse {args:?}");
    }
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn duo_version_prints_package_version() {
    let home = tempfile::tempdir().unwrap();
    let output = duo(home.path(), &["version"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).lines().next(),
        Some(env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn duo_options_reflect_overrides() {
    let home = tempfile::tempdir().unwrap();
    let output = duo(
        home.path(),
        &["--provider", "subprocess", "-s", "collab/token=secret", "options"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.lines().any(|l| l.starts_with("engine.provider") && l.ends_with("= subprocess")));
    assert!(out.contains("[hidden]"));
    assert!(!out.contains("secret"));
}

#[test]
fn duo_inis_lists_loaded_files() {
    let home = tempfile::tempdir().unwrap();
    let ini = home.path().join("extra.toml");
    fs::write(&ini, "[engine]\nhistory_limit = 2\n").unwrap();
    let ini_arg = ini.display().to_string();

    let output = duo(home.path(), &["--no-default-inis", "--ini", &ini_arg, "inis"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), format!("1. [file] {ini_arg}"));
}

#[test]
fn duo_bad_config_fails() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join("gitduo.toml"), "[engine]\nprovider = \"bogus\"\n").unwrap();
    let output = duo(home.path(), &["status"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load config"));
}

#[test]
fn duo_status_outside_repository_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = duo(home.path(), &["status"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot open a repository"), "{}", stderr(&output));
}

#[test]
fn duo_status_in_repository() {
    let repo = setup();
    let dir = repo.path().display().to_string();
    fs::write(repo.path().join("new.txt"), "n\n").unwrap();

    let output = duo(repo.path(), &["-C", &dir, "status"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("On branch main"), "{out}");
    assert!(out.contains("?? new.txt"), "{out}");
}

#[test]
fn duo_merge_fix_continue_workflow() {
    let repo = setup();
    let dir = repo.path();
    git(dir, &["branch", "feature"]);
    commit_file(dir, "file.txt", "1\nmain\n3\n", "main edit");
    git(dir, &["checkout", "-q", "feature"]);
    commit_file(dir, "file.txt", "1\nfeature\n3\n", "feature edit");
    git(dir, &["checkout", "-q", "main"]);

    let merge = duo(dir, &["merge", "feature"]);
    assert!(!merge.status.success());
    assert!(stdout(&merge).contains("merge conflicted"), "{}", stdout(&merge));
    assert!(stderr(&merge).contains("unresolved path(s)"));

    let list = duo(dir, &["fix", "list"]);
    assert!(stdout(&list).contains("file.txt"));

    let early = duo(dir, &["continue"]);
    assert!(!early.status.success());
    assert!(stderr(&early).contains("unresolved conflicts remain"));

    assert!(duo(dir, &["fix", "theirs", "file.txt"]).status.success());
    let done = duo(dir, &["continue"]);
    assert!(done.status.success(), "{}", stderr(&done));
    assert!(stdout(&done).contains("merge completed"));
    assert_eq!(fs::read_to_string(dir.join("file.txt")).unwrap(), "1\nfeature\n3\n");
}

#[test]
fn duo_park_save_list_resume() {
    let repo = setup();
    let dir = repo.path();
    fs::write(dir.join("file.txt"), "parked\n").unwrap();

    let save = duo(dir, &["park", "save", "-m", "wip"]);
    assert!(save.status.success(), "{}", stderr(&save));
    assert_eq!(fs::read_to_string(dir.join("file.txt")).unwrap(), "1\n2\n3\n");

    let list = duo(dir, &["park", "list"]);
    assert!(stdout(&list).starts_with("0: wip on main"), "{}", stdout(&list));

    let resume = duo(dir, &["park", "resume"]);
    assert!(resume.status.success(), "{}", stderr(&resume));
    assert_eq!(fs::read_to_string(dir.join("file.txt")).unwrap(), "parked\n");
    assert!(stdout(&duo(dir, &["park", "list"])).contains("no parked work"));
}
