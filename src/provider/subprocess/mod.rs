// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Provider driving the `git` executable.
//!
//! ```text
//! SubprocessProvider
//!   executable  resolved once via PATH at construction
//!   every call: ProcessBuilder(git) cwd=workdir
//!               GIT_TERMINAL_PROMPT=0 GCM_INTERACTIVE=never
//!               GIT_EDITOR=true LC_ALL=C
//!               timeout + cancellation token (child killed on either)
//!   conflicts:  git ls-files -u -z  -> ConflictRecord (+ marker hunks)
//! ```
//!
//! Rebase and cherry-pick run one `git cherry-pick` per step so the engine
//! keeps the queue. Interactive rebase and bisect use git's own sequencer.

mod parse;

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use self::parse::{BRANCH_FORMAT, REF_FORMAT};
use crate::core::process::builder::{ProcessBuilder, ProcessFlags, ProcessOutput};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    BisectMark, BisectOutcome, BranchInfo, Capabilities, CloneOptions, ConflictRecord, DiffEntry,
    HeadState, Oid, OperationKind, PARK_REF_PREFIX, ParkPayload, Provider, ProviderKind,
    RebasePlan, RestorePoint, Step, StepOutcome, SubmoduleInfo, WorktreeInfo, WorktreeStatus,
    merge_message,
};
use crate::repository::RepositoryHandle;

/// Environment applied to every git invocation.
const GIT_ENV: &[(&str, &str)] = &[
    ("GIT_TERMINAL_PROMPT", "0"),
    ("GCM_INTERACTIVE", "never"),
    ("GIT_EDITOR", "true"),
    ("LC_ALL", "C"),
];

/// Lets local-path submodule URLs through git's transport policy.
const ALLOW_FILE_PROTOCOL: [&str; 2] = ["-c", "protocol.file.allow=always"];

/// Provider backed by the git command-line tool.
#[derive(Debug, Clone)]
pub struct SubprocessProvider {
    program: String,
    executable: Option<PathBuf>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl SubprocessProvider {
    /// Resolves `program` in PATH. A missing executable leaves the provider
    /// registered but unavailable.
    #[must_use]
    pub fn new(program: &str, timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        let executable = ProcessBuilder::find(program);
        match &executable {
            Some(path) => debug!(program, path = %path.display(), "git executable found"),
            None => debug!(program, "git executable not found, subprocess provider unavailable"),
        }
        Self {
            program: program.to_string(),
            executable,
            timeout,
            cancel,
        }
    }

    /// Program name this provider was configured with.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, cwd: &Path, args: &[&str]) -> ProviderResult<ProcessBuilder> {
        let executable = self.executable.as_ref().ok_or_else(|| {
            ProviderError::Backend(format!("'{}' was not found in PATH", self.program))
        })?;
        let mut builder = ProcessBuilder::new(executable)
            .name("git")
            .cwd(cwd)
            .args(args)
            .capture_output();
        for (key, value) in GIT_ENV {
            builder = builder.env(*key, *value);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    async fn exec(&self, builder: ProcessBuilder) -> ProviderResult<ProcessOutput> {
        Ok(builder.run_with_cancellation(self.cancel.child_token()).await?)
    }

    /// Runs git, failing on a non-zero exit.
    async fn run(&self, cwd: &Path, args: &[&str]) -> ProviderResult<ProcessOutput> {
        self.exec(self.command(cwd, args)?).await
    }

    /// Runs git and returns stdout without the trailing newline.
    async fn text(&self, cwd: &Path, args: &[&str]) -> ProviderResult<String> {
        let output = self.run(cwd, args).await?;
        Ok(output.stdout_str().trim_end().to_string())
    }

    /// Runs git accepting any exit code; returns the output and command line.
    async fn run_allowing(&self, cwd: &Path, args: &[&str]) -> ProviderResult<(ProcessOutput, String)> {
        let builder = self.command(cwd, args)?.flag(ProcessFlags::ALLOW_FAILURE);
        let command = builder.command_line();
        Ok((self.exec(builder).await?, command))
    }

    fn failure(command: String, output: &ProcessOutput) -> ProviderError {
        ProviderError::CommandFailed {
            command,
            code: output.exit_code(),
            stderr: output.stderr_str().trim().to_string(),
        }
    }

    async fn head_commit(&self, repo: &RepositoryHandle) -> ProviderResult<Option<Oid>> {
        let (output, _) = self
            .run_allowing(repo.workdir(), &["rev-parse", "-q", "--verify", "HEAD^{commit}"])
            .await?;
        if output.success() {
            Ok(Some(Oid::parse(&output.stdout_str())?))
        } else {
            Ok(None)
        }
    }

    async fn require_head(&self, repo: &RepositoryHandle) -> ProviderResult<Oid> {
        self.head_commit(repo)
            .await?
            .ok_or_else(|| ProviderError::NotFound {
                what: "HEAD commit (branch has no commits yet)".to_string(),
            })
    }

    async fn git_dir_of(&self, workdir: &Path) -> ProviderResult<PathBuf> {
        Ok(PathBuf::from(
            self.text(workdir, &["rev-parse", "--absolute-git-dir"]).await?,
        ))
    }

    /// Conflict records for every unmerged index path.
    async fn conflicts(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<ConflictRecord>> {
        let output = self.run(repo.workdir(), &["ls-files", "-u", "-z"]).await?;
        Ok(parse::parse_unmerged(output.stdout())
            .into_iter()
            .map(|(path, stages)| {
                let content = std::fs::read(repo.worktree_path(&path)).ok();
                parse::conflict_record(path, stages, content.as_deref())
            })
            .collect())
    }

    /// Stages the working-tree state of resolved paths.
    async fn stage_resolved(&self, repo: &RepositoryHandle, records: &[ConflictRecord]) -> ProviderResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "-A", "--"];
        args.extend(records.iter().map(|r| r.path.as_str()));
        self.run(repo.workdir(), &args).await?;
        Ok(())
    }

    fn sequencer_file(repo: &RepositoryHandle, name: &str) -> bool {
        repo.git_dir().join(name).exists()
    }

    /// Runs one `git cherry-pick`; shared by rebase steps and picks.
    async fn apply_commit(&self, repo: &RepositoryHandle, commit: &Oid) -> ProviderResult<StepOutcome> {
        let cwd = repo.workdir();
        let before = self.require_head(repo).await?;
        let parents = self
            .text(cwd, &["rev-list", "--parents", "-n", "1", commit.as_str()])
            .await?
            .split_whitespace()
            .count()
            .saturating_sub(1);

        let mut args = vec!["cherry-pick", "--no-edit"];
        if parents > 1 {
            args.extend(["-m", "1"]);
        }
        args.push(commit.as_str());
        let (output, command) = self.run_allowing(cwd, &args).await?;

        if output.success() {
            let after = self.require_head(repo).await?;
            return Ok(StepOutcome::Clean {
                commit: (after != before).then_some(after),
            });
        }

        let conflicts = self.conflicts(repo).await?;
        if !conflicts.is_empty() {
            return Ok(StepOutcome::Conflicted(conflicts));
        }
        if Self::sequencer_file(repo, "CHERRY_PICK_HEAD") {
            debug!(commit = %commit, "cherry-pick became empty, skipping");
            self.run(cwd, &["cherry-pick", "--skip"]).await?;
            return Ok(StepOutcome::Clean { commit: None });
        }
        Err(Self::failure(command, &output))
    }

    /// Classifies the result of a native rebase command.
    async fn native_outcome(
        &self,
        repo: &RepositoryHandle,
        output: &ProcessOutput,
        command: String,
    ) -> ProviderResult<StepOutcome> {
        let conflicts = self.conflicts(repo).await?;
        if !conflicts.is_empty() {
            return Ok(StepOutcome::Conflicted(conflicts));
        }
        if Self::sequencer_file(repo, "rebase-merge") || Self::sequencer_file(repo, "rebase-apply") {
            // Paused on an edit or break line
            return Ok(StepOutcome::Conflicted(Vec::new()));
        }
        if output.success() {
            return Ok(StepOutcome::Clean {
                commit: self.head_commit(repo).await?,
            });
        }
        Err(Self::failure(command, output))
    }

    async fn bisect(&self, repo: &RepositoryHandle, args: &[&str]) -> ProviderResult<BisectOutcome> {
        let output = self.run(repo.workdir(), args).await?;
        let outcome = parse::parse_bisect(&output.stdout_str())?;
        debug!(?outcome, "bisect progress");
        Ok(outcome)
    }
}

#[async_trait]
impl Provider for SubprocessProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Subprocess
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::everything()
    }

    fn is_available(&self) -> bool {
        self.executable.is_some()
    }

    async fn init(&self, path: &Path) -> ProviderResult<RepositoryHandle> {
        std::fs::create_dir_all(path)?;
        self.run(path, &["init", "-q"]).await?;
        let git_dir = self.git_dir_of(path).await?;
        info!(path = %path.display(), "initialized repository");
        Ok(RepositoryHandle::at(path, git_dir))
    }

    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        options: &CloneOptions,
    ) -> ProviderResult<RepositoryHandle> {
        let parent = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let dest_arg = dest.to_string_lossy();

        let mut args = vec!["clone", "-q"];
        if let Some(branch) = &options.branch {
            args.extend(["--branch", branch.as_str()]);
        }
        args.extend(["--", url, dest_arg.as_ref()]);
        self.run(parent, &args).await?;

        let git_dir = self.git_dir_of(dest).await?;
        info!(url, path = %dest.display(), "cloned repository");
        Ok(RepositoryHandle::at(dest, git_dir))
    }

    async fn head(&self, repo: &RepositoryHandle) -> ProviderResult<HeadState> {
        let (output, _) = self
            .run_allowing(repo.workdir(), &["symbolic-ref", "-q", "--short", "HEAD"])
            .await?;
        let branch = output
            .success()
            .then(|| output.stdout_str().trim().to_string());
        Ok(HeadState {
            branch,
            commit: self.head_commit(repo).await?,
        })
    }

    async fn status(&self, repo: &RepositoryHandle) -> ProviderResult<WorktreeStatus> {
        let output = self
            .run(
                repo.workdir(),
                &[
                    "status",
                    "--porcelain=v1",
                    "-z",
                    "--no-renames",
                    "--untracked-files=all",
                ],
            )
            .await?;
        Ok(parse::parse_status(output.stdout()))
    }

    async fn rev_parse(&self, repo: &RepositoryHandle, spec: &str) -> ProviderResult<Oid> {
        let peeled = format!("{spec}^{{commit}}");
        let (output, _) = self
            .run_allowing(repo.workdir(), &["rev-parse", "-q", "--verify", &peeled])
            .await?;
        if output.success() {
            Oid::parse(&output.stdout_str())
        } else {
            Err(ProviderError::NotFound {
                what: format!("revision '{spec}'"),
            })
        }
    }

    async fn read_blob(&self, repo: &RepositoryHandle, id: &Oid) -> ProviderResult<Vec<u8>> {
        let builder = self
            .command(repo.workdir(), &["cat-file", "blob", id.as_str()])?
            .capture_stdout_silently();
        Ok(self.exec(builder).await?.into_stdout())
    }

    async fn list_branches(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<BranchInfo>> {
        let format = format!("--format={BRANCH_FORMAT}");
        let output = self
            .text(repo.workdir(), &["for-each-ref", &format, "refs/heads/"])
            .await?;
        Ok(parse::parse_branches(&output))
    }

    async fn diff(
        &self,
        repo: &RepositoryHandle,
        from: &str,
        to: Option<&str>,
    ) -> ProviderResult<Vec<DiffEntry>> {
        let mut args = vec!["diff", "--name-status", "--no-renames", "-z", from];
        args.extend(to);
        args.push("--");
        let output = self.run(repo.workdir(), &args).await?;
        Ok(parse::parse_name_status(output.stdout()))
    }

    async fn create_branch(
        &self,
        repo: &RepositoryHandle,
        name: &str,
        start: Option<&str>,
    ) -> ProviderResult<Oid> {
        let mut args = vec!["branch", name];
        args.extend(start);
        self.run(repo.workdir(), &args).await?;
        self.rev_parse(repo, &format!("refs/heads/{name}")).await
    }

    async fn switch_branch(&self, repo: &RepositoryHandle, name: &str) -> ProviderResult<()> {
        self.run(repo.workdir(), &["switch", "-q", name]).await?;
        info!(branch = name, "switched branch");
        Ok(())
    }

    async fn stage(
        &self,
        repo: &RepositoryHandle,
        pathspecs: &[String],
    ) -> ProviderResult<Vec<String>> {
        let cwd = repo.workdir();
        let mut args = vec!["add", "-A", "--"];
        args.extend(pathspecs.iter().map(String::as_str));
        self.run(cwd, &args).await?;

        let mut args = vec!["diff", "--cached", "--name-only", "-z", "--"];
        args.extend(pathspecs.iter().map(String::as_str));
        let output = self.run(cwd, &args).await?;
        Ok(output
            .stdout()
            .split(|&b| b == 0)
            .filter(|p| !p.is_empty())
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect())
    }

    async fn commit(&self, repo: &RepositoryHandle, message: &str) -> ProviderResult<Oid> {
        let cwd = repo.workdir();
        let (staged, _) = self
            .run_allowing(cwd, &["diff", "--cached", "--quiet"])
            .await?;
        if staged.success() {
            return Err(ProviderError::NothingToCommit);
        }
        self.run(cwd, &["commit", "-q", "-m", message]).await?;
        let id = self.require_head(repo).await?;
        info!(commit = %id, "created commit");
        Ok(id)
    }

    async fn merge(
        &self,
        repo: &RepositoryHandle,
        target: &str,
        commit: &Oid,
    ) -> ProviderResult<StepOutcome> {
        let before = self.require_head(repo).await?;
        let message = merge_message(target);
        let (output, command) = self
            .run_allowing(
                repo.workdir(),
                &["merge", "--no-edit", "-m", &message, commit.as_str()],
            )
            .await?;

        if output.success() {
            let after = self.require_head(repo).await?;
            info!(target, commit = %after, "merged");
            return Ok(StepOutcome::Clean {
                commit: (after != before).then_some(after),
            });
        }
        let conflicts = self.conflicts(repo).await?;
        if conflicts.is_empty() {
            Err(Self::failure(command, &output))
        } else {
            Ok(StepOutcome::Conflicted(conflicts))
        }
    }

    async fn rebase_begin(
        &self,
        repo: &RepositoryHandle,
        upstream: &Oid,
    ) -> ProviderResult<RebasePlan> {
        let cwd = repo.workdir();
        let head = self.require_head(repo).await?;
        let (output, _) = self
            .run_allowing(cwd, &["merge-base", head.as_str(), upstream.as_str()])
            .await?;
        if !output.success() {
            return Err(ProviderError::backend("no common ancestor with upstream"));
        }
        let base = Oid::parse(&output.stdout_str())?;

        let (onto, commits) = if &base == upstream {
            (head.clone(), Vec::new())
        } else {
            let range = format!("{base}..{head}");
            let listed = self
                .text(cwd, &["rev-list", "--first-parent", "--reverse", &range])
                .await?;
            let commits = listed
                .lines()
                .map(Oid::parse)
                .collect::<ProviderResult<Vec<_>>>()?;
            (upstream.clone(), commits)
        };

        self.run(cwd, &["checkout", "-q", "--detach", onto.as_str()])
            .await?;
        debug!(onto = %onto, commits = commits.len(), "planned rebase");
        Ok(RebasePlan { onto, commits })
    }

    async fn rebase_step(&self, repo: &RepositoryHandle, commit: &Oid)
    -> ProviderResult<StepOutcome> {
        self.apply_commit(repo, commit).await
    }

    async fn rebase_finish(
        &self,
        repo: &RepositoryHandle,
        branch: Option<&str>,
    ) -> ProviderResult<()> {
        if let Some(branch) = branch {
            let cwd = repo.workdir();
            let reference = format!("refs/heads/{branch}");
            let message = format!("rebase (finish): returning to {reference}");
            self.run(cwd, &["update-ref", "-m", &message, &reference, "HEAD"])
                .await?;
            self.run(cwd, &["symbolic-ref", "-m", &message, "HEAD", &reference])
                .await?;
        }
        Ok(())
    }

    async fn cherry_pick(&self, repo: &RepositoryHandle, commit: &Oid)
    -> ProviderResult<StepOutcome> {
        self.apply_commit(repo, commit).await
    }

    async fn continue_active(
        &self,
        repo: &RepositoryHandle,
        kind: OperationKind,
        step: &Step,
        records: &[ConflictRecord],
    ) -> ProviderResult<Option<Oid>> {
        let cwd = repo.workdir();
        debug!(%kind, resolved = records.len(), "committing resolved step");

        if matches!(step, Step::Unpark { .. }) {
            // Resume leaves changes unstaged
            self.run(cwd, &["reset", "-q"]).await?;
            return Ok(None);
        }

        self.stage_resolved(repo, records).await?;
        if matches!(step, Step::Replay { .. } | Step::Pick { .. }) {
            let (staged, _) = self
                .run_allowing(cwd, &["diff", "--cached", "--quiet"])
                .await?;
            if staged.success() {
                if Self::sequencer_file(repo, "CHERRY_PICK_HEAD") {
                    self.run(cwd, &["cherry-pick", "--skip"]).await?;
                }
                return Ok(None);
            }
        }

        self.run(cwd, &["commit", "-q", "--no-edit", "--cleanup=strip"])
            .await?;
        Ok(Some(self.require_head(repo).await?))
    }

    async fn continue_native(
        &self,
        repo: &RepositoryHandle,
        kind: OperationKind,
        records: &[ConflictRecord],
    ) -> ProviderResult<StepOutcome> {
        debug!(%kind, resolved = records.len(), "continuing native sequencer");
        self.stage_resolved(repo, records).await?;
        let (output, command) = self
            .run_allowing(repo.workdir(), &["rebase", "--continue"])
            .await?;
        self.native_outcome(repo, &output, command).await
    }

    async fn abort_active(
        &self,
        repo: &RepositoryHandle,
        restore: &RestorePoint,
    ) -> ProviderResult<()> {
        let cwd = repo.workdir();
        match restore.native {
            Some(OperationKind::Rebase) => {
                self.run_allowing(cwd, &["rebase", "--abort"]).await?;
            }
            Some(OperationKind::Bisect) => {
                self.run_allowing(cwd, &["bisect", "reset"]).await?;
            }
            _ => {}
        }

        let head = restore.head.as_str();
        match &restore.branch {
            Some(branch) => {
                let reference = format!("refs/heads/{branch}");
                self.run(cwd, &["update-ref", "-m", "abort", &reference, head])
                    .await?;
                self.run(cwd, &["symbolic-ref", "-m", "abort", "HEAD", &reference])
                    .await?;
            }
            None => {
                self.run(cwd, &["update-ref", "--no-deref", "-m", "abort", "HEAD", head])
                    .await?;
            }
        }
        self.run(cwd, &["reset", "-q", "--hard", head]).await?;
        self.run(cwd, &["clean", "-fdq"]).await?;
        info!(head = %restore.head, branch = ?restore.branch, "restored repository");
        Ok(())
    }

    async fn stash_create(
        &self,
        repo: &RepositoryHandle,
        id: &str,
        label: &str,
    ) -> ProviderResult<Option<ParkPayload>> {
        if self.status(repo).await?.is_clean() {
            return Ok(None);
        }
        let cwd = repo.workdir();
        let message = format!("park: {label}");
        self.run(
            cwd,
            &["stash", "push", "--include-untracked", "-q", "-m", &message],
        )
        .await?;
        let commit = Oid::parse(&self.text(cwd, &["rev-parse", "-q", "--verify", "refs/stash"]).await?)?;

        let reference = ParkPayload::reference_for(id);
        self.run(cwd, &["update-ref", "-m", &message, &reference, commit.as_str()])
            .await?;
        self.run(cwd, &["stash", "drop", "-q"]).await?;
        info!(id, label, commit = %commit, "parked working tree");

        Ok(Some(ParkPayload {
            id: id.to_string(),
            reference,
            commit,
        }))
    }

    async fn stash_list(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<ParkPayload>> {
        let format = format!("--format={REF_FORMAT}");
        let output = self
            .text(repo.workdir(), &["for-each-ref", &format, PARK_REF_PREFIX])
            .await?;
        Ok(parse::parse_refs(&output)
            .into_iter()
            .filter_map(|(reference, commit)| {
                let id = reference.strip_prefix(PARK_REF_PREFIX)?.to_string();
                Some(ParkPayload {
                    id,
                    reference,
                    commit,
                })
            })
            .collect())
    }

    async fn stash_apply(
        &self,
        repo: &RepositoryHandle,
        payload: &ParkPayload,
    ) -> ProviderResult<StepOutcome> {
        let (output, command) = self
            .run_allowing(repo.workdir(), &["stash", "apply", "-q", payload.commit.as_str()])
            .await?;
        if output.success() {
            return Ok(StepOutcome::Clean { commit: None });
        }
        let conflicts = self.conflicts(repo).await?;
        if conflicts.is_empty() {
            Err(Self::failure(command, &output))
        } else {
            Ok(StepOutcome::Conflicted(conflicts))
        }
    }

    async fn stash_drop(&self, repo: &RepositoryHandle, payload: &ParkPayload)
    -> ProviderResult<()> {
        self.run(repo.workdir(), &["update-ref", "-d", &payload.reference])
            .await?;
        Ok(())
    }

    async fn fetch(
        &self,
        repo: &RepositoryHandle,
        remote: &str,
        refspecs: &[String],
    ) -> ProviderResult<()> {
        let mut args = vec!["fetch", "-q", remote];
        args.extend(refspecs.iter().map(String::as_str));
        self.run(repo.workdir(), &args).await?;
        Ok(())
    }

    async fn push(
        &self,
        repo: &RepositoryHandle,
        remote: &str,
        refspecs: &[String],
        force: bool,
    ) -> ProviderResult<()> {
        let mut args = vec!["push", "-q"];
        if force {
            args.push("--force-with-lease");
        }
        args.push(remote);
        args.extend(refspecs.iter().map(String::as_str));
        self.run(repo.workdir(), &args).await?;
        Ok(())
    }

    async fn interactive_rebase(
        &self,
        repo: &RepositoryHandle,
        onto: &Oid,
        todo: &str,
    ) -> ProviderResult<StepOutcome> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(todo.as_bytes())?;
        file.flush()?;
        let editor = format!("cp '{}'", file.path().display());

        let builder = self
            .command(repo.workdir(), &["rebase", "-i", onto.as_str()])?
            .env("GIT_SEQUENCE_EDITOR", editor)
            .flag(ProcessFlags::ALLOW_FAILURE);
        let command = builder.command_line();
        let output = self.exec(builder).await?;
        self.native_outcome(repo, &output, command).await
    }

    async fn bisect_start(
        &self,
        repo: &RepositoryHandle,
        bad: &str,
        good: &[String],
    ) -> ProviderResult<BisectOutcome> {
        let mut args = vec!["bisect", "start", bad];
        args.extend(good.iter().map(String::as_str));
        args.push("--");
        self.bisect(repo, &args).await
    }

    async fn bisect_mark(
        &self,
        repo: &RepositoryHandle,
        mark: BisectMark,
        rev: Option<&str>,
    ) -> ProviderResult<BisectOutcome> {
        let mark = mark.to_string();
        let mut args = vec!["bisect", mark.as_str()];
        args.extend(rev);
        self.bisect(repo, &args).await
    }

    async fn bisect_reset(&self, repo: &RepositoryHandle) -> ProviderResult<()> {
        self.run(repo.workdir(), &["bisect", "reset"]).await?;
        Ok(())
    }

    async fn worktree_add(
        &self,
        repo: &RepositoryHandle,
        path: &Path,
        branch: Option<&str>,
    ) -> ProviderResult<WorktreeInfo> {
        let cwd = repo.workdir();
        let path_arg = path.to_string_lossy();
        let args = match branch {
            Some(branch) => {
                let (exists, _) = self
                    .run_allowing(
                        cwd,
                        &["rev-parse", "-q", "--verify", &format!("refs/heads/{branch}")],
                    )
                    .await?;
                if exists.success() {
                    vec!["worktree", "add", "-q", path_arg.as_ref(), branch]
                } else {
                    vec!["worktree", "add", "-q", "-b", branch, path_arg.as_ref()]
                }
            }
            None => vec!["worktree", "add", "-q", "--detach", path_arg.as_ref()],
        };
        self.run(cwd, &args).await?;

        let head = Oid::parse(&self.text(path, &["rev-parse", "HEAD"]).await?)?;
        info!(path = %path.display(), ?branch, "added worktree");
        Ok(WorktreeInfo {
            path: std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
            head: Some(head),
            branch: branch.map(str::to_string),
        })
    }

    async fn worktree_list(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<WorktreeInfo>> {
        let output = self
            .text(repo.workdir(), &["worktree", "list", "--porcelain"])
            .await?;
        Ok(parse::parse_worktrees(&output))
    }

    async fn worktree_remove(
        &self,
        repo: &RepositoryHandle,
        path: &Path,
        force: bool,
    ) -> ProviderResult<()> {
        let path_arg = path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(path_arg.as_ref());
        self.run(repo.workdir(), &args).await?;
        Ok(())
    }

    async fn submodule_add(
        &self,
        repo: &RepositoryHandle,
        url: &str,
        path: &str,
    ) -> ProviderResult<()> {
        let mut args: Vec<&str> = ALLOW_FILE_PROTOCOL.into_iter().collect();
        args.extend(["submodule", "--quiet", "add", "--", url, path]);
        self.run(repo.workdir(), &args).await?;
        info!(url, path, "added submodule");
        Ok(())
    }

    async fn submodule_update(&self, repo: &RepositoryHandle, init: bool) -> ProviderResult<()> {
        let mut args: Vec<&str> = ALLOW_FILE_PROTOCOL.into_iter().collect();
        args.extend(["submodule", "--quiet", "update", "--recursive"]);
        if init {
            args.push("--init");
        }
        self.run(repo.workdir(), &args).await?;
        Ok(())
    }

    async fn submodule_list(&self, repo: &RepositoryHandle) -> ProviderResult<Vec<SubmoduleInfo>> {
        let output = self.text(repo.workdir(), &["submodule", "status"]).await?;
        Ok(parse::parse_submodules(&output))
    }
}

#[cfg(test)]
mod tests;
