// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::Result;
use bon::Builder;
use flume::unbounded;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{trace, warn};

/// Name of the repository directory (or gitfile) that is never scanned.
const GIT_DIR_NAME: &str = ".git";

/// Options for parallel directory traversal.
#[derive(Debug, Clone, Builder)]
pub struct WalkOptions {
    /// Include hidden files/directories
    #[builder(setters(name = with_include_hidden), default = true)]
    include_hidden: bool,
    /// Respect .gitignore, info/exclude and the global excludes file
    #[builder(setters(name = with_respect_gitignore), default = true)]
    respect_gitignore: bool,
    /// Number of threads (None = auto-detect based on CPU count)
    #[builder(setters(name = with_threads))]
    threads: Option<usize>,
    /// Skip entries matching these names (exact match)
    #[builder(setters(name = with_skip_names), default = vec![GIT_DIR_NAME.to_string()])]
    skip_names: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WalkOptions {
    /// Returns whether to include hidden files/directories.
    #[must_use]
    pub const fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Returns whether to respect ignore files.
    #[must_use]
    pub const fn respect_gitignore(&self) -> bool {
        self.respect_gitignore
    }

    /// Returns the number of threads (None = auto-detect).
    #[must_use]
    pub const fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Returns the skipped entry names.
    #[must_use]
    pub fn skip_names(&self) -> &[String] {
        &self.skip_names
    }
}

/// Result of a working-tree scan.
#[derive(Debug, Default)]
pub struct WalkResult {
    /// Paths relative to the scanned root, `/`-separated, sorted.
    files: Vec<String>,
    error_count: usize,
}

impl WalkResult {
    /// Returns the files found during traversal.
    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Consumes the result, returning the files.
    #[must_use]
    pub fn into_files(self) -> Vec<String> {
        self.files
    }

    /// Returns the number of errors encountered.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.error_count
    }
}

/// Builds a `WalkBuilder` with the given options.
fn build_walker(root: &Path, options: &WalkOptions) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);

    builder.follow_links(false);
    builder.hidden(!options.include_hidden());
    // Only git's own ignore rules apply to a working tree
    builder.ignore(false);
    builder.parents(options.respect_gitignore());
    builder.git_ignore(options.respect_gitignore());
    builder.git_global(options.respect_gitignore());
    builder.git_exclude(options.respect_gitignore());

    if let Some(threads) = options.threads() {
        builder.threads(threads);
    }

    if !options.skip_names().is_empty() {
        let skip: Arc<Vec<String>> = Arc::new(options.skip_names().to_vec());
        builder.filter_entry(move |entry| {
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !skip.iter().any(|s| s == name))
        });
    }

    builder
}

/// Converts an absolute entry path into a `/`-separated path relative to `root`.
#[must_use]
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Lists every file and symlink in a working tree.
///
/// Hidden files are included, `.git` is skipped and ignore rules are
/// honored. Paths come back relative to `root`, sorted.
///
/// # Errors
///
/// Returns an error if the root directory does not exist.
pub fn scan_worktree<P: AsRef<Path>>(root: P, options: &WalkOptions) -> Result<WalkResult> {
    let root = root.as_ref();

    if !root.is_dir() {
        anyhow::bail!("root directory does not exist: {}", root.display());
    }

    let (file_tx, file_rx) = unbounded::<String>();
    let error_count = Arc::new(AtomicUsize::new(0));
    let root_path = root.to_path_buf();

    build_walker(root, options).build_parallel().run(|| {
        let file_tx = file_tx.clone();
        let error_count = Arc::clone(&error_count);
        let root_path = root_path.clone();

        Box::new(move |entry_result| {
            match entry_result {
                Ok(entry) => {
                    let is_leaf = entry
                        .file_type()
                        .is_some_and(|ft| ft.is_file() || ft.is_symlink());
                    if is_leaf && let Some(rel) = relative_slash_path(&root_path, entry.path()) {
                        let _ = file_tx.send(rel);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "walk error");
                    error_count.fetch_add(1, Ordering::Relaxed);
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(file_tx);

    let mut files: Vec<String> = file_rx.iter().collect();
    files.sort_unstable();
    trace!(root = %root.display(), files = files.len(), "scanned worktree");

    Ok(WalkResult {
        files,
        error_count: error_count.load(Ordering::Relaxed),
    })
}

/// Expands pathspecs against a set of candidate paths.
///
/// A spec selects a candidate when it names the path exactly, names one of
/// its parent directories, is `.`, or is a glob matching it. Returns the
/// selected candidates sorted and deduplicated; specs that select nothing are
/// returned separately.
///
/// # Errors
///
/// Returns an error if a glob pattern is invalid.
pub fn match_pathspecs<'a, I, S>(candidates: I, specs: &[S]) -> Result<(Vec<String>, Vec<String>)>
where
    I: IntoIterator<Item = &'a String>,
    S: AsRef<str>,
{
    use wax::{Glob, Program};

    enum Spec {
        All,
        Prefix(String),
        Pattern(Glob<'static>),
    }

    let mut compiled = Vec::with_capacity(specs.len());
    for spec in specs {
        let raw = spec.as_ref().trim_start_matches("./");
        let raw = raw.trim_end_matches('/');
        let parsed = if raw.is_empty() || raw == "." {
            Spec::All
        } else if raw.contains(['*', '?', '[', '{']) {
            Spec::Pattern(
                Glob::new(raw)
                    .map_err(|e| anyhow::anyhow!("invalid pathspec '{raw}': {e}"))?
                    .into_owned(),
            )
        } else {
            Spec::Prefix(raw.to_string())
        };
        compiled.push((spec.as_ref().to_string(), parsed, false));
    }

    let mut selected = Vec::new();
    for candidate in candidates {
        for (_, spec, hit) in &mut compiled {
            let matched = match spec {
                Spec::All => true,
                Spec::Prefix(prefix) => {
                    candidate == prefix
                        || candidate
                            .strip_prefix(prefix.as_str())
                            .is_some_and(|rest| rest.starts_with('/'))
                }
                Spec::Pattern(glob) => glob.is_match(Path::new(candidate)),
            };
            if matched {
                *hit = true;
                selected.push(candidate.clone());
            }
        }
    }

    selected.sort_unstable();
    selected.dedup();
    let unmatched = compiled
        .into_iter()
        .filter(|(_, _, hit)| !hit)
        .map(|(raw, _, _)| raw)
        .collect();
    Ok((selected, unmatched))
}

/// Joins a `/`-separated relative path onto `root`.
#[must_use]
pub fn join_relative(root: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}
