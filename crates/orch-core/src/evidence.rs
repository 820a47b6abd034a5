//! Git evidence for the review packet.
//!
//! Every query is best-effort: a failing `git` invocation becomes an inline
//! `[ERROR: …]` string in the snapshot and never aborts packet generation.
//!
//! Two cases are served without the caller choosing between them:
//! - mid-change: the working tree has an uncommitted diff, which is the evidence;
//! - post-commit: the diff is empty (or errored), so recent history is
//!   collected instead.

use std::path::Path;
use std::process::Command;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Prefix of every inline evidence failure.
pub const ERROR_MARKER: &str = "[ERROR";

const RECENT_LOG_LIMIT: &str = "5";
const FILE_LOG_LIMIT: &str = "10";

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("git executable not found on PATH")]
    GitMissing,

    #[error("failed to spawn `git {args}`: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {args}` exited with {code}: {stderr}")]
    Failed {
        args: String,
        code: String,
        stderr: String,
    },
}

/// Snapshot of repository state at packet-generation time.
///
/// `history` is either absent (a live diff exists) or fully attempted
/// (diff empty or errored); its three parts are never collected piecemeal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub status: String,
    pub diff: String,
    pub history: Option<History>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct History {
    /// `git log -n 5 --oneline`
    pub log_recent: String,
    /// One entry per touched file that exists and has non-error history.
    pub log_files: Vec<FileLog>,
    /// `git show --name-only --oneline HEAD`
    pub show_head: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLog {
    pub path: String,
    pub log: String,
}

impl FileLog {
    pub fn render(&self) -> String {
        format!("File: {}\n{}", self.path, self.log)
    }
}

impl Evidence {
    pub fn is_error(text: &str) -> bool {
        text.starts_with(ERROR_MARKER)
    }

    /// True when the diff is real, non-empty evidence.
    pub fn has_live_diff(&self) -> bool {
        diff_is_live(&self.diff)
    }
}

fn diff_is_live(diff: &str) -> bool {
    !diff.trim().is_empty() && !Evidence::is_error(diff)
}

/// Collect status + diff for `repo_root`, falling back to history when the
/// working tree has no diff to show.
pub fn collect(repo_root: &Path, touched_files: &[String]) -> Evidence {
    let status = inline(git(repo_root, &["status"]));
    let diff = inline(git(repo_root, &["diff"]));

    if diff_is_live(&diff) {
        debug!(root = %repo_root.display(), "live diff present, skipping history");
        return Evidence {
            status,
            diff,
            history: None,
        };
    }

    let log_recent = inline(git(
        repo_root,
        &["log", "-n", RECENT_LOG_LIMIT, "--oneline"],
    ));

    let mut log_files = Vec::new();
    for file in touched_files {
        if !repo_root.join(file).exists() {
            debug!(file = %file, "touched file not on disk, skipping its log");
            continue;
        }
        let log = inline(git(
            repo_root,
            &["log", "-n", FILE_LOG_LIMIT, "--oneline", "--", file],
        ));
        if !log.is_empty() && !Evidence::is_error(&log) {
            log_files.push(FileLog {
                path: file.clone(),
                log,
            });
        }
    }

    let show_head = inline(git(
        repo_root,
        &["show", "--name-only", "--oneline", "HEAD"],
    ));

    Evidence {
        status,
        diff,
        history: Some(History {
            log_recent,
            log_files,
            show_head,
        }),
    }
}

/// Flatten a query outcome into evidence text.
fn inline(outcome: Result<String, EvidenceError>) -> String {
    match outcome {
        Ok(text) => text,
        Err(e) => format!("[ERROR: {e}]"),
    }
}

/// Run `git <args>` in `cwd` and return trimmed stdout.
fn git(cwd: &Path, args: &[&str]) -> Result<String, EvidenceError> {
    let exe = which::which("git").map_err(|_| EvidenceError::GitMissing)?;
    let joined = args.join(" ");
    debug!(cwd = %cwd.display(), args = %joined, "collecting git evidence");

    let output = Command::new(exe)
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|source| EvidenceError::Spawn {
            args: joined.clone(),
            source,
        })?;

    if !output.status.success() {
        let code = output
            .status
            .code()
            .map(|c| format!("code {c}"))
            .unwrap_or_else(|| "signal".to_string());
        return Err(EvidenceError::Failed {
            args: joined,
            code,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
