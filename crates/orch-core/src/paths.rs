use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Artifact names
// ---------------------------------------------------------------------------

// Builder artifacts keep the `claude.` prefix and reviewer artifacts the
// `codex.` prefix; downstream tooling reads runs by these names.
pub const TICKET_MD: &str = "ticket.md";
pub const BUILDER_PROMPT: &str = "claude.prompt.txt";
pub const REVIEWER_PROMPT: &str = "codex.prompt.txt";
pub const RUN_MD: &str = "run.md";
pub const REVIEW_PACKET: &str = "review.packet.md";
pub const BUILDER_OUTPUT: &str = "claude.output.md";
pub const VERDICT_FILE: &str = "codex.verdict.txt";
pub const EXEC_LOG: &str = "exec.log";

pub const DEFAULT_RUNS_DIR: &str = "audit/runs";
pub const VCS_MARKER: &str = ".git";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Ticket id: the file's base name without its extension.
pub fn ticket_id(ticket_path: &Path) -> String {
    ticket_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn run_dir(runs_root: &Path, ticket_id: &str) -> PathBuf {
    runs_root.join(ticket_id)
}

pub fn artifact_path(run_dir: &Path, name: &str) -> PathBuf {
    run_dir.join(name)
}

/// Make `path` absolute against `cwd` without touching the filesystem.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
