//! Run-pack generation.
//!
//! `create_run_pack` turns one ticket plus live repository state into the
//! artifact set under `<runs_root>/<ticket_id>/`. It is safe to call any
//! number of times: every artifact is recomputed and overwritten whole. With
//! an unchanged ticket, repository and builder output, only the review
//! packet's `Generated:` line differs between calls.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{OrchError, Result};
use crate::evidence::{self, Evidence};
use crate::io::{atomic_write, ensure_dir};
use crate::paths;
use crate::prompts::{self, PromptInput};
use crate::repo_root::find_repo_root;

pub const BUILDER_OUTPUT_PLACEHOLDER: &str =
    "(claude.output.md not present: the builder has not run yet, so this run is incomplete)";

/// Result of a run-pack generation.
#[derive(Debug, Clone, Serialize)]
pub struct RunPack {
    pub ticket_id: String,
    pub run_dir: PathBuf,
    pub files_written: Vec<PathBuf>,
}

impl RunPack {
    pub fn artifact(&self, name: &str) -> PathBuf {
        paths::artifact_path(&self.run_dir, name)
    }
}

/// Produce or refresh the full artifact set for `ticket_path`.
pub fn create_run_pack(runs_root: &Path, ticket_path: &Path) -> Result<RunPack> {
    if !ticket_path.is_file() {
        return Err(OrchError::TicketNotFound(ticket_path.to_path_buf()));
    }
    let ticket_md = std::fs::read_to_string(ticket_path)?;
    let ticket_id = paths::ticket_id(ticket_path);
    let run_dir = paths::run_dir(runs_root, &ticket_id);
    ensure_dir(&run_dir)?;

    let refs = prompts::default_refs();
    let input = PromptInput {
        ticket_id: &ticket_id,
        ticket_md: &ticket_md,
        refs: &refs,
    };
    let builder_prompt = prompts::build_builder_prompt(input);
    let reviewer_prompt = prompts::build_reviewer_prompt(input);

    let mut files_written = Vec::with_capacity(5);
    for (name, body) in [
        (paths::TICKET_MD, ticket_md.as_str()),
        (paths::BUILDER_PROMPT, builder_prompt.as_str()),
        (paths::REVIEWER_PROMPT, reviewer_prompt.as_str()),
    ] {
        files_written.push(write_artifact(&run_dir, name, body)?);
    }
    let run_md = render_run_md(&ticket_id, &run_dir, ticket_path);
    files_written.push(write_artifact(&run_dir, paths::RUN_MD, &run_md)?);

    let ticket_dir = ticket_path.parent().unwrap_or(Path::new("."));
    let repo_root =
        find_repo_root(ticket_dir).map_err(|source| OrchError::RepoRootNotFound {
            start: ticket_dir.to_path_buf(),
            source,
        })?;

    let touched_files = extract_touched_files(&ticket_md);
    debug!(ticket = %ticket_id, files = ?touched_files, "touched files");
    let evidence = evidence::collect(&repo_root, &touched_files);

    let output_path = paths::artifact_path(&run_dir, paths::BUILDER_OUTPUT);
    let builder_output = if output_path.is_file() {
        Some(std::fs::read_to_string(&output_path)?)
    } else {
        None
    };

    let packet = render_review_packet(&PacketContext {
        ticket_id: &ticket_id,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        ticket_path,
        repo_root: &repo_root,
        touched_files: &touched_files,
        ticket_md: &ticket_md,
        builder_prompt: &builder_prompt,
        reviewer_prompt: &reviewer_prompt,
        evidence: &evidence,
        builder_output: builder_output.as_deref(),
    });
    files_written.push(write_artifact(&run_dir, paths::REVIEW_PACKET, &packet)?);

    info!(
        ticket = %ticket_id,
        run_dir = %run_dir.display(),
        live_diff = evidence.has_live_diff(),
        builder_output = builder_output.is_some(),
        "run pack written"
    );

    Ok(RunPack {
        ticket_id,
        run_dir,
        files_written,
    })
}

fn write_artifact(run_dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = paths::artifact_path(run_dir, name);
    atomic_write(&path, body.as_bytes())?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Touched files
// ---------------------------------------------------------------------------

static FILES_TOUCHED_RE: OnceLock<Regex> = OnceLock::new();

fn files_touched_re() -> &'static Regex {
    FILES_TOUCHED_RE
        .get_or_init(|| Regex::new(r"(?i)^##\s+files\s+touched\b").expect("static regex"))
}

/// Paths listed as bullets under a `## Files touched` heading.
///
/// Collection stops at the next `##` heading. Only the first token of each
/// bullet is taken, so `- src/a.rs (new)` yields `src/a.rs`. A `None`
/// bullet and duplicates are dropped. No section means an empty list.
pub fn extract_touched_files(ticket_md: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    let mut in_section = false;

    for line in ticket_md.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("##") {
            if in_section {
                break;
            }
            in_section = files_touched_re().is_match(trimmed);
            continue;
        }
        if !in_section {
            continue;
        }
        let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        else {
            continue;
        };
        let Some(token) = rest.split_whitespace().next() else {
            continue;
        };
        let token = token.trim_matches('`');
        if token.is_empty() || token.eq_ignore_ascii_case("none") {
            continue;
        }
        if !files.iter().any(|f| f == token) {
            files.push(token.to_string());
        }
    }

    files
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_run_md(ticket_id: &str, run_dir: &Path, ticket_path: &Path) -> String {
    let rows = [
        (paths::TICKET_MD, "run", "verbatim copy of the ticket"),
        (paths::BUILDER_PROMPT, "run", "builder prompt"),
        (paths::REVIEWER_PROMPT, "run", "reviewer prompt"),
        (paths::RUN_MD, "run", "this summary"),
        (
            paths::REVIEW_PACKET,
            "run",
            "ticket, prompts, git evidence and builder output for review",
        ),
        (paths::BUILDER_OUTPUT, "exec (build phase)", "builder response"),
        (paths::VERDICT_FILE, "exec (review phase)", "verdict + full reviewer response"),
        (paths::EXEC_LOG, "exec", "append-only execution log"),
    ];

    let mut lines = vec![
        format!("# Run Pack — {ticket_id}"),
        String::new(),
        format!("Run directory: {}", run_dir.display()),
        format!("Ticket source: {}", ticket_path.display()),
        String::new(),
        "## Artifacts".to_string(),
        String::new(),
        "| file | written by | contents |".to_string(),
        "|------|------------|----------|".to_string(),
    ];
    lines.extend(
        rows.iter()
            .map(|(file, phase, what)| format!("| `{file}` | {phase} | {what} |")),
    );
    lines.push(String::new());
    lines.join("\n")
}

struct PacketContext<'a> {
    ticket_id: &'a str,
    generated_at: String,
    ticket_path: &'a Path,
    repo_root: &'a Path,
    touched_files: &'a [String],
    ticket_md: &'a str,
    builder_prompt: &'a str,
    reviewer_prompt: &'a str,
    evidence: &'a Evidence,
    builder_output: Option<&'a str>,
}

fn render_review_packet(ctx: &PacketContext<'_>) -> String {
    let touched = if ctx.touched_files.is_empty() {
        "(none declared)".to_string()
    } else {
        ctx.touched_files.join(", ")
    };

    let mut out = vec![
        format!("# Review Packet — {}", ctx.ticket_id),
        String::new(),
        format!("Generated: {}", ctx.generated_at),
        format!("Ticket source: {}", ctx.ticket_path.display()),
        format!("Repository root: {}", ctx.repo_root.display()),
        format!("Touched files: {touched}"),
        String::new(),
        "---".into(),
        "## Ticket".into(),
        String::new(),
        ctx.ticket_md.to_string(),
        String::new(),
        "---".into(),
        format!("## Builder prompt ({})", paths::BUILDER_PROMPT),
        String::new(),
        ctx.builder_prompt.to_string(),
        String::new(),
        "---".into(),
        format!("## Reviewer prompt ({})", paths::REVIEWER_PROMPT),
        String::new(),
        ctx.reviewer_prompt.to_string(),
        String::new(),
        "---".into(),
        "## Git evidence".into(),
        String::new(),
        "### git status".into(),
        String::new(),
        fenced(&ctx.evidence.status),
        String::new(),
        "### git diff".into(),
        String::new(),
        fenced(&ctx.evidence.diff),
        String::new(),
    ];

    if let Some(history) = &ctx.evidence.history {
        out.extend([
            "### git log -n 5 --oneline".into(),
            String::new(),
            fenced(&history.log_recent),
            String::new(),
            "### git log per touched file".into(),
            String::new(),
        ]);
        if history.log_files.is_empty() {
            out.push("(no history for touched files)".into());
            out.push(String::new());
        } else {
            for file_log in &history.log_files {
                out.push(fenced(&file_log.render()));
                out.push(String::new());
            }
        }
        out.extend([
            "### git show --name-only --oneline HEAD".into(),
            String::new(),
            fenced(&history.show_head),
            String::new(),
        ]);
    }

    out.extend([
        "---".into(),
        format!("## Builder output ({})", paths::BUILDER_OUTPUT),
        String::new(),
        ctx.builder_output
            .unwrap_or(BUILDER_OUTPUT_PLACEHOLDER)
            .to_string(),
        String::new(),
    ]);

    out.join("\n")
}

/// Fence `text` literally, using a fence longer than any backtick run it
/// contains. Blank text renders as `(empty)`.
fn fenced(text: &str) -> String {
    let body = if text.trim().is_empty() { "(empty)" } else { text };
    let longest = body
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest.max(2) + 1);
    format!("{fence}\n{body}\n{fence}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
