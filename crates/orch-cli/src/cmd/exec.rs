use anyhow::Context;
use orch_agents::{AnthropicBuilder, OpenAiReviewer, ANTHROPIC_API_KEY_ENV, OPENAI_API_KEY_ENV};
use orch_core::paths::{self, EXEC_LOG};
use orch_core::{execute, ExecOutcome, ExecPhase, ExecRequest, Verdict, FAILURE_EXIT_CODE};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::output::print_json;
use crate::root::{self, Settings};

// ---------------------------------------------------------------------------
// CliExit — typed non-zero exit codes (no std::process::exit in command code)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum CliExit {
    MissingCredential(&'static str),
    Verdict(Verdict),
    ExecFailed { log: PathBuf },
}

impl CliExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliExit::MissingCredential(_) => FAILURE_EXIT_CODE,
            CliExit::Verdict(v) => v.exit_code(),
            CliExit::ExecFailed { .. } => FAILURE_EXIT_CODE,
        }
    }
}

impl std::fmt::Display for CliExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliExit::MissingCredential(var) => {
                write!(f, "{var} environment variable is required")
            }
            CliExit::Verdict(v) => write!(f, "review verdict: {v}"),
            CliExit::ExecFailed { log } => {
                write!(f, "execution failed; see {}", log.display())
            }
        }
    }
}

impl std::error::Error for CliExit {}

// ---------------------------------------------------------------------------
// exec
// ---------------------------------------------------------------------------

/// Run the full build/review protocol for one ticket.
///
/// Builder output streams to stdout; with `--json` it goes to stderr so the
/// final JSON document is the only thing on stdout.
pub fn run(settings: &Settings, ticket: &Path, json: bool) -> anyhow::Result<()> {
    // Both credentials are checked before anything touches the runs root.
    let anthropic_key = require_env(ANTHROPIC_API_KEY_ENV)?;
    let openai_key = require_env(OPENAI_API_KEY_ENV)?;

    let builder = AnthropicBuilder::new(anthropic_key, &settings.config.builder)
        .context("failed to initialise builder client")?;
    let reviewer = OpenAiReviewer::new(openai_key, &settings.config.reviewer)
        .context("failed to initialise reviewer client")?;

    let req = ExecRequest {
        runs_root: settings.runs_root.clone(),
        ticket_path: root::ticket_path(ticket)?,
        builder_model: settings.config.builder.model.clone(),
        reviewer_model: settings.config.reviewer.model.clone(),
    };

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let outcome = rt
        .block_on(async {
            if json {
                execute(&req, &builder, &reviewer, &mut std::io::stderr()).await
            } else {
                execute(&req, &builder, &reviewer, &mut std::io::stdout()).await
            }
        })
        .with_context(|| format!("failed to execute {}", req.ticket_path.display()))?;

    report(&outcome, json)?;

    match (outcome.phase, outcome.verdict) {
        (ExecPhase::Failed, _) => Err(CliExit::ExecFailed {
            log: paths::artifact_path(&outcome.run_dir, EXEC_LOG),
        }
        .into()),
        (_, Verdict::Approved) => Ok(()),
        (_, verdict) => Err(CliExit::Verdict(verdict).into()),
    }
}

fn require_env(var: &'static str) -> anyhow::Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CliExit::MissingCredential(var).into()),
    }
}

fn report(outcome: &ExecOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(outcome);
    }
    let mut out = std::io::stdout().lock();
    if outcome.phase == ExecPhase::Done {
        writeln!(out, "Verdict: {}", outcome.verdict)?;
    }
    writeln!(out, "Run directory: {}", outcome.run_dir.display())?;
    Ok(())
}
