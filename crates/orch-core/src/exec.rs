//! The two-phase build → review protocol.
//!
//! ```text
//! Init ─► PackGenerated ─► BuilderCalled ─► PacketRegenerated ─► ReviewerCalled ─► Done
//!              │                 │                  │                    │
//!              └─────────────────┴──────────────────┴────────────────────┴─► Failed
//! ```
//!
//! A failure before the run directory exists is returned as an error. Once
//! it exists, every failure is logged to `exec.log` (redacted) and reported
//! as a synthetic BLOCKED outcome with exit code 3.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::capability::{BuildCapability, ReviewCapability};
use crate::error::Result;
use crate::io::{append_text, atomic_write, read_artifact};
use crate::paths;
use crate::redact::sanitize;
use crate::runpack::{create_run_pack, RunPack};
use crate::verdict::{parse_verdict, render_verdict_artifact, Verdict};

/// Exit code for any fatal, setup or unexpected failure.
pub const FAILURE_EXIT_CODE: i32 = 3;

const EVIDENCE_HEADING: &str = "## Evidence and Builder Output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecPhase {
    Init,
    PackGenerated,
    BuilderCalled,
    PacketRegenerated,
    ReviewerCalled,
    Done,
    Failed,
}

impl fmt::Display for ExecPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecPhase::Init => "init",
            ExecPhase::PackGenerated => "pack_generated",
            ExecPhase::BuilderCalled => "builder_called",
            ExecPhase::PacketRegenerated => "packet_regenerated",
            ExecPhase::ReviewerCalled => "reviewer_called",
            ExecPhase::Done => "done",
            ExecPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Inputs for one `exec` invocation.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub runs_root: PathBuf,
    pub ticket_path: PathBuf,
    pub builder_model: String,
    pub reviewer_model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecOutcome {
    pub verdict: Verdict,
    pub exit_code: i32,
    pub run_dir: PathBuf,
    /// `Done` or `Failed`.
    pub phase: ExecPhase,
}

// ---------------------------------------------------------------------------
// ExecLog
// ---------------------------------------------------------------------------

/// Append-only `exec.log` for one run directory.
///
/// Every line is redacted before it is written. A failed append is traced
/// and otherwise ignored so logging can never change the run's outcome.
pub struct ExecLog {
    path: PathBuf,
}

impl ExecLog {
    pub fn new(run_dir: &Path) -> Self {
        Self {
            path: paths::artifact_path(run_dir, paths::EXEC_LOG),
        }
    }

    pub fn info(&self, message: &str) {
        let message = sanitize(message);
        info!("{message}");
        self.append(&message);
    }

    pub fn error(&self, context: &str, detail: &dyn fmt::Display) {
        let message = sanitize(&format!("ERROR: {context} - {detail}"));
        error!("{message}");
        self.append(&message);
    }

    fn append(&self, message: &str) {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        if let Err(e) = append_text(&self.path, &format!("[{ts}] {message}\n")) {
            warn!(path = %self.path.display(), error = %e, "failed to append to exec log");
        }
    }
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

/// Run the full protocol for one ticket.
///
/// Builder output is echoed to `terminal` as it streams. Returns `Err` only
/// when the initial run pack cannot be generated.
pub async fn execute<B, R, W>(
    req: &ExecRequest,
    builder: &B,
    reviewer: &R,
    terminal: &mut W,
) -> Result<ExecOutcome>
where
    B: BuildCapability,
    R: ReviewCapability,
    W: Write,
{
    info!(
        phase = %ExecPhase::Init,
        ticket = %req.ticket_path.display(),
        "Step 1: generating run pack"
    );
    let pack = create_run_pack(&req.runs_root, &req.ticket_path)?;

    let log = ExecLog::new(&pack.run_dir);
    log.info(&format!("Run directory: {}", pack.run_dir.display()));
    log.info("Run pack generated successfully");

    let mut phase = ExecPhase::PackGenerated;
    match run_phases(req, &pack, &log, builder, reviewer, terminal, &mut phase).await {
        Ok(verdict) => {
            log.info(&format!(
                "Execution complete. Exit code: {}",
                verdict.exit_code()
            ));
            Ok(ExecOutcome {
                verdict,
                exit_code: verdict.exit_code(),
                run_dir: pack.run_dir,
                phase: ExecPhase::Done,
            })
        }
        Err(e) => {
            log.error(&format!("Execution failed after phase {phase}"), &e);
            Ok(ExecOutcome {
                verdict: Verdict::Blocked,
                exit_code: FAILURE_EXIT_CODE,
                run_dir: pack.run_dir,
                phase: ExecPhase::Failed,
            })
        }
    }
}

async fn run_phases<B, R, W>(
    req: &ExecRequest,
    pack: &RunPack,
    log: &ExecLog,
    builder: &B,
    reviewer: &R,
    terminal: &mut W,
    phase: &mut ExecPhase,
) -> Result<Verdict>
where
    B: BuildCapability,
    R: ReviewCapability,
    W: Write,
{
    // PackGenerated → BuilderCalled
    let builder_prompt = read_artifact(&pack.artifact(paths::BUILDER_PROMPT))?;
    log.info(&format!("Step 2: calling builder ({})", req.builder_model));

    let output = builder
        .build(&builder_prompt, &req.builder_model)
        .collect_into(terminal)
        .await?;
    if let Err(e) = writeln!(terminal) {
        warn!(error = %e, "failed to write to terminal");
    }

    atomic_write(&pack.artifact(paths::BUILDER_OUTPUT), output.text.as_bytes())?;
    log.info(&format!("Builder output written to {}", paths::BUILDER_OUTPUT));
    if let Some(usage) = output.usage {
        log.info(&format!(
            "Builder usage: input_tokens={} output_tokens={}",
            usage.input_tokens, usage.output_tokens
        ));
    }
    *phase = ExecPhase::BuilderCalled;

    // BuilderCalled → PacketRegenerated
    log.info("Step 3: regenerating review packet with builder output");
    let regenerated = create_run_pack(&req.runs_root, &req.ticket_path)?;
    log.info("Review packet updated");
    *phase = ExecPhase::PacketRegenerated;

    // PacketRegenerated → ReviewerCalled
    let packet = read_artifact(&regenerated.artifact(paths::REVIEW_PACKET))?;
    let reviewer_prompt = read_artifact(&regenerated.artifact(paths::REVIEWER_PROMPT))?;
    let submission = [
        reviewer_prompt.as_str(),
        "",
        "---",
        EVIDENCE_HEADING,
        "",
        packet.as_str(),
    ]
    .join("\n");

    log.info(&format!("Step 4: calling reviewer ({})", req.reviewer_model));
    let raw = reviewer.review(&submission, &req.reviewer_model).await?;
    let verdict = parse_verdict(&raw)?;
    *phase = ExecPhase::ReviewerCalled;

    // ReviewerCalled → Done
    atomic_write(
        &regenerated.artifact(paths::VERDICT_FILE),
        render_verdict_artifact(verdict, &raw).as_bytes(),
    )?;
    log.info(&format!("Verdict: {verdict}"));
    log.info(&format!("Verdict written to {}", paths::VERDICT_FILE));

    Ok(verdict)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
