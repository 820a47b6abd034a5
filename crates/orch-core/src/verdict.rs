use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{OrchError, Result};

/// The reviewer's decision on a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Approved,
    Blocked,
    Escalate,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approved => "APPROVED",
            Verdict::Blocked => "BLOCKED",
            Verdict::Escalate => "ESCALATE",
        }
    }

    /// Process exit code for a completed review.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Approved => 0,
            Verdict::Blocked => 1,
            Verdict::Escalate => 2,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const EXCERPT_LEN: usize = 200;

static VERDICT_RE: OnceLock<Regex> = OnceLock::new();

fn verdict_re() -> &'static Regex {
    VERDICT_RE.get_or_init(|| {
        Regex::new(r"(?i)VERDICT: ?(APPROVED|BLOCKED|ESCALATE)").expect("static regex")
    })
}

/// Scan a raw reviewer response for a `VERDICT: <value>` marker.
///
/// Matching is case-insensitive and allows zero or one space after the
/// colon. If several markers appear, APPROVED beats BLOCKED beats ESCALATE.
pub fn parse_verdict(response: &str) -> Result<Verdict> {
    let mut found: Vec<Verdict> = verdict_re()
        .captures_iter(response)
        .filter_map(|c| match c[1].to_ascii_uppercase().as_str() {
            "APPROVED" => Some(Verdict::Approved),
            "BLOCKED" => Some(Verdict::Blocked),
            "ESCALATE" => Some(Verdict::Escalate),
            _ => None,
        })
        .collect();
    found.sort_by_key(|v| v.exit_code());
    found
        .first()
        .copied()
        .ok_or_else(|| OrchError::VerdictUnparseable {
            excerpt: response.chars().take(EXCERPT_LEN).collect(),
        })
}

/// Body of `codex.verdict.txt`.
pub fn render_verdict_artifact(verdict: Verdict, raw_response: &str) -> String {
    format!("VERDICT: {verdict}\n\n---\nFull Response:\n\n{raw_response}")
}
