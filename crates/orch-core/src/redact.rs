//! Credential scrubbing for anything written to `exec.log`.

use regex::Regex;
use std::sync::OnceLock;

pub const REDACTED: &str = "[REDACTED]";

/// A credential shape and how much of each match to keep.
struct Pattern {
    regex: &'static str,
    /// Capture group preserved ahead of the redaction marker (0 = none).
    keep_prefix_group: usize,
}

const PATTERNS: &[Pattern] = &[
    // OpenAI and Anthropic keys: sk-..., sk-proj-..., sk-ant-api03-...
    Pattern {
        regex: r"sk-[A-Za-z0-9_-]{8,}",
        keep_prefix_group: 0,
    },
    Pattern {
        regex: r"(?i)(bearer\s+)[A-Za-z0-9._~+/-]+=*",
        keep_prefix_group: 1,
    },
    Pattern {
        regex: r#"(?i)((?:x-api-key|api[_-]?key)["']?\s*[:=]\s*["']?)[A-Za-z0-9._-]{8,}"#,
        keep_prefix_group: 1,
    },
];

static COMPILED: OnceLock<Vec<(Regex, usize)>> = OnceLock::new();

fn compiled() -> &'static [(Regex, usize)] {
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p.regex).ok().map(|r| (r, p.keep_prefix_group)))
            .collect()
    })
}

/// Replace every credential-shaped substring in `message` with `[REDACTED]`.
pub fn sanitize(message: &str) -> String {
    let mut out = message.to_string();
    for (re, keep) in compiled() {
        out = if *keep == 0 {
            re.replace_all(&out, REDACTED).into_owned()
        } else {
            let replacement = format!("${{{keep}}}{REDACTED}");
            re.replace_all(&out, replacement.as_str()).into_owned()
        };
    }
    out
}
