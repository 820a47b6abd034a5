//! `orch-core` — turns a markdown ticket into an auditable run pack and
//! drives the build → review protocol over it.
//!
//! ```text
//! ticket.md ─► runpack ─► BuildCapability ─► claude.output.md
//!                 ▲                                │
//!                 └──────── regenerate ◄───────────┘
//!                 │
//!                 ▼
//!          review.packet.md ─► ReviewCapability ─► codex.verdict.txt
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod evidence;
pub mod exec;
pub mod io;
pub mod paths;
pub mod prompts;
pub mod redact;
pub mod repo_root;
pub mod runpack;
pub mod verdict;

pub use capability::{
    BuildCapability, BuildEvent, BuildOutput, BuildStream, CapabilityError, ReviewCapability,
    TokenUsage,
};
pub use config::Config;
pub use error::{OrchError, Result};
pub use exec::{execute, ExecOutcome, ExecPhase, ExecRequest, FAILURE_EXIT_CODE};
pub use runpack::{create_run_pack, extract_touched_files, RunPack};
pub use verdict::{parse_verdict, Verdict};
