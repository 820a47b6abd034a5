use std::path::PathBuf;
use thiserror::Error;

use crate::capability::CapabilityError;
use crate::repo_root::RepoRootError;

#[derive(Debug, Error)]
pub enum OrchError {
    #[error("ticket not found: {}", .0.display())]
    TicketNotFound(PathBuf),

    #[error("repository root not found for ticket directory {}", start.display())]
    RepoRootNotFound {
        start: PathBuf,
        #[source]
        source: RepoRootError,
    },

    #[error("artifact missing: {} (run pack is incomplete or out of order)", .0.display())]
    ArtifactMissing(PathBuf),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(
        "unable to parse verdict from reviewer response; expected VERDICT: APPROVED/BLOCKED/ESCALATE. Got: {excerpt}"
    )]
    VerdictUnparseable { excerpt: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, OrchError>;
