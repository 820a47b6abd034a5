use orch_core::CapabilityError;
use thiserror::Error;

/// Transport-level failures inside an adapter.
///
/// Every variant is folded into a [`CapabilityError`] before it leaves the
/// crate; the provider name is attached at that point.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("event stream error: {0}")]
    Stream(String),

    #[error("Failed to parse stream event: {source}\n  data: {data}")]
    Parse {
        data: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind}: {message}")]
    Api { kind: String, message: String },

    #[error("response contained no choices")]
    EmptyResponse,
}

impl AgentError {
    pub fn into_capability(self, provider: &str) -> CapabilityError {
        match self {
            AgentError::Status { status: 429, body } => CapabilityError::rate_limited(provider, body),
            AgentError::Api { kind, message } if kind == "rate_limit_error" => {
                CapabilityError::rate_limited(provider, message)
            }
            other => CapabilityError::failed(provider, other.to_string()),
        }
    }
}
