//! Boundary contract for the two external capabilities.
//!
//! ```text
//! BuildCapability::build ──► BuildStream (mpsc-backed, ordered deltas)
//!                                 │  collect_into(sink)
//!                                 ▼
//!                            BuildOutput { text, usage }
//!
//! ReviewCapability::review ──► raw response text
//! ```

use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("{provider} API rate limit exceeded. Please wait and try again later. Details: {message}")]
    RateLimited { provider: String, message: String },

    #[error("{provider} API error: {message}")]
    Failed { provider: String, message: String },
}

impl CapabilityError {
    pub fn failed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        CapabilityError::Failed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        CapabilityError::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CapabilityError::RateLimited { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// One item of a build stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// Incremental text, in delivery order.
    Delta(String),
    /// Terminal event; nothing after it is read.
    Completed { usage: Option<TokenUsage> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

// ─── BuildStream ──────────────────────────────────────────────────────────

/// Incremental output of a build call.
///
/// Backed by a Tokio mpsc channel whose sender is owned by the provider's
/// background task. Dropping the stream closes the receiver, which makes the
/// producer stop on its next send.
pub struct BuildStream {
    provider: String,
    rx: mpsc::Receiver<Result<BuildEvent, CapabilityError>>,
}

impl BuildStream {
    pub fn from_channel(
        provider: impl Into<String>,
        rx: mpsc::Receiver<Result<BuildEvent, CapabilityError>>,
    ) -> Self {
        Self {
            provider: provider.into(),
            rx,
        }
    }

    /// Drain the stream, echoing each delta to `sink` as it arrives.
    ///
    /// Returns the full accumulated text only once `Completed` is seen. Sink
    /// write failures are logged and ignored; the returned text is authoritative.
    pub async fn collect_into<W: Write>(mut self, sink: &mut W) -> Result<BuildOutput, CapabilityError> {
        let mut text = String::new();
        let mut sink_ok = true;

        while let Some(event) = self.next().await {
            match event? {
                BuildEvent::Delta(chunk) => {
                    if sink_ok {
                        if let Err(e) = sink.write_all(chunk.as_bytes()).and_then(|_| sink.flush()) {
                            warn!(error = %e, "failed to echo builder output; continuing");
                            sink_ok = false;
                        }
                    }
                    text.push_str(&chunk);
                }
                BuildEvent::Completed { usage } => return Ok(BuildOutput { text, usage }),
            }
        }

        Err(CapabilityError::failed(
            self.provider.clone(),
            "stream ended before completion",
        ))
    }
}

impl Stream for BuildStream {
    type Item = Result<BuildEvent, CapabilityError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ─── Capability traits ────────────────────────────────────────────────────

/// Proposes an implementation for a prompt, streaming text as it is produced.
pub trait BuildCapability {
    fn build(&self, prompt: &str, model: &str) -> BuildStream;
}

/// Renders a single complete review response for a prompt.
pub trait ReviewCapability {
    fn review(
        &self,
        prompt: &str,
        model: &str,
    ) -> impl Future<Output = Result<String, CapabilityError>> + Send;
}

// ─── Tests ────────────────────────────────────────────────────────────────
