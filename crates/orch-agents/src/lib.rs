//! `orch-agents` — HTTP adapters for the orchestrator's two capabilities.
//!
//! ```text
//! AnthropicBuilder ── POST /v1/messages (stream: true)
//!     │                 SSE body decoded by eventsource-stream
//!     ▼
//! BuildStream        ← background task + mpsc channel
//!
//! OpenAiReviewer  ── POST /chat/completions
//!     ▼
//! raw review text
//! ```
//!
//! Both adapters report failures as [`orch_core::CapabilityError`]; an HTTP
//! 429 or a `rate_limit_error` event becomes the rate-limited variant.

pub mod anthropic;
pub mod error;
pub mod openai;
pub mod types;


pub use anthropic::AnthropicBuilder;
pub use error::AgentError;
pub use openai::OpenAiReviewer;

pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
