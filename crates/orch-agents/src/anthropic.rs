use eventsource_stream::Eventsource;
use futures::StreamExt;
use orch_core::config::BuilderConfig;
use orch_core::{BuildCapability, BuildEvent, BuildStream, CapabilityError, TokenUsage};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::types::{ChatMessage, ContentDelta, ErrorEnvelope, MessagesRequest, StreamEvent};

pub const PROVIDER: &str = "Anthropic";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

type Tx = mpsc::Sender<Result<BuildEvent, CapabilityError>>;

// ─── AnthropicBuilder ─────────────────────────────────────────────────────

/// Build capability backed by the streamed Anthropic Messages API.
// No Debug: the struct holds the API key.
#[derive(Clone)]
pub struct AnthropicBuilder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_tokens: u32,
}

impl AnthropicBuilder {
    pub fn new(api_key: impl Into<String>, config: &BuilderConfig) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AgentError::from(e).into_capability(PROVIDER))?;
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: format!("{}/v1/messages", base.trim_end_matches('/')),
            max_tokens: config.max_tokens,
        })
    }

    fn request(&self, prompt: &str, model: &str) -> reqwest::RequestBuilder {
        let body = MessagesRequest {
            model,
            max_tokens: self.max_tokens,
            stream: true,
            messages: vec![ChatMessage::user(prompt)],
        };
        self.client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
    }
}

impl BuildCapability for AnthropicBuilder {
    fn build(&self, prompt: &str, model: &str) -> BuildStream {
        let (tx, rx) = mpsc::channel(64);
        let request = self.request(prompt, model);

        debug!(
            provider = PROVIDER,
            model = %model,
            max_tokens = self.max_tokens,
            "starting streamed build"
        );

        tokio::spawn(async move {
            if let Err(e) = pump(request, &tx).await {
                // Receiver may already be gone; nothing else to report to.
                let _ = tx.send(Err(e.into_capability(PROVIDER))).await;
            }
        });

        BuildStream::from_channel(PROVIDER, rx)
    }
}

// ─── Stream pump ──────────────────────────────────────────────────────────

/// Send the request and forward decoded events until `message_stop`.
///
/// Returning `Ok` without having sent `Completed` means the body ended early
/// or the receiver was dropped; the stream consumer reports the former.
async fn pump(request: reqwest::RequestBuilder, tx: &Tx) -> Result<(), AgentError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|env| env.error.message)
            .unwrap_or(body);
        warn!(provider = PROVIDER, status = status.as_u16(), "build request rejected");
        return Err(AgentError::Status {
            status: status.as_u16(),
            body: message,
        });
    }

    let mut events = std::pin::pin!(response.bytes_stream().eventsource());
    let mut usage: Option<TokenUsage> = None;

    while let Some(event) = events.next().await {
        let event = event.map_err(|e| AgentError::Stream(e.to_string()))?;
        if event.data.is_empty() {
            continue;
        }
        if handle(&event.data, &mut usage, tx).await? {
            return Ok(());
        }
    }
    Ok(())
}

/// Forward one decoded event. Returns `true` once the stream is finished.
async fn handle(data: &str, usage: &mut Option<TokenUsage>, tx: &Tx) -> Result<bool, AgentError> {
    let event: StreamEvent = serde_json::from_str(data).map_err(|source| AgentError::Parse {
        data: data.to_string(),
        source,
    })?;

    match event {
        StreamEvent::MessageStart { message } => {
            if let Some(u) = message.usage {
                let entry = usage.get_or_insert_with(TokenUsage::default);
                entry.input_tokens = u.input_tokens;
                entry.output_tokens = u.output_tokens;
            }
        }
        StreamEvent::ContentBlockDelta { delta } => {
            if let ContentDelta::TextDelta { text } = delta {
                if tx.send(Ok(BuildEvent::Delta(text))).await.is_err() {
                    return Ok(true);
                }
            }
        }
        StreamEvent::MessageDelta { usage: Some(u) } => {
            usage.get_or_insert_with(TokenUsage::default).output_tokens = u.output_tokens;
        }
        StreamEvent::MessageStop => {
            debug!(provider = PROVIDER, usage = ?usage, "build stream completed");
            let _ = tx.send(Ok(BuildEvent::Completed { usage: *usage })).await;
            return Ok(true);
        }
        StreamEvent::Error { error } => {
            return Err(AgentError::Api {
                kind: error.kind,
                message: error.message,
            });
        }
        StreamEvent::MessageDelta { usage: None } | StreamEvent::Other => {}
    }
    Ok(false)
}
