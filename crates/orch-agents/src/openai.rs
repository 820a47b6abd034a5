use std::future::Future;

use orch_core::config::ReviewerConfig;
use orch_core::{CapabilityError, ReviewCapability};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ErrorEnvelope};

pub const PROVIDER: &str = "OpenAI";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Review capability backed by the OpenAI Chat Completions API.
// No Debug: the struct holds the API key.
#[derive(Clone)]
pub struct OpenAiReviewer {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiReviewer {
    pub fn new(api_key: impl Into<String>, config: &ReviewerConfig) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AgentError::from(e).into_capability(PROVIDER))?;
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn request(&self, prompt: &str, model: &str) -> reqwest::RequestBuilder {
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
    }
}

impl ReviewCapability for OpenAiReviewer {
    fn review(
        &self,
        prompt: &str,
        model: &str,
    ) -> impl Future<Output = Result<String, CapabilityError>> + Send {
        debug!(
            provider = PROVIDER,
            model = %model,
            max_tokens = self.max_tokens,
            temperature = self.temperature,
            "requesting review"
        );
        let request = self.request(prompt, model);
        async move { send(request).await.map_err(|e| e.into_capability(PROVIDER)) }
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<String, AgentError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|env| env.error.message)
            .unwrap_or(body);
        warn!(provider = PROVIDER, status = status.as_u16(), "review request rejected");
        return Err(AgentError::Status {
            status: status.as_u16(),
            body: message,
        });
    }

    let parsed: ChatResponse = serde_json::from_str(&body).map_err(|source| AgentError::Parse {
        data: body.clone(),
        source,
    })?;
    let choice = parsed.choices.into_iter().next().ok_or(AgentError::EmptyResponse)?;
    let text = choice.message.content.unwrap_or_default();
    debug!(provider = PROVIDER, chars = text.len(), "review received");
    Ok(text)
}
