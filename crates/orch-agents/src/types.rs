//! Wire types for the two provider HTTP APIs.
//!
//! Only the fields this crate reads are modelled. Unknown fields are ignored
//! and unknown event kinds deserialize to an `Other` variant so new server
//! events never break a running stream.

use serde::{Deserialize, Serialize};

// ─── Shared ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

// ─── Anthropic Messages API ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub stream: bool,
    pub messages: Vec<ChatMessage<'a>>,
}

/// One decoded `data:` payload of a streamed Messages response.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        message: MessageStart,
    },
    ContentBlockDelta {
        delta: ContentDelta,
    },
    MessageDelta {
        #[serde(default)]
        usage: Option<Usage>,
    },
    MessageStop,
    Error {
        error: ApiErrorBody,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessageStart {
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Non-streamed error envelope: `{"type":"error","error":{...}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiErrorBody,
}

// ─── OpenAI Chat Completions API ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_delta() {
        let ev: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#,
        )
        .unwrap();
        let StreamEvent::ContentBlockDelta {
            delta: ContentDelta::TextDelta { text },
        } = ev
        else {
            panic!("expected text delta")
        };
        assert_eq!(text, "Hello");
    }

    #[test]
    fn non_text_delta_is_other() {
        let ev: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{"}}"#,
        )
        .unwrap();
        assert!(matches!(
            ev,
            StreamEvent::ContentBlockDelta {
                delta: ContentDelta::Other
            }
        ));
    }

    #[test]
    fn unknown_event_is_other() {
        let ev: StreamEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(ev, StreamEvent::Other));
        let ev: StreamEvent =
            serde_json::from_str(r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#)
                .unwrap();
        assert!(matches!(ev, StreamEvent::Other));
    }

    #[test]
    fn parses_usage_from_start_and_delta() {
        let ev: StreamEvent = serde_json::from_str(
            r#"{"type":"message_start","message":{"id":"msg_1","model":"m","usage":{"input_tokens":25,"output_tokens":1}}}"#,
        )
        .unwrap();
        let StreamEvent::MessageStart { message } = ev else {
            panic!("expected message_start")
        };
        assert_eq!(message.usage.unwrap().input_tokens, 25);

        let ev: StreamEvent = serde_json::from_str(
            r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":15}}"#,
        )
        .unwrap();
        let StreamEvent::MessageDelta { usage } = ev else {
            panic!("expected message_delta")
        };
        assert_eq!(usage.unwrap().output_tokens, 15);
    }

    #[test]
    fn chat_request_serializes_expected_shape() {
        let req = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage::user("review this")],
            temperature: 0.0,
            max_tokens: 4000,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "gpt-4o");
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["messages"][0]["content"], "review this");
        assert_eq!(v["max_tokens"], 4000);
        assert_eq!(v["temperature"], 0.0);
    }

    #[test]
    fn chat_response_missing_content_is_none() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(resp.choices[0].message.content.is_none());
    }
}
