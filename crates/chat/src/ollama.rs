use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use vault_chat_core::{Message, ToolCall};

use crate::config::Config;
use crate::error::ServiceError;
use crate::http::{build_client, execute_json};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: &str, messages: Vec<Message>, tools: Vec<Value>) -> Self {
        Self {
            model: model.to_string(),
            messages,
            tools,
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Older servers report a single call under `tool`.
    #[serde(default)]
    pub tool: Option<ToolCall>,
}

impl ReplyMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Some(calls),
            tool: None,
        }
    }

    /// The call to execute: the first listed one, or the legacy single call.
    pub fn requested_call(&self) -> Option<&ToolCall> {
        match &self.tool_calls {
            Some(calls) => calls.first(),
            None => self.tool.as_ref(),
        }
    }

    pub fn call_count(&self) -> usize {
        match &self.tool_calls {
            Some(calls) => calls.len(),
            None => usize::from(self.tool.is_some()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: ReplyMessage,
}

/// Anything that can answer a chat request.
pub trait ChatBackend {
    fn chat(&self, request: &ChatRequest) -> Result<ReplyMessage, ServiceError>;
}

pub struct OllamaClient {
    client: Client,
    chat_url: String,
}

impl OllamaClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: build_client(config.timeout, false),
            chat_url: config.chat_url(),
        }
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            chat_url: format!("{}/api/chat", base_url.trim_end_matches('/')),
        }
    }
}

impl ChatBackend for OllamaClient {
    fn chat(&self, request: &ChatRequest) -> Result<ReplyMessage, ServiceError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending chat request"
        );
        let response: ChatResponse =
            execute_json("chat", self.client.post(&self.chat_url).json(request))?;
        Ok(response.message)
    }
}
