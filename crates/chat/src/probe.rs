//! Checks which local models accept a `tools` payload.

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;
use vault_chat_core::{Message, ToolDefinition};

use crate::http::excerpt;
use crate::ollama::ChatRequest;

pub const DEFAULT_MODELS: &[&str] = &[
    "llama3.1:latest",
    "llama2:latest",
    "nomic-embed-text:latest",
    "mxbai-embed-large:latest",
    "deepseek-coder:latest",
    "qwen2.5:latest",
    "llama3:latest",
    "mistral:latest",
    "gemma3:latest",
];

const BODY_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Accepted,
    Rejected { status: u16, body: String },
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub model: String,
    pub status: ProbeStatus,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

pub struct ToolProbe {
    client: Client,
    base_url: String,
}

impl ToolProbe {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Installed models, or the default list when the server cannot tell.
    pub fn list_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url);
        let names = self
            .client
            .get(&url)
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| r.json::<TagsResponse>().ok())
            .map(|tags| tags.models.into_iter().map(|m| m.name).collect::<Vec<_>>())
            .unwrap_or_default();

        if names.is_empty() {
            debug!(%url, "model listing unavailable, using defaults");
            DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
        } else {
            names
        }
    }

    pub fn check_model(&self, model: &str) -> ProbeOutcome {
        let request = ChatRequest::new(
            model,
            vec![
                Message::system("You are a tiny test assistant."),
                Message::user("Test: can you accept tools? (this is a machine test)"),
            ],
            vec![ToolDefinition::new("ping", "Reply with pong").to_wire()],
        );

        let status = match self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
        {
            Err(e) => ProbeStatus::Error(format!("request exception: {}", e)),
            Ok(response) if response.status().is_success() => ProbeStatus::Accepted,
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().unwrap_or_default();
                let body = if body.is_empty() {
                    "<no body>".to_string()
                } else {
                    excerpt(&body, BODY_LIMIT)
                };
                ProbeStatus::Rejected { status, body }
            }
        };

        ProbeOutcome {
            model: model.to_string(),
            status,
        }
    }
}

pub fn render_report(outcomes: &[ProbeOutcome]) -> String {
    let mut output = String::from("Summary:\n\n");
    for outcome in outcomes {
        match &outcome.status {
            ProbeStatus::Accepted => {
                output.push_str(&format!("- {}: ok (http 200)\n", outcome.model));
            }
            ProbeStatus::Rejected { status, body } => {
                output.push_str(&format!(
                    "- {}: rejected (http {}) -> {}\n",
                    outcome.model,
                    status,
                    excerpt(body, 200)
                ));
            }
            ProbeStatus::Error(message) => {
                output.push_str(&format!("- {}: error -> {}\n", outcome.model, excerpt(message, 200)));
            }
        }
    }
    output.push_str("\nNotes:\n");
    output.push_str(" - A body containing 'does not support tools' or HTTP 400 means the model build does not support tools.\n");
    output.push_str(" - Embedding models (nomic-embed-text, mxbai-embed-large) never support tools.\n");
    output.push_str(" - An accepted payload does not guarantee the model will actually call tools in a dialogue.\n");
    output
}
