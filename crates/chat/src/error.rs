use thiserror::Error;
use vault_chat_core::ArgumentError;

/// Failure talking to one of the external services.
///
/// Every variant carries the name of the operation that failed so the
/// message stays meaningful once it is flattened into chat text.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation}: server returned {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("{operation}: unexpected response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
    #[error("image `{0}` not found")]
    ImageNotFound(String),
    #[error("{operation}: {source}")]
    Unavailable {
        operation: &'static str,
        #[source]
        source: ConfigError,
    },
}

impl ServiceError {
    pub fn operation(&self) -> &'static str {
        match self {
            ServiceError::Transport { operation, .. }
            | ServiceError::Status { operation, .. }
            | ServiceError::Decode { operation, .. }
            | ServiceError::Unavailable { operation, .. } => operation,
            ServiceError::ImageNotFound(_) => "pull image",
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for `{tool}`: {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("tool `{tool}` failed: {source}")]
    Service {
        tool: String,
        #[source]
        source: ServiceError,
    },
}

/// Why an assistant turn ended without a reply.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("inference request failed: {0}")]
    Inference(#[source] ServiceError),
    #[error("could not decode arguments for tool `{tool}`: {source}")]
    Arguments {
        tool: String,
        #[source]
        source: ArgumentError,
    },
    #[error("Unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("Tool call failed: {0}")]
    Tool(#[source] ToolError),
}

impl From<ToolError> for TurnError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::UnknownTool(name) => TurnError::UnknownTool(name),
            other => TurnError::Tool(other),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported docker host `{0}`: only tcp:// and http(s):// endpoints are supported")]
    UnsupportedDockerHost(String),
}
