pub mod config;
pub mod dispatch;
pub mod docker;
pub mod error;
pub mod http;
pub mod logging;
pub mod ollama;
pub mod probe;
pub mod render;
pub mod repl;
pub mod session;
pub mod tools;
pub mod vault;

pub use config::Config;
pub use dispatch::CommandRunner;
pub use docker::DockerClient;
pub use error::{ConfigError, ServiceError, ToolError, TurnError};
pub use ollama::{ChatBackend, ChatRequest, OllamaClient, ReplyMessage};
pub use probe::{ProbeOutcome, ProbeStatus, ToolProbe};
pub use session::{Assistant, ToolInvocation, TurnReply, DEFAULT_SYSTEM_PROMPT};
pub use tools::{ToolProvider, ToolRegistry};
pub use vault::VaultClient;
