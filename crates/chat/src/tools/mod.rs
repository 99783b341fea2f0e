mod docker;
mod vault;

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;
use vault_chat_core::{ToolArguments, ToolDefinition, ToolOutput};

use crate::docker::DockerClient;
use crate::error::ToolError;
use crate::vault::VaultClient;

pub use docker::DockerTools;
pub use vault::VaultTools;

/// A group of tools backed by one service.
pub trait ToolProvider: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;
    fn call(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput, ToolError>;
}

/// Ordered set of tools the model may call.
#[derive(Default)]
pub struct ToolRegistry {
    providers: Vec<Box<dyn ToolProvider>>,
    definitions: Vec<ToolDefinition>,
    wire: Vec<Value>,
    owners: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the vault and docker tools.
    pub fn with_services(vault: Arc<VaultClient>, docker: Arc<DockerClient>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(VaultTools::new(vault)));
        registry.register(Box::new(DockerTools::new(docker)));
        registry
    }

    /// Later registrations do not replace an existing tool name.
    pub fn register(&mut self, provider: Box<dyn ToolProvider>) {
        let index = self.providers.len();
        for definition in provider.definitions() {
            if self.owners.contains_key(&definition.name) {
                continue;
            }
            self.owners.insert(definition.name.clone(), index);
            self.wire.push(definition.to_wire());
            self.definitions.push(definition);
        }
        self.providers.push(provider);
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn wire_definitions(&self) -> &[Value] {
        &self.wire
    }

    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    pub fn call(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput, ToolError> {
        let index = *self
            .owners
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        info!(tool = name, "calling tool");
        self.providers[index].call(name, arguments)
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(
    tool: &str,
    arguments: &ToolArguments,
) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments.clone())).map_err(|e| {
        ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: e.to_string(),
        }
    })
}
