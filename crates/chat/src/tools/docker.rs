use std::sync::Arc;

use serde::Deserialize;
use vault_chat_core::{ToolArguments, ToolDefinition, ToolOutput};

use super::{parse_args, ToolProvider};
use crate::docker::DockerClient;
use crate::error::{ServiceError, ToolError};
use crate::render;

pub struct DockerTools {
    client: Arc<DockerClient>,
}

impl DockerTools {
    pub fn new(client: Arc<DockerClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    image_name: String,
}

impl ToolProvider for DockerTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("docker_list_images", "List all local Docker images"),
            ToolDefinition::new("docker_list_containers", "List all running Docker containers"),
            ToolDefinition::new(
                "docker_create_container",
                "Create and start a container from an image, pulling the image if needed",
            )
            .param("image_name", "Image to run (e.g. 'alpine' or 'nginx:1.27')"),
        ]
    }

    fn call(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput, ToolError> {
        let service = |source: ServiceError| ToolError::Service {
            tool: name.to_string(),
            source,
        };

        match name {
            "docker_list_images" => {
                let images = self.client.list_images().map_err(service)?;
                Ok(ToolOutput::Text(render::images(&images)))
            }
            "docker_list_containers" => {
                let containers = self.client.list_containers().map_err(service)?;
                Ok(ToolOutput::Text(render::containers(&containers)))
            }
            "docker_create_container" => {
                let args: CreateArgs = parse_args(name, arguments)?;
                let created = self
                    .client
                    .create_container(&args.image_name)
                    .map_err(service)?;
                Ok(ToolOutput::Text(render::created_container(&created)))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
