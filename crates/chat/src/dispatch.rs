use tracing::warn;
use vault_chat_core::{help_text, parse_command, Command, Conversation, Message};

use crate::docker::DockerClient;
use crate::error::ServiceError;
use crate::render;
use crate::vault::VaultClient;

/// Executes parsed slash commands against the vault and docker adapters.
pub struct CommandRunner {
    vault: VaultClient,
    docker: DockerClient,
}

impl CommandRunner {
    pub fn new(vault: VaultClient, docker: DockerClient) -> Self {
        Self { vault, docker }
    }

    /// Parse and run one line. Every failure comes back as display text.
    pub fn respond(&self, input: &str) -> String {
        match parse_command(input) {
            Ok(command) => self.execute(&command),
            Err(e) => e.to_string(),
        }
    }

    /// Run one line inside `conversation`, recording the user line and reply.
    pub fn run_turn(&self, conversation: &mut Conversation, input: &str) -> String {
        conversation.push(Message::user(input));
        let reply = self.respond(input);
        conversation.push(Message::assistant(reply.clone()));
        reply
    }

    pub fn execute(&self, command: &Command) -> String {
        match command {
            Command::Help => help_text(),
            Command::VaultListAll => self
                .vault
                .list_files()
                .map(|files| render::vault_files(&files))
                .unwrap_or_else(|e| failure("listing files from Obsidian", e)),
            Command::VaultListDir { directory } => self
                .vault
                .list_dir(directory)
                .map(|files| render::directory_files(directory, &files))
                .unwrap_or_else(|e| failure("listing files in directory from Obsidian", e)),
            Command::VaultGetContent { filepath } => self
                .vault
                .get_file_contents(filepath)
                .unwrap_or_else(|e| failure("reading file from Obsidian", e)),
            Command::VaultAppend { filepath, content } => self
                .vault
                .append_content(filepath, content)
                .map(|_| "Content successfully appended.".to_string())
                .unwrap_or_else(|e| failure("appending content to Obsidian", e)),
            Command::VaultPatch { filepath, patch } => self
                .vault
                .patch_content(filepath, patch)
                .map(|_| "Content successfully patched.".to_string())
                .unwrap_or_else(|e| failure("patching content to Obsidian", e)),
            Command::VaultSearch { query } => self
                .vault
                .search(query)
                .map(|results| render::search_results(query, &results))
                .unwrap_or_else(|e| failure("searching Obsidian vault", e)),
            Command::VaultDelete { filepath } => self
                .vault
                .delete_file(filepath)
                .map(|_| format!("File `{}` successfully deleted.", filepath))
                .unwrap_or_else(|e| failure("deleting file from Obsidian", e)),
            Command::DockerListImages => self
                .docker
                .list_images()
                .map(|images| render::images(&images))
                .unwrap_or_else(|e| failure("listing images", e)),
            Command::DockerListContainers => self
                .docker
                .list_containers()
                .map(|containers| render::containers(&containers))
                .unwrap_or_else(|e| failure("listing containers", e)),
            Command::DockerCreate { image } => match self.docker.create_container(image) {
                Ok(created) => render::created_container(&created),
                Err(ServiceError::ImageNotFound(_)) => {
                    format!("Error: Image `{}` not found on Docker Hub.", image)
                }
                Err(e) => failure("creating container", e),
            },
        }
    }
}

fn failure(action: &str, err: ServiceError) -> String {
    warn!(operation = err.operation(), error = %err, "command failed");
    format!("Error {}: {}", action, err)
}
