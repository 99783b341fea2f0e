use std::sync::Arc;

use serde::Deserialize;
use vault_chat_core::{Patch, ToolArguments, ToolDefinition, ToolOutput};

use super::{parse_args, ToolProvider};
use crate::error::{ServiceError, ToolError};
use crate::render;
use crate::vault::VaultClient;

pub struct VaultTools {
    client: Arc<VaultClient>,
}

impl VaultTools {
    pub fn new(client: Arc<VaultClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryArgs {
    directory: String,
}

#[derive(Debug, Deserialize)]
struct FileArgs {
    filepath: String,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct AppendArgs {
    filepath: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct PatchArgs {
    filepath: String,
    patch_type: String,
    patch_target: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct SummarizeArgs {
    filename: String,
}

impl ToolProvider for VaultTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("list_files", "Get a list of all files from the Obsidian vault"),
            ToolDefinition::new(
                "list_directory",
                "List files and directories in a specific Obsidian vault directory",
            )
            .param("directory", "Directory path inside the vault"),
            ToolDefinition::new("get_file_contents", "Read the content of a single vault file")
                .param("filepath", "Path of the file inside the vault (e.g. 'notes/xyz.md')"),
            ToolDefinition::new("search_vault", "Search the vault for documents matching a text query")
                .param("query", "Text to search for"),
            ToolDefinition::new("append_content", "Append content to a new or existing vault file")
                .param("filepath", "Path of the file inside the vault")
                .param("content", "Content to append"),
            ToolDefinition::new(
                "patch_content",
                "Insert content into a note relative to a heading, block reference or frontmatter field",
            )
            .param("filepath", "Path of the file inside the vault")
            .param("patch_type", "One of 'heading', 'block' or 'frontmatter'")
            .param("patch_target", "Heading name, block id or frontmatter key")
            .param("content", "Content to insert"),
            ToolDefinition::new("delete_file", "Delete a file or directory from the vault")
                .param("filepath", "Path of the file or directory inside the vault"),
            ToolDefinition::new("summarize_file", "Summarize the content of a specific markdown file")
                .param("filename", "Name of the markdown file (e.g. 'xyz.md')"),
            ToolDefinition::new(
                "create_summary_note",
                "Create a summary note that summarizes all files and links to each file",
            ),
        ]
    }

    fn call(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput, ToolError> {
        let service = |source: ServiceError| ToolError::Service {
            tool: name.to_string(),
            source,
        };

        match name {
            "list_files" => {
                let files = self.client.list_files().map_err(service)?;
                Ok(ToolOutput::Text(render::vault_files(&files)))
            }
            "list_directory" => {
                let args: DirectoryArgs = parse_args(name, arguments)?;
                let files = self.client.list_dir(&args.directory).map_err(service)?;
                Ok(ToolOutput::Text(render::directory_files(&args.directory, &files)))
            }
            "get_file_contents" => {
                let args: FileArgs = parse_args(name, arguments)?;
                let content = self
                    .client
                    .get_file_contents(&args.filepath)
                    .map_err(service)?;
                Ok(ToolOutput::Text(content))
            }
            "search_vault" => {
                let args: SearchArgs = parse_args(name, arguments)?;
                let results = self.client.search(&args.query).map_err(service)?;
                Ok(ToolOutput::Text(render::search_results(&args.query, &results)))
            }
            "append_content" => {
                let args: AppendArgs = parse_args(name, arguments)?;
                self.client
                    .append_content(&args.filepath, &args.content)
                    .map_err(service)?;
                Ok(ToolOutput::Text("Content successfully appended.".to_string()))
            }
            "patch_content" => {
                let args: PatchArgs = parse_args(name, arguments)?;
                let patch = Patch {
                    kind: args.patch_type,
                    target: args.patch_target,
                    content: args.content,
                };
                self.client
                    .patch_content(&args.filepath, &patch)
                    .map_err(service)?;
                Ok(ToolOutput::Text("Content successfully patched.".to_string()))
            }
            "delete_file" => {
                let args: FileArgs = parse_args(name, arguments)?;
                self.client.delete_file(&args.filepath).map_err(service)?;
                Ok(ToolOutput::Text(format!(
                    "File `{}` successfully deleted.",
                    args.filepath
                )))
            }
            "summarize_file" => {
                let args: SummarizeArgs = parse_args(name, arguments)?;
                let summary = self.client.summarize_file(&args.filename).map_err(service)?;
                Ok(ToolOutput::Json(summary))
            }
            "create_summary_note" => {
                let note = self.client.create_summary_note().map_err(service)?;
                Ok(ToolOutput::Json(note))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
