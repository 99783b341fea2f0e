use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use vault_chat_core::Patch;

use crate::config::Config;
use crate::error::ServiceError;
use crate::http::{build_client, execute, execute_json};

/// Blocking client for the Obsidian REST bridge.
pub struct VaultClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

pub const MISSING_CONTENT: &str = "File content not found.";

impl VaultClient {
    pub fn new(config: &Config) -> Self {
        Self::with_client(
            build_client(config.timeout, !config.verify_tls),
            &config.vault_url,
            config.vault_api_key.clone(),
        )
    }

    pub fn with_client(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => request.header(AUTHORIZATION, format!("Bearer {}", key)),
            None => request,
        }
    }

    fn post(&self, path: &str, body: Value) -> RequestBuilder {
        let url = self.url(path);
        debug!(%url, "vault POST");
        self.authorize(self.client.post(url).json(&body))
    }

    pub fn list_files(&self) -> Result<Vec<String>, ServiceError> {
        let url = self.url("/vault/");
        debug!(%url, "vault GET");
        let data: FilesResponse = execute_json("list files", self.authorize(self.client.get(url)))?;
        Ok(data.files)
    }

    pub fn list_dir(&self, directory: &str) -> Result<Vec<String>, ServiceError> {
        let data: FilesResponse = execute_json(
            "list directory",
            self.post("/list_files_in_dir", json!({ "directory": directory })),
        )?;
        Ok(data.files)
    }

    pub fn get_file_contents(&self, filepath: &str) -> Result<String, ServiceError> {
        let data: ContentResponse = execute_json(
            "read file",
            self.post("/get_file_contents", json!({ "filepath": filepath })),
        )?;
        Ok(data.content.unwrap_or_else(|| MISSING_CONTENT.to_string()))
    }

    pub fn append_content(&self, filepath: &str, content: &str) -> Result<(), ServiceError> {
        execute(
            "append content",
            self.post(
                "/append_content",
                json!({ "filepath": filepath, "content": content }),
            ),
        )?;
        Ok(())
    }

    pub fn patch_content(&self, filepath: &str, patch: &Patch) -> Result<(), ServiceError> {
        execute(
            "patch content",
            self.post(
                "/patch_content",
                json!({
                    "filepath": filepath,
                    "patch": {
                        "type": patch.kind,
                        "target": patch.target,
                        "content": patch.content
                    }
                }),
            ),
        )?;
        Ok(())
    }

    /// Search results as display strings; non-string entries are kept as JSON.
    pub fn search(&self, query: &str) -> Result<Vec<String>, ServiceError> {
        let data: SearchResponse =
            execute_json("search vault", self.post("/search", json!({ "query": query })))?;
        Ok(data
            .results
            .into_iter()
            .map(|r| match r {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect())
    }

    pub fn delete_file(&self, filepath: &str) -> Result<(), ServiceError> {
        execute(
            "delete file",
            self.post("/delete_file", json!({ "filepath": filepath })),
        )?;
        Ok(())
    }

    pub fn summarize_file(&self, filename: &str) -> Result<Value, ServiceError> {
        execute_json(
            "summarize file",
            self.post("/summarize", json!({ "filename": filename })),
        )
    }

    pub fn create_summary_note(&self) -> Result<Value, ServiceError> {
        let url = self.url("/summary-note");
        debug!(%url, "vault POST");
        execute_json(
            "create summary note",
            self.authorize(self.client.post(url)),
        )
    }
}
