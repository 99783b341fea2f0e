use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1:latest";
pub const DEFAULT_VAULT_URL: &str = "https://127.0.0.1:27124";
pub const DEFAULT_DOCKER_HOST: &str = "http://localhost:2375";

/// Static service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_base: String,
    pub model: String,
    pub vault_url: String,
    pub vault_api_key: Option<String>,
    pub verify_tls: bool,
    pub docker_host: String,
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_base: DEFAULT_OLLAMA_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            vault_url: DEFAULT_VAULT_URL.to_string(),
            vault_api_key: None,
            verify_tls: false,
            docker_host: DEFAULT_DOCKER_HOST.to_string(),
            timeout: None,
        }
    }
}

impl Config {
    /// Trim trailing slashes and resolve the docker endpoint.
    ///
    /// A docker host that is not reachable over HTTP is kept as given; the
    /// docker client reports it on use so the other services stay available.
    pub fn normalized(mut self) -> Self {
        self.ollama_base = trim_base(&self.ollama_base);
        self.vault_url = trim_base(&self.vault_url);
        self.docker_host = match normalize_docker_host(&self.docker_host) {
            Ok(host) => host,
            Err(_) => self.docker_host.trim().to_string(),
        };
        self.vault_api_key = self.vault_api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn docker_endpoint(&self) -> Result<String, ConfigError> {
        normalize_docker_host(&self.docker_host)
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.ollama_base)
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

pub fn normalize_docker_host(host: &str) -> Result<String, ConfigError> {
    let host = host.trim();
    if let Some(rest) = host.strip_prefix("tcp://") {
        return Ok(format!("http://{}", rest.trim_end_matches('/')));
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        return Ok(trim_base(host));
    }
    Err(ConfigError::UnsupportedDockerHost(host.to_string()))
}

/// Load variables from a `.env` file without overriding the environment.
///
/// Returns the file that was loaded, if any.
pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}
