use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::{normalize_docker_host, Config};
use crate::error::{ConfigError, ServiceError};
use crate::http::{build_client, excerpt, execute, execute_json, read_json};

/// Blocking client for the Docker Engine HTTP API.
///
/// An endpoint that cannot be reached over HTTP is kept as an error and
/// reported by every operation instead of at construction.
pub struct DockerClient {
    client: Client,
    endpoint: Result<String, ConfigError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub id: String,
    pub tags: Vec<String>,
}

impl ImageSummary {
    /// `sha256:` plus the first ten hex digits, as the docker CLI shows it.
    pub fn short_id(&self) -> String {
        if self.id.starts_with("sha256:") {
            self.id.chars().take(17).collect()
        } else {
            self.id.chars().take(10).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
}

impl ContainerSummary {
    pub fn short_id(&self) -> String {
        short_container_id(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    /// The image was missing locally and had to be pulled first.
    pub pulled: bool,
}

impl CreatedContainer {
    pub fn short_id(&self) -> String {
        short_container_id(&self.id)
    }
}

fn short_container_id(id: &str) -> String {
    id.chars().take(12).collect()
}

#[derive(Debug, Deserialize)]
struct ImageWire {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "RepoTags", default)]
    repo_tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ContainerWire {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Names", default)]
    names: Vec<String>,
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "State", default)]
    state: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct InspectResponse {
    #[serde(rename = "Name", default)]
    name: String,
}

/// Split `repo[:tag]` into repository and tag, defaulting the tag to `latest`.
/// Digest references are passed through untouched.
pub fn split_image_ref(image: &str) -> (String, Option<String>) {
    if image.contains('@') {
        return (image.to_string(), None);
    }
    let last_segment_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[last_segment_start..].rfind(':') {
        Some(idx) => {
            let split = last_segment_start + idx;
            (image[..split].to_string(), Some(image[split + 1..].to_string()))
        }
        None => (image.to_string(), Some("latest".to_string())),
    }
}

fn looks_like_missing_image(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("not found")
        || lower.contains("does not exist")
        || lower.contains("manifest unknown")
        || lower.contains("pull access denied")
}

impl DockerClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: build_client(config.timeout, false),
            endpoint: normalize_docker_host(&config.docker_host),
        }
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: Ok(base_url.trim_end_matches('/').to_string()),
        }
    }

    fn url(&self, operation: &'static str, path: &str) -> Result<String, ServiceError> {
        match &self.endpoint {
            Ok(base) => Ok(format!("{}{}", base, path)),
            Err(source) => Err(ServiceError::Unavailable {
                operation,
                source: source.clone(),
            }),
        }
    }

    pub fn list_images(&self) -> Result<Vec<ImageSummary>, ServiceError> {
        let images: Vec<ImageWire> =
            execute_json("list images", self.client.get(self.url("list images", "/images/json")?))?;
        Ok(images
            .into_iter()
            .map(|img| ImageSummary {
                id: img.id,
                tags: img
                    .repo_tags
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|t| t != "<none>:<none>")
                    .collect(),
            })
            .collect())
    }

    /// Running containers only.
    pub fn list_containers(&self) -> Result<Vec<ContainerSummary>, ServiceError> {
        let containers: Vec<ContainerWire> = execute_json(
            "list containers",
            self.client.get(self.url("list containers", "/containers/json")?),
        )?;
        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                name: c
                    .names
                    .first()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_default(),
                id: c.id,
                image: c.image,
                state: c.state,
            })
            .collect())
    }

    pub fn image_exists(&self, image: &str) -> Result<bool, ServiceError> {
        let operation = "inspect image";
        let response = self
            .client
            .get(self.url(operation, &format!("/images/{}/json", image))?)
            .send()
            .map_err(|source| ServiceError::Transport { operation, source })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(ServiceError::Status {
                operation,
                status: status.as_u16(),
                body: excerpt(&response.text().unwrap_or_default(), 500),
            }),
        }
    }

    pub fn pull_image(&self, image: &str) -> Result<(), ServiceError> {
        let operation = "pull image";
        let (repository, tag) = split_image_ref(image);
        let mut url = format!(
            "{}?fromImage={}",
            self.url(operation, "/images/create")?,
            urlencoding::encode(&repository)
        );
        if let Some(tag) = tag {
            url.push_str(&format!("&tag={}", urlencoding::encode(&tag)));
        }
        info!(image, "pulling image");

        let response = match execute(operation, self.client.post(url)) {
            Ok(response) => response,
            Err(ServiceError::Status { body, .. }) if looks_like_missing_image(&body) => {
                return Err(ServiceError::ImageNotFound(image.to_string()))
            }
            Err(e) => return Err(e),
        };

        // Progress is streamed as one JSON object per line; failures arrive
        // in-band with an `error` field and a 200 status.
        let body = response.text().map_err(|e| ServiceError::Decode {
            operation,
            message: e.to_string(),
        })?;
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let Ok(event) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            if let Some(error) = event.get("error").and_then(|e| e.as_str()) {
                if looks_like_missing_image(error) {
                    return Err(ServiceError::ImageNotFound(image.to_string()));
                }
                return Err(ServiceError::Decode {
                    operation,
                    message: error.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Run a detached container from `image`, pulling the image first when it
    /// is not present locally.
    pub fn create_container(&self, image: &str) -> Result<CreatedContainer, ServiceError> {
        let pulled = if self.image_exists(image)? {
            false
        } else {
            debug!(image, "image missing locally");
            self.pull_image(image)?;
            true
        };

        let created: CreateResponse = execute_json(
            "create container",
            self.client
                .post(self.url("create container", "/containers/create")?)
                .json(&json!({ "Image": image })),
        )?;

        execute(
            "start container",
            self.client
                .post(self.url(
                    "start container",
                    &format!("/containers/{}/start", created.id),
                )?),
        )?;

        let response = execute(
            "inspect container",
            self.client
                .get(self.url(
                    "inspect container",
                    &format!("/containers/{}/json", created.id),
                )?),
        )?;
        let inspect: InspectResponse = read_json("inspect container", response)?;

        Ok(CreatedContainer {
            name: inspect.name.trim_start_matches('/').to_string(),
            id: created.id,
            image: image.to_string(),
            pulled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_image_references() {
        assert_eq!(
            split_image_ref("alpine"),
            ("alpine".to_string(), Some("latest".to_string()))
        );
        assert_eq!(
            split_image_ref("alpine:3.19"),
            ("alpine".to_string(), Some("3.19".to_string()))
        );
        assert_eq!(
            split_image_ref("localhost:5000/team/app"),
            ("localhost:5000/team/app".to_string(), Some("latest".to_string()))
        );
        assert_eq!(
            split_image_ref("alpine@sha256:abcd"),
            ("alpine@sha256:abcd".to_string(), None)
        );
    }

    #[test]
    fn short_ids() {
        let image = ImageSummary {
            id: "sha256:0123456789abcdef".to_string(),
            tags: vec![],
        };
        assert_eq!(image.short_id(), "sha256:0123456789");

        let container = ContainerSummary {
            id: "f00dfacecafe1234567890".to_string(),
            name: "web".to_string(),
            image: "nginx".to_string(),
            state: "running".to_string(),
        };
        assert_eq!(container.short_id(), "f00dfacecafe");
    }

    #[test]
    fn detects_missing_image_messages() {
        assert!(looks_like_missing_image(
            "pull access denied for nope, repository does not exist"
        ));
        assert!(looks_like_missing_image("manifest unknown"));
        assert!(!looks_like_missing_image("toomanyrequests: rate limit"));
    }

    #[test]
    fn unix_socket_host_fails_per_operation() {
        let config = Config {
            docker_host: "unix:///var/run/docker.sock".to_string(),
            ..Config::default()
        }
        .normalized();
        let docker = DockerClient::new(&config);

        let err = docker.list_images().unwrap_err();
        assert_eq!(err.operation(), "list images");
        assert!(err.to_string().contains("unix:///var/run/docker.sock"));
        assert!(matches!(
            docker.create_container("alpine"),
            Err(ServiceError::Unavailable {
                operation: "inspect image",
                ..
            })
        ));
    }
}
