use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ServiceError;

const USER_AGENT: &str = concat!("vault-chat/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Option<Duration>, accept_invalid_certs: bool) -> Client {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(accept_invalid_certs);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|_| Client::new())
}

/// Send a request and fail on any non-success status.
pub fn execute(operation: &'static str, request: RequestBuilder) -> Result<Response, ServiceError> {
    let response = request
        .send()
        .map_err(|source| ServiceError::Transport { operation, source })?;

    let status = response.status();
    debug!(operation, %status, url = %response.url(), "response received");

    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ServiceError::Status {
            operation,
            status: status.as_u16(),
            body: excerpt(&body, 500),
        });
    }
    Ok(response)
}

pub fn execute_json<T: DeserializeOwned>(
    operation: &'static str,
    request: RequestBuilder,
) -> Result<T, ServiceError> {
    let response = execute(operation, request)?;
    read_json(operation, response)
}

pub fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, ServiceError> {
    response.json().map_err(|e| ServiceError::Decode {
        operation,
        message: e.to_string(),
    })
}

/// Cut `text` to at most `max` characters.
pub fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
