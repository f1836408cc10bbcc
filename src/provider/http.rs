//! Shared HTTP client construction and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::DbChatError;

/// Build a client whose requests are bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, DbChatError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| DbChatError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> Result<HeaderMap, DbChatError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|_| DbChatError::Validation("API key contains invalid characters".into()))?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Map a non-success status to an error, preferring the API's own message.
pub fn status_to_error(status: u16, body: &str) -> DbChatError {
    let message = error_message(body).unwrap_or_else(|| body.trim().to_string());
    match status {
        401 | 403 => DbChatError::Authentication(message),
        _ => DbChatError::api(status, message),
    }
}

/// Map a transport error, keeping timeouts distinct.
pub fn send_error(error: reqwest::Error, timeout: Option<Duration>) -> DbChatError {
    match timeout {
        Some(timeout) if error.is_timeout() => DbChatError::Timeout(timeout.as_millis() as u64),
        _ => DbChatError::Network(error),
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .pointer("/error/message")?
        .as_str()
        .map(str::to_string)
}
