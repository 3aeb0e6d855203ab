//! Remote responder: `POST <base>/chat` with lenient response parsing

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::ReplyProvider;
use crate::error::{Error, Result};

/// Object fields probed, in order, for the reply text
pub const REPLY_FIELDS: [&str; 3] = ["reply", "message", "content"];

/// Reply used when the response body has no usable shape
pub const NO_DATA_REPLY: &str = "No response data received.";

/// Path of the chat endpoint, relative to the base URL
const CHAT_PATH: &str = "/chat";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// HTTP client for a chat backend
pub struct RemoteProvider {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteProvider {
    /// Create a provider for `base_url` (trailing slashes are ignored)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::InvalidConfig("API base URL is empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    /// The full URL of the chat endpoint
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAT_PATH)
    }

    async fn request(&self, text: &str) -> Result<String> {
        let url = self.endpoint();
        tracing::debug!("Chat request URL: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message: text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::status(status.as_u16(), body));
        }

        Ok(extract_reply(&parse_body(&body)))
    }
}

#[async_trait]
impl ReplyProvider for RemoteProvider {
    async fn get_reply(&self, text: &str, cancel: CancellationToken) -> Result<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Chat request canceled");
                Err(Error::Canceled)
            }
            result = self.request(text) => result,
        }
    }
}

/// Interpret a response body as JSON, falling back to a bare string.
/// An empty body has no data.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Pull reply text out of a response value.
///
/// A string is used as-is. An object is probed for [`REPLY_FIELDS`] in order,
/// skipping absent or null fields, and is serialized whole if none match.
/// Arrays are serialized too; any other shape yields [`NO_DATA_REPLY`].
pub fn extract_reply(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Object(map) => REPLY_FIELDS
            .iter()
            .filter_map(|field| map.get(*field))
            .find(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| data.to_string()),
        Value::Array(_) => data.to_string(),
        _ => NO_DATA_REPLY.to_string(),
    }
}
