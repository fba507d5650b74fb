use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;

use crate::error::StreamError;
use crate::session::SessionId;

/// Raw reply body, chunk by chunk, exactly as the transport delivered it.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, StreamError>>;

/// One accepted submission, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: SessionId,
    pub generation: u64,
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    message: &'a str,
    session_id: &'a SessionId,
}

/// Anything that can turn a chat request into a streamed reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, StreamError>;

    async fn health(&self) -> Result<(), StreamError>;
}

/// HTTP client for the RAG-on-Tap backend.
#[derive(Clone)]
pub struct RagClient {
    client: Client,
    base_url: String,
}

impl RagClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_connect_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for RagClient {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, StreamError> {
        let url = format!("{}/api/chat", self.base_url);

        let payload = ChatPayload {
            message: &request.message,
            session_id: &request.session_id,
        };

        // `.json()` also sets `Content-Type: application/json`
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(StreamError::Request)?;

        if !response.status().is_success() {
            return Err(StreamError::Status(response.status()));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::Body));

        Ok(body.boxed())
    }

    async fn health(&self) -> Result<(), StreamError> {
        let url = format!("{}/api/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(StreamError::Request)?;

        if !response.status().is_success() {
            return Err(StreamError::Status(response.status()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = RagClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
