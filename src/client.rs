//! HTTP client for the precedent search backend.
//!
//! Two endpoints: a JSON request/response search, and a streaming chat
//! whose body is decoded through the `sse` layer into typed events.

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder};
use thiserror::Error;

use crate::config::Config;
use crate::models::{ErrorDetail, SearchResponse, StructuredRequest};
use crate::sse::{interpret_block, BlockDecoder, StreamEvent};

/// Error type for API client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was available.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Response body could not be deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Server returned a non-success status.
    #[error("Server error ({status}): {detail}")]
    Server { status: u16, detail: String },
}

impl ClientError {
    /// Message suitable for showing to the user.
    ///
    /// For server failures this is the backend's `detail` verbatim, without
    /// the status prefix.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Typed event stream from the chat endpoint.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ClientError>> + Send>>;

/// API surface the orchestrator depends on.
///
/// Abstracted as a trait so the two-phase ask can be driven by a scripted
/// backend in tests.
#[async_trait]
pub trait PrecedentApi: Send + Sync {
    /// Run the structured search phase.
    async fn search(&self, request: &StructuredRequest) -> Result<SearchResponse, ClientError>;

    /// Open the structured chat stream.
    async fn stream_chat(&self, request: &StructuredRequest) -> Result<EventStream, ClientError>;
}

/// Incremental UTF-8 decoder for the chunked transfer.
///
/// A multi-byte character may be split across two physical chunks; the
/// incomplete tail is carried over instead of being mangled.
#[derive(Debug, Default)]
struct Utf8Carry {
    partial: Vec<u8>,
}

impl Utf8Carry {
    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.partial);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(err) if err.error_len().is_none() => {
                // Incomplete trailing sequence: decode up to it, carry the rest.
                let valid = err.valid_up_to();
                self.partial = bytes[valid..].to_vec();
                String::from_utf8_lossy(&bytes[..valid]).into_owned()
            }
            // Genuinely invalid bytes are replaced; the grammar is ASCII-framed.
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Client for the precedent search backend API.
pub struct ApiClient {
    base_url: String,
    user_id: String,
    bearer_token: Option<String>,
    client: Client,
}

impl ApiClient {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user_id: config.user_id.clone(),
            bearer_token: config.bearer_token.clone(),
            client: Client::new(),
        }
    }

    /// Create a client pointed at a specific base URL with defaults.
    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(&Config {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Config::default()
        })
    }

    /// Attach a bearer token to all subsequent requests.
    pub fn with_auth(mut self, token: &str) -> Self {
        self.bearer_token = Some(token.to_string());
        self
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-user-id", &self.user_id);
        if let Some(token) = &self.bearer_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder
    }

    /// Extract the backend's `detail` message from a failure body.
    async fn server_error(response: reqwest::Response, fallback: &str) -> ClientError {
        let status = response.status().as_u16();
        let detail = match response.bytes().await {
            Ok(body) => serde_json::from_slice::<ErrorDetail>(&body)
                .map(|e| e.detail)
                .unwrap_or_else(|_| fallback.to_string()),
            Err(_) => fallback.to_string(),
        };
        ClientError::Server { status, detail }
    }

    /// Run the structured search phase.
    ///
    /// Sends `POST /api/search/structured` and returns the full response.
    pub async fn search(&self, request: &StructuredRequest) -> Result<SearchResponse, ClientError> {
        let response = self
            .post("/api/search/structured")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response, "Search failed").await);
        }

        Ok(response.json::<SearchResponse>().await?)
    }

    /// Open the structured chat stream.
    ///
    /// Sends `POST /api/chat/structured/stream` and returns a stream of
    /// typed events. Blocks that fail the wire grammar are dropped inside
    /// the stream, never surfaced as items.
    pub async fn stream_chat(
        &self,
        request: &StructuredRequest,
    ) -> Result<EventStream, ClientError> {
        let response = self
            .post("/api/chat/structured/stream")
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response, "Streaming chat failed").await);
        }

        let bytes_stream = response.bytes_stream();

        let event_stream = stream::unfold(
            (
                bytes_stream,
                BlockDecoder::new(),
                Utf8Carry::default(),
                VecDeque::<StreamEvent>::new(),
                false,
            ),
            |(mut bytes_stream, mut decoder, mut carry, mut pending, mut ended)| async move {
                loop {
                    if let Some(event) = pending.pop_front() {
                        return Some((Ok(event), (bytes_stream, decoder, carry, pending, ended)));
                    }
                    if ended {
                        return None;
                    }

                    match bytes_stream.next().await {
                        Some(Ok(chunk)) => {
                            let text = carry.decode(&chunk);
                            for block in decoder.feed(&text) {
                                if let Some(event) =
                                    interpret_block(&block).as_ref().and_then(StreamEvent::from_wire)
                                {
                                    pending.push_back(event);
                                }
                            }
                        }
                        Some(Err(err)) => {
                            ended = true;
                            return Some((
                                Err(ClientError::Http(err)),
                                (bytes_stream, decoder, carry, pending, ended),
                            ));
                        }
                        None => {
                            // End of transfer: the last block may lack its separator.
                            ended = true;
                            if let Some(block) = decoder.flush() {
                                if let Some(event) =
                                    interpret_block(&block).as_ref().and_then(StreamEvent::from_wire)
                                {
                                    pending.push_back(event);
                                }
                            }
                        }
                    }
                }
            },
        );

        Ok(Box::pin(event_stream))
    }
}

#[async_trait]
impl PrecedentApi for ApiClient {
    async fn search(&self, request: &StructuredRequest) -> Result<SearchResponse, ClientError> {
        ApiClient::search(self, request).await
    }

    async fn stream_chat(&self, request: &StructuredRequest) -> Result<EventStream, ClientError> {
        ApiClient::stream_chat(self, request).await
    }
}
