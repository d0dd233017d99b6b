//! HTTP client for the upstream completion endpoint.
//!
//! Both modes return [`Result`]: a one-shot failure is an `Err` the caller turns into
//! an error response, and a streaming failure is either an `Err` before the first
//! fragment or an `Err` item inside the stream.

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, UpstreamError};
use crate::sse::{Frame, FrameDecoder};
use crate::types::{ChatMessage, ChatRequest, CompletionResponse};

/// Lazy, single-pass sequence of text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl UpstreamClient {
    /// Client for `<base_url>/chat`.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request a full completion and return its text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!("[UPSTREAM] completion request with {} messages", messages.len());

        let response = self
            .post(messages, false)
            .timeout(COMPLETION_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        body.into_text()
            .ok_or_else(|| UpstreamError::InvalidResponse("response has no content".to_string()))
    }

    /// Request a streamed completion.
    ///
    /// Fails before yielding anything if the request cannot be sent or the status is not
    /// a success. The stream ends at the `[DONE]` sentinel or when the body ends, and
    /// yields at most one `Err`, as its last item.
    ///
    /// No total timeout is applied; a provider that stops sending without closing the
    /// connection stalls the stream.
    pub async fn stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream> {
        debug!("[UPSTREAM] streaming request with {} messages", messages.len());

        let response = self.post(messages, true).send().await?;
        let response = check_status(response).await?;
        let mut body = Box::pin(response.bytes_stream());

        let fragments = async_stream::stream! {
            let mut decoder = FrameDecoder::new();

            'read: while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("[UPSTREAM] stream read failed: {}", e);
                        yield Err(UpstreamError::from(e));
                        break 'read;
                    }
                };

                for frame in decoder.push(&chunk) {
                    if let Frame::Fragment(text) = frame {
                        yield Ok(text);
                    }
                }
                if decoder.is_done() {
                    break 'read;
                }
            }

            for frame in decoder.finish() {
                if let Frame::Fragment(text) = frame {
                    yield Ok(text);
                }
            }
        };

        Ok(Box::pin(fragments))
    }

    fn post(&self, messages: &[ChatMessage], stream: bool) -> reqwest::RequestBuilder {
        self.http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&ChatRequest { messages, stream })
    }
}

/// Pass a success response through; turn anything else into [`UpstreamError::Api`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_detail(status, &body);
    warn!("[UPSTREAM] {} from provider: {}", status.as_u16(), message);

    Err(UpstreamError::Api {
        status: status.as_u16(),
        message,
    })
}

/// The `error` string of a JSON error body, else a generic message with the status.
fn error_detail(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from))
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| format!("Upstream API error: {}", status.as_u16()))
}
