//! OpenAI-compatible Responses API provider
//!
//! Targets Yandex AI Studio by default (`gpt://<folder>/<model>` model URIs,
//! folder id sent as the project header). Any endpoint implementing
//! `POST {base_url}/responses` with server-sent events works.

use crate::completion::{ModelResponse, OutputItem, ResponseRequest, StreamEvent};
use crate::error::{Error, Result};
use crate::provider::{ResponseStream, ResponsesProvider};
use crate::tools::ToolCall;
use crate::util::mask_api_key;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://ai.api.cloud.yandex.net/v1";

/// Default model name inside the folder
pub const DEFAULT_MODEL: &str = "yandexgpt";

/// Provider configuration
#[derive(Clone)]
pub struct ResponsesConfig {
    /// API key
    pub api_key: String,
    /// Cloud folder id (project)
    pub folder_id: String,
    /// Base URL
    pub base_url: String,
    /// Model name inside the folder
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for ResponsesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponsesConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("folder_id", &self.folder_id)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Defaults with empty credentials
impl Default for ResponsesConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl ResponsesConfig {
    /// Create a configuration for the given credentials
    #[must_use]
    pub fn new(api_key: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            folder_id: folder_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Create configuration from `YANDEX_API_KEY`, `YANDEX_FOLDER_ID`, `YANDEX_MODEL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("YANDEX_API_KEY")
            .map_err(|_| Error::NotConfigured("YANDEX_API_KEY not set".to_string()))?;
        let folder_id = std::env::var("YANDEX_FOLDER_ID")
            .map_err(|_| Error::NotConfigured("YANDEX_FOLDER_ID not set".to_string()))?;
        let model = std::env::var("YANDEX_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, folder_id).with_model(model))
    }

    /// Set the model name
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full model URI
    #[must_use]
    pub fn model_uri(&self) -> String {
        if self.model.contains("://") {
            self.model.clone()
        } else {
            format!("gpt://{}/{}", self.folder_id, self.model)
        }
    }
}

/// HTTP Responses API provider
pub struct ResponsesApiProvider {
    client: Client,
    config: ResponsesConfig,
    model_uri: String,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(flatten)]
    request: &'a ResponseRequest,
    stream: bool,
}

#[derive(Deserialize)]
struct WireResponse {
    id: String,
    #[serde(default)]
    output: Vec<Value>,
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

impl ResponsesApiProvider {
    /// Create a new provider
    pub fn new(config: ResponsesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::NotConfigured(format!("http client: {e}")))?;
        let model_uri = config.model_uri();
        Ok(Self {
            client,
            config,
            model_uri,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ResponsesConfig::from_env()?)
    }

    async fn post(&self, request: &ResponseRequest, stream: bool) -> Result<reqwest::Response> {
        let mut request = request.clone();
        if request.model.is_empty() {
            request.model = self.model_uri.clone();
        }

        let response = self
            .client
            .post(format!("{}/responses", self.config.base_url))
            .header("Authorization", format!("Api-Key {}", self.config.api_key))
            .header("OpenAI-Project", &self.config.folder_id)
            .json(&WireRequest {
                request: &request,
                stream,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "responses API returned an error");
            return Err(Error::from_status(status.as_u16(), &body));
        }
        Ok(response)
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Interpret one raw `output` element
pub fn parse_output_item(item: &Value) -> OutputItem {
    let item_type = item.get("type").and_then(Value::as_str).unwrap_or_default();
    match item_type {
        "message" => {
            let text = item
                .get("content")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter(|p| p.get("type").and_then(Value::as_str) == Some("output_text"))
                        .filter_map(|p| p.get("text").and_then(Value::as_str))
                        .collect::<String>()
                })
                .unwrap_or_default();
            OutputItem::Message { text }
        }
        "function_call" => {
            let call_id = match str_field(item, "call_id") {
                "" => str_field(item, "id"),
                id => id,
            };
            let arguments = match str_field(item, "arguments") {
                "" => "{}",
                args => args,
            };
            OutputItem::FunctionCall(ToolCall::new(call_id, str_field(item, "name"), arguments))
        }
        "web_search_call" => OutputItem::WebSearchCall {
            id: item
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        other => OutputItem::Other {
            item_type: other.to_string(),
        },
    }
}

/// Interpret one SSE `data` payload. Returns `None` for events the loop does not use.
pub fn parse_stream_event(data: &Value) -> Option<StreamEvent> {
    let response_id = || {
        data.pointer("/response/id")
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    match data.get("type").and_then(Value::as_str)? {
        "response.created" => response_id().map(|id| StreamEvent::Created { response_id: id }),
        "response.output_text.delta" => data
            .get("delta")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(|d| StreamEvent::TextDelta(d.to_string())),
        "response.output_item.done" => data
            .get("item")
            .map(|item| StreamEvent::ItemDone(parse_output_item(item))),
        "response.completed" | "response.done" => {
            response_id().map(|id| StreamEvent::Completed { response_id: id })
        }
        "response.failed" | "error" => {
            let message = data
                .pointer("/response/error/message")
                .or_else(|| data.pointer("/error/message"))
                .or_else(|| data.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("response failed")
                .to_string();
            Some(StreamEvent::Failed { message })
        }
        _ => None,
    }
}

#[async_trait::async_trait]
impl ResponsesProvider for ResponsesApiProvider {
    fn name(&self) -> &str {
        "responses-api"
    }

    fn default_model(&self) -> &str {
        &self.model_uri
    }

    #[instrument(skip(self, request), fields(items = request.input.len(), resumed = request.previous_response_id.is_some()))]
    async fn respond(&self, request: ResponseRequest) -> Result<ModelResponse> {
        debug!("sending response request");
        let response = self.post(&request, false).await?;
        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        if wire.status.as_deref() == Some("failed") {
            let message = wire
                .error
                .as_ref()
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("response status failed");
            return Err(Error::from_stream_failure(message));
        }

        let output: Vec<OutputItem> = wire.output.iter().map(parse_output_item).collect();
        let mut response = ModelResponse::from_items(wire.id, output);
        if let Some(text) = wire.output_text.filter(|t| !t.is_empty()) {
            response.output_text = text;
        }
        Ok(response)
    }

    #[instrument(skip(self, request), fields(items = request.input.len(), resumed = request.previous_response_id.is_some()))]
    async fn respond_stream(&self, request: ResponseRequest) -> Result<ResponseStream> {
        debug!("opening response stream");
        let response = self.post(&request, true).await?;

        let events = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(sse) if sse.data == "[DONE]" => None,
                    Ok(sse) => match serde_json::from_str::<Value>(&sse.data) {
                        Ok(data) => parse_stream_event(&data).map(Ok),
                        Err(e) => Some(Err(Error::InvalidResponse(format!(
                            "SSE parsing error: {e}"
                        )))),
                    },
                    Err(e) => Some(Err(Error::Network(format!("SSE stream error: {e}")))),
                }
            });
        Ok(Box::pin(events))
    }
}
