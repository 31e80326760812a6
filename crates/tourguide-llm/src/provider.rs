//! Provider trait

use crate::completion::{ModelResponse, ResponseRequest, StreamEvent};
use crate::error::Result;
use futures::stream::BoxStream;

/// Stream of response events
pub type ResponseStream = BoxStream<'static, Result<StreamEvent>>;

/// A model endpoint speaking the Responses API
#[async_trait::async_trait]
pub trait ResponsesProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Model used when the request leaves `model` empty
    fn default_model(&self) -> &str;

    /// Run one model invocation to completion
    async fn respond(&self, request: ResponseRequest) -> Result<ModelResponse>;

    /// Run one model invocation, yielding events as they arrive.
    ///
    /// Errors raised before the first event (HTTP status, connect failure) are
    /// returned directly; failures after that arrive as stream items.
    async fn respond_stream(&self, request: ResponseRequest) -> Result<ResponseStream>;
}
