//! Scripted provider for tests
//!
//! Replies are consumed in order by both `respond` and `respond_stream`.
//! Every request is recorded so tests can assert on context handling.

use crate::completion::{ModelResponse, ResponseRequest, StreamEvent};
use crate::error::{Error, Result};
use crate::provider::{ResponseStream, ResponsesProvider};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted reply
#[derive(Debug)]
pub enum MockReply {
    /// A complete response (streamed as [`StreamEvent::script_for`])
    Response(ModelResponse),
    /// A raw event script, only meaningful for `respond_stream`
    Events(Vec<StreamEvent>),
    /// An error returned before any output
    Error(Error),
}

/// Provider returning queued replies
#[derive(Clone, Default)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ResponseRequest>>>,
}

impl MockProvider {
    /// Create an empty mock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn push_response(&self, response: ModelResponse) {
        self.push(MockReply::Response(response));
    }

    /// Queue an error
    pub fn push_error(&self, error: Error) {
        self.push(MockReply::Error(error));
    }

    /// Queue a raw event script
    pub fn push_events(&self, events: Vec<StreamEvent>) {
        self.push(MockReply::Events(events));
    }

    /// Queue any reply
    pub fn push(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<ResponseRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of requests received so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Replies not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next(&self, request: ResponseRequest) -> MockReply {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| {
                MockReply::Response(ModelResponse::text("mock-default", "mock response"))
            })
    }
}

#[async_trait::async_trait]
impl ResponsesProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn respond(&self, request: ResponseRequest) -> Result<ModelResponse> {
        match self.next(request) {
            MockReply::Response(response) => Ok(response),
            MockReply::Error(error) => Err(error),
            MockReply::Events(_) => Err(Error::InvalidResponse(
                "event script queued for a non-streaming call".to_string(),
            )),
        }
    }

    async fn respond_stream(&self, request: ResponseRequest) -> Result<ResponseStream> {
        let events = match self.next(request) {
            MockReply::Response(response) => StreamEvent::script_for(&response),
            MockReply::Events(events) => events,
            MockReply::Error(error) => return Err(error),
        };
        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::InputItem;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_replies_in_order_and_requests_recorded() {
        let mock = MockProvider::new();
        mock.push_response(ModelResponse::text("r1", "первый"));
        mock.push_error(Error::RateLimit);

        let first = tokio_test::assert_ok!(
            mock.respond(ResponseRequest::new(vec![InputItem::user("a")]))
                .await
        );
        assert_eq!(first.final_text(), "первый");

        let second = tokio_test::assert_err!(mock.respond(ResponseRequest::default()).await);
        assert!(matches!(second, Error::RateLimit));

        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.requests()[0].input, vec![InputItem::user("a")]);
    }

    #[tokio::test]
    async fn test_stream_from_response() {
        let mock = MockProvider::new();
        mock.push_response(ModelResponse::text("r1", "один два"));

        let stream = mock.respond_stream(ResponseRequest::default()).await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert!(events.iter().all(|e| e.is_ok()));
        assert!(events
            .iter()
            .any(|e| matches!(e, Ok(StreamEvent::TextDelta(t)) if t == "два")));
    }

    #[tokio::test]
    async fn test_default_reply_when_exhausted() {
        let mock = MockProvider::new();
        let response = mock.respond(ResponseRequest::default()).await.unwrap();
        assert_eq!(response.final_text(), "mock response");
        assert_eq!(mock.remaining(), 0);
    }
}
