//! Tourguide LLM - Responses API provider abstraction
//!
//! This crate provides the model-facing side of the assistant:
//! - Message / input item types with the Responses API wire shape
//! - Tool specs (custom functions and built-in web search)
//! - `ResponsesProvider` trait with blocking and streaming calls
//! - HTTP provider for OpenAI-compatible Responses endpoints
//! - Scripted mock provider for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod provider;
pub mod responses;
pub mod tools;
pub mod util;

pub use completion::{ModelResponse, OutputItem, ResponseRequest, StreamEvent};
pub use error::{Error, Result};
pub use message::{InputItem, Message, MessageRole};
pub use mock::{MockProvider, MockReply};
pub use provider::{ResponseStream, ResponsesProvider};
pub use responses::{ResponsesApiProvider, ResponsesConfig};
pub use tools::{ToolCall, ToolDefinition, ToolSpec};
