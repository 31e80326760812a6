//! Request and response types of the Responses API

use crate::message::InputItem;
use crate::tools::{ToolCall, ToolSpec};
use serde::{Deserialize, Serialize};

/// One model invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseRequest {
    /// Model URI; providers substitute their default when empty
    pub model: String,
    /// System instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// New input items (or the full log when replaying)
    pub input: Vec<InputItem>,
    /// Available tools
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tools: Vec<ToolSpec>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Output token cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Continuation pointer of the previous response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

impl ResponseRequest {
    /// Create a request with the given input
    #[must_use]
    pub fn new(input: Vec<InputItem>) -> Self {
        Self {
            input,
            ..Self::default()
        }
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the instructions
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the tools
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token cap
    #[must_use]
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    /// Resume from a previous response
    #[must_use]
    pub fn with_previous_response_id(mut self, id: Option<String>) -> Self {
        self.previous_response_id = id;
        self
    }
}

/// One element of a response `output` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputItem {
    /// Assistant text message
    Message {
        /// Concatenated `output_text` parts
        text: String,
    },
    /// Function call request
    FunctionCall(ToolCall),
    /// Built-in web search invocation
    WebSearchCall {
        /// Item id
        id: String,
    },
    /// Any item type not interpreted by this crate
    Other {
        /// Upstream `type` value
        #[serde(rename = "type")]
        item_type: String,
    },
}

impl OutputItem {
    /// Upstream type name of the item
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Message { .. } => "message",
            Self::FunctionCall(_) => "function_call",
            Self::WebSearchCall { .. } => "web_search_call",
            Self::Other { item_type } => item_type,
        }
    }
}

/// A complete (non-streamed) model response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Response id, usable as the next continuation pointer
    pub id: String,
    /// Output items in order
    pub output: Vec<OutputItem>,
    /// Aggregated text, when the provider supplies one
    #[serde(default)]
    pub output_text: String,
}

impl ModelResponse {
    /// Response carrying a single text message
    #[must_use]
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            output: vec![OutputItem::Message { text: text.clone() }],
            output_text: text,
        }
    }

    /// Response carrying only function calls
    #[must_use]
    pub fn tool_calls(id: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            id: id.into(),
            output: calls.into_iter().map(OutputItem::FunctionCall).collect(),
            output_text: String::new(),
        }
    }

    /// Response with no output items at all
    #[must_use]
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Response built from arbitrary items; `output_text` is derived from message items
    #[must_use]
    pub fn from_items(id: impl Into<String>, output: Vec<OutputItem>) -> Self {
        let output_text = output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<String>();
        Self {
            id: id.into(),
            output,
            output_text,
        }
    }

    /// Final text: `output_text`, else the first non-empty message item
    #[must_use]
    pub fn final_text(&self) -> String {
        if !self.output_text.is_empty() {
            return self.output_text.clone();
        }
        self.output
            .iter()
            .find_map(|item| match item {
                OutputItem::Message { text } if !text.is_empty() => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Function calls in output order
    #[must_use]
    pub fn function_calls(&self) -> Vec<ToolCall> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::FunctionCall(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether any web search item is present
    #[must_use]
    pub fn has_web_search(&self) -> bool {
        self.output
            .iter()
            .any(|item| matches!(item, OutputItem::WebSearchCall { .. }))
    }

    /// Upstream type names of all output items
    #[must_use]
    pub fn item_types(&self) -> Vec<&str> {
        self.output.iter().map(OutputItem::type_name).collect()
    }
}

/// Incremental event of a streamed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Response accepted upstream
    Created {
        /// Response id
        response_id: String,
    },
    /// Fragment of assistant text
    TextDelta(String),
    /// An output item finished
    ItemDone(OutputItem),
    /// Response finished
    Completed {
        /// Response id
        response_id: String,
    },
    /// Upstream reported a failure mid-stream
    Failed {
        /// Error message
        message: String,
    },
}

impl StreamEvent {
    /// Replay a finished response as the event sequence a streaming provider would emit.
    ///
    /// Text is split into whitespace-preserving word chunks.
    #[must_use]
    pub fn script_for(response: &ModelResponse) -> Vec<Self> {
        let mut events = vec![Self::Created {
            response_id: response.id.clone(),
        }];
        for item in &response.output {
            if let OutputItem::Message { text } = item {
                events.extend(
                    text.split_inclusive(' ')
                        .map(|chunk| Self::TextDelta(chunk.to_string())),
                );
            }
            events.push(Self::ItemDone(item.clone()));
        }
        events.push(Self::Completed {
            response_id: response.id.clone(),
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_skips_empty_fields() {
        let request = ResponseRequest::new(vec![InputItem::user("hi")]).with_model("gpt://f/m");
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("previous_response_id").is_none());
        assert!(json.get("tools").is_none());
        assert_eq!(json["model"], "gpt://f/m");
    }

    #[test]
    fn test_final_text_prefers_output_text() {
        let mut response = ModelResponse::text("r1", "из сообщения");
        response.output_text = "агрегированный".to_string();
        assert_eq!(response.final_text(), "агрегированный");

        response.output_text.clear();
        assert_eq!(response.final_text(), "из сообщения");
        assert_eq!(ModelResponse::empty("r2").final_text(), "");
    }

    #[test]
    fn test_function_calls_and_item_types() {
        let response = ModelResponse::from_items(
            "r1",
            vec![
                OutputItem::WebSearchCall { id: "ws".into() },
                OutputItem::FunctionCall(ToolCall::new("c1", "get_current_date", "{}")),
            ],
        );
        assert_eq!(response.function_calls().len(), 1);
        assert!(response.has_web_search());
        assert_eq!(response.item_types(), vec!["web_search_call", "function_call"]);
        assert!(response.output_text.is_empty());
    }

    #[test]
    fn test_script_for_reassembles_text() {
        let response = ModelResponse::text("r1", "Добрый день! Чем помочь?");
        let events = StreamEvent::script_for(&response);
        let text: String = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::TextDelta(d) => Some(d.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Добрый день! Чем помочь?");
        assert!(matches!(events.first(), Some(StreamEvent::Created { .. })));
        assert!(matches!(events.last(), Some(StreamEvent::Completed { .. })));
    }
}
