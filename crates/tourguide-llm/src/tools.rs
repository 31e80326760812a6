//! Tool types for function calling
//!
//! The Responses API accepts a flat `tools` array mixing custom functions and
//! built-in tools such as `web_search`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Definition of a custom function the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON schema of the arguments
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Entry of the request `tools` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolSpec {
    /// Custom function
    Function(ToolDefinition),
    /// Provider-side web search
    WebSearch {
        /// `low`, `medium` or `high`
        search_context_size: String,
    },
}

impl ToolSpec {
    /// Built-in web search with the given context size
    #[must_use]
    pub fn web_search(search_context_size: impl Into<String>) -> Self {
        Self::WebSearch {
            search_context_size: search_context_size.into(),
        }
    }

    /// Function name, if this is a custom function
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Self::Function(def) => Some(&def.name),
            Self::WebSearch { .. } => None,
        }
    }
}

impl From<ToolDefinition> for ToolSpec {
    fn from(def: ToolDefinition) -> Self {
        Self::Function(def)
    }
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id echoed back in the function output
    pub call_id: String,
    /// Function name
    pub name: String,
    /// Arguments as a JSON string
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    #[must_use]
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the arguments as a JSON object. Blank arguments parse as `{}`.
    pub fn parse_arguments(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        match serde_json::from_str(&self.arguments) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::InvalidResponse(format!(
                "arguments of {} are not an object: {}",
                self.name, other
            ))),
            Err(e) => Err(Error::InvalidResponse(e.to_string())),
        }
    }
}
