//! Conversation messages and request input items

use serde::{Deserialize, Serialize};

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System / developer instructions
    System,
    /// End user
    User,
    /// Model
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single text message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the author
    pub role: MessageRole,
    /// Text content
    pub content: String,
}

impl Message {
    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Whether this message was authored by the user
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// Whether this message was authored by the model
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

/// One element of the `input` array sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    /// A plain text message
    Message(Message),
    /// The result of a function call the model requested earlier
    FunctionCallOutput {
        /// Correlation id of the originating call
        call_id: String,
        /// JSON-encoded result
        output: String,
    },
}

impl InputItem {
    /// Shorthand for a user message item
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::Message(Message::user(content))
    }

    /// Shorthand for a function result item
    #[must_use]
    pub fn function_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }
}

impl From<Message> for InputItem {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_item_wire_shape() {
        let item = InputItem::user("Привет");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Привет");
    }

    #[test]
    fn test_function_output_wire_shape() {
        let item = InputItem::function_output("call_1", r#"{"ok":true}"#);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "function_call_output");
        assert_eq!(json["call_id"], "call_1");
        assert_eq!(json["output"], r#"{"ok":true}"#);
    }

    #[test]
    fn test_role_helpers() {
        assert!(Message::user("a").is_user());
        assert!(Message::assistant("a").is_assistant());
        assert_eq!(MessageRole::System.as_str(), "system");
    }
}
