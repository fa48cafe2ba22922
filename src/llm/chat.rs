//! Chat message types for LLM communication
//!
//! Defines the message structures used for chat completions against
//! OpenAI-compatible endpoints, including the tool-calling payloads fed
//! back into a step sequence.

use crate::llm::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of the message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions for the model)
    System,
    /// User message
    User,
    /// Assistant message (model response)
    Assistant,
    /// Tool message (result fed back for a tool call)
    Tool,
}

/// A tool call as carried on an assistant message when replaying a step
/// sequence back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionPayload {
    pub name: String,
    /// JSON-encoded argument object, as the wire format requires
    pub arguments: String,
}

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
    /// Tool calls issued by this assistant message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallPayload>>,
    /// For `Tool` role messages: the id of the call being answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: MessageRole::User,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallPayload>,
    ) -> Self {
        ChatMessage {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    /// Create a tool-result message answering one tool call
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage {
            role: MessageRole::Tool,
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A capability advertised to the model: name, description, JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Request for one model step
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Ordered messages for this step
    pub messages: Vec<ChatMessage>,
    /// Tool schemas the model may call
    pub tools: Vec<ToolSpec>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        ChatRequest {
            messages,
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }
}

/// A completed tool-call request extracted from a model stream
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, echoed back on the tool message
    pub id: String,
    /// Capability name
    pub name: String,
    /// Parsed argument object
    pub input: Value,
}

/// Stream event types for streaming responses
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Incremental assistant text
    TextDelta(String),
    /// The model requested a tool invocation (arguments fully assembled)
    ToolCall(ToolCallRequest),
    /// Token usage information for this step
    Usage(TokenUsage),
    /// The step finished
    Done,
}
