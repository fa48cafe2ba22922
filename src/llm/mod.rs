//! LLM client module
//!
//! Provides the wire types and streaming client for OpenAI-compatible
//! chat-completion endpoints, plus the `ChatBackend` seam the conversation
//! engine is written against.

pub mod chat;
pub mod client;

pub use chat::{ChatMessage, ChatRequest, MessageRole, StreamEvent, ToolCallRequest, ToolSpec};
pub use client::LlmClient;

use anyhow::Result;
use futures::stream::BoxStream;

/// LLM endpoint configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API endpoint base URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// API key (if required)
    pub api_key: Option<String>,
    /// Maximum tokens in response
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl LlmConfig {
    /// Create a new LLM config
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        LlmConfig {
            base_url,
            model,
            api_key,
            max_tokens: Some(4096),
            temperature: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

impl std::fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tokens: {} (prompt: {}, completion: {})",
            self.total_tokens, self.prompt_tokens, self.completion_tokens
        )
    }
}

/// The model-call boundary consumed by the conversation engine.
///
/// One call produces the finite event stream of one step: text deltas in
/// arrival order, completed tool-call requests, usage, and a terminal
/// `Done`. Stream errors are transport failures and abort the turn.
pub trait ChatBackend: Send + Sync {
    fn stream_chat(&self, request: ChatRequest) -> BoxStream<'static, Result<StreamEvent>>;
}
