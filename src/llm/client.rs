//! LLM Client implementation
//!
//! Streaming client for OpenAI-compatible chat-completion endpoints.
//! Parses the SSE response by hand and assembles incremental tool-call
//! argument fragments into completed `ToolCallRequest`s.

use super::{
    chat::{ChatMessage, ChatRequest, StreamEvent, ToolCallRequest, ToolSpec},
    ChatBackend, LlmConfig, TokenUsage,
};
use anyhow::{Context, Result};
use async_stream::try_stream;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{
    header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE},
    Client as HttpClient,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Streaming chat client
pub struct LlmClient {
    config: LlmConfig,
    http_client: HttpClient,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(LlmClient {
            config,
            http_client,
        })
    }

    /// Build headers for API requests
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse()?);
        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                headers.insert(AUTHORIZATION, format!("Bearer {}", api_key).parse()?);
            }
        }
        Ok(headers)
    }
}

impl ChatBackend for LlmClient {
    fn stream_chat(&self, request: ChatRequest) -> BoxStream<'static, Result<StreamEvent>> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = WireRequest {
            model: self.config.model.clone(),
            messages: request.messages,
            tools: wire_tools(&request.tools),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: true,
        };
        let http_client = self.http_client.clone();
        let headers = self.build_headers();

        Box::pin(try_stream! {
            let headers = headers?;
            let response = http_client
                .post(&url)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .context("Failed to send streaming request")?
                .error_for_status()
                .context("API request failed")?;

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut pending: Vec<PendingToolCall> = Vec::new();

            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk.context("Failed to read stream chunk")?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Process complete SSE lines
                while let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].trim_end_matches('\r').to_string();
                    buffer.drain(..=newline_pos);

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };

                    if data == "[DONE]" {
                        for call in finish_tool_calls(std::mem::take(&mut pending)) {
                            yield StreamEvent::ToolCall(call);
                        }
                        yield StreamEvent::Done;
                        return;
                    }

                    let Ok(parsed) = serde_json::from_str::<WireStreamResponse>(data) else {
                        // Keep-alives and vendor extras are not fatal
                        continue;
                    };

                    if let Some(choice) = parsed.choices.first() {
                        if let Some(content) = &choice.delta.content {
                            if !content.is_empty() {
                                yield StreamEvent::TextDelta(content.clone());
                            }
                        }
                        if let Some(deltas) = &choice.delta.tool_calls {
                            apply_tool_call_deltas(&mut pending, deltas);
                        }
                    }

                    if let Some(usage) = parsed.usage {
                        yield StreamEvent::Usage(TokenUsage {
                            prompt_tokens: usage.prompt_tokens,
                            completion_tokens: usage.completion_tokens,
                            total_tokens: usage.total_tokens,
                        });
                    }
                }
            }

            // Stream ended without an explicit [DONE]
            for call in finish_tool_calls(std::mem::take(&mut pending)) {
                yield StreamEvent::ToolCall(call);
            }
            yield StreamEvent::Done;
        })
    }
}

/// A tool call under assembly from streamed argument fragments
#[derive(Debug, Default, Clone)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Fold one chunk's tool-call deltas into the pending set, keyed by index.
fn apply_tool_call_deltas(pending: &mut Vec<PendingToolCall>, deltas: &[WireToolCallDelta]) {
    for delta in deltas {
        if pending.len() <= delta.index {
            pending.resize(delta.index + 1, PendingToolCall::default());
        }
        let slot = &mut pending[delta.index];
        if let Some(id) = &delta.id {
            slot.id.push_str(id);
        }
        if let Some(function) = &delta.function {
            if let Some(name) = &function.name {
                slot.name.push_str(name);
            }
            if let Some(arguments) = &function.arguments {
                slot.arguments.push_str(arguments);
            }
        }
    }
}

/// Turn fully assembled pending calls into requests, in index order.
///
/// Malformed argument JSON is preserved as a raw string so the dispatch
/// boundary can report it back to the model instead of dropping the call.
fn finish_tool_calls(pending: Vec<PendingToolCall>) -> Vec<ToolCallRequest> {
    pending
        .into_iter()
        .filter(|p| !p.name.is_empty())
        .map(|p| {
            let input = if p.arguments.trim().is_empty() {
                Value::Object(serde_json::Map::new())
            } else {
                serde_json::from_str(&p.arguments)
                    .unwrap_or_else(|_| Value::String(p.arguments.clone()))
            };
            ToolCallRequest {
                id: p.id,
                name: p.name,
                input,
            }
        })
        .collect()
}

fn wire_tools(tools: &[ToolSpec]) -> Option<Vec<WireTool>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|t| WireTool {
                kind: "function".to_string(),
                function: WireFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect(),
    )
}

// Wire types for the OpenAI-compatible API

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
struct WireStreamResponse {
    #[serde(default)]
    choices: Vec<WireStreamChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireStreamChoice {
    #[serde(default)]
    delta: WireDelta,
}

#[derive(Deserialize, Default)]
struct WireDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Deserialize)]
struct WireToolCallDelta {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<WireFunctionDelta>,
}

#[derive(Deserialize)]
struct WireFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
