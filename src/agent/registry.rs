//! Tool registry
//!
//! Closed mapping from capability name to implementation, resolved once at
//! startup and never mutated afterwards. The conversation engine is
//! agnostic to which capabilities exist; it only dispatches by name.

use crate::agent::tool::Tool;
use crate::error::ShaiError;
use crate::llm::ToolSpec;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Advertised order, kept stable for the model
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let order: Vec<String> = tools.iter().map(|t| t.name().to_string()).collect();
        let tools = tools
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        ToolRegistry { tools, order }
    }

    /// The tool schemas advertised to the model on every step.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Dispatch one tool call and produce its output value.
    ///
    /// Failures never abort the conversation: an unknown tool, bad
    /// arguments, a blocked command, or a spawn failure all come back as an
    /// `{"error": …}` output the model sees on its next step and can
    /// correct for.
    pub async fn dispatch(&self, name: &str, input: &Value) -> Value {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = name, "model requested unknown tool");
            let err = ShaiError::ToolNotFound {
                name: name.to_string(),
            };
            return json!({ "error": err.to_string() });
        };

        match tool.call(input).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                json!({ "error": e.to_string() })
            }
        }
    }
}
