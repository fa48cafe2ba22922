use crate::error::ShaiError;
use async_trait::async_trait;
use serde_json::Value;

/// A trait for tools the model may invoke.
///
/// Tools are the only way the model acts on the world. Each tool declares a
/// JSON schema for its input and must be `Send + Sync` so the engine can
/// dispatch it from its task.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name advertised to the model (e.g. "run_bash")
    fn name(&self) -> &str;

    /// A description of what the tool does and what it refuses to do
    fn description(&self) -> &str;

    /// JSON schema for the tool's input object
    fn parameters(&self) -> Value;

    /// Execute the tool with the provided input
    async fn call(&self, input: &Value) -> Result<Value, ShaiError>;
}
