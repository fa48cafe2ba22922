use crate::agent::tool::Tool;
use crate::error::ShaiError;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

const DESCRIPTION: &str = "Run a read-only bash command for exploration and information gathering. \
This tool is restricted to safe, non-destructive operations like:
- Listing files (ls, find, tree)
- Reading files (cat, head, tail, less, bat)
- Searching (grep, rg, ag, fd)
- System info (uname, whoami, hostname, df, du, ps, top, htop)
- Environment (env, printenv, echo)
- Git read operations (git status, git log, git diff, git branch)
- File inspection (file, stat, wc)

NOT allowed: file modification, deletion, permission changes, package management, or any sudo commands.";

/// The restricted shell-execution capability.
pub struct RunBashTool {
    executor: Arc<CommandExecutor>,
}

impl RunBashTool {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for RunBashTool {
    fn name(&self) -> &str {
        "run_bash"
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute (read-only operations only)"
                },
                "working_directory": {
                    "type": "string",
                    "description": "Optional working directory for the command"
                }
            },
            "required": ["command"]
        })
    }

    async fn call(&self, input: &Value) -> Result<Value, ShaiError> {
        let command = input
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ShaiError::InvalidToolArguments {
                tool: "run_bash".to_string(),
                reason: "missing required string field 'command'".to_string(),
            })?;

        let working_dir = input.get("working_directory").and_then(Value::as_str);

        let result = self
            .executor
            .execute(command, working_dir.map(Path::new))
            .await?;

        serde_json::to_value(&result).map_err(|e| ShaiError::ExecutionFailed {
            message: e.to_string(),
        })
    }
}
