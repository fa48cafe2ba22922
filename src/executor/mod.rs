//! Command executor module
//!
//! Safely executes commands with denylist verification

pub mod safety;

use crate::error::ShaiError;
use safety::validate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Command executor with safety checks
///
/// Every command goes through the validator before anything is spawned;
/// there is no bypass path.
#[derive(Debug, Default)]
pub struct CommandExecutor {
    default_dir: Option<PathBuf>,
}

impl CommandExecutor {
    /// Create a new executor
    pub fn new() -> Self {
        CommandExecutor::default()
    }

    /// Create an executor with a default working directory applied when the
    /// caller does not override it per command.
    pub fn with_default_dir(dir: impl Into<PathBuf>) -> Self {
        CommandExecutor {
            default_dir: Some(dir.into()),
        }
    }

    /// Validate and execute a command suggested by the model.
    ///
    /// A non-zero exit code is a normal result (`success: false`), not an
    /// error. Only a rejected command or a failure to spawn the process at
    /// all comes back as `Err`.
    pub async fn execute(
        &self,
        command_str: &str,
        working_dir: Option<&Path>,
    ) -> Result<ExecutionResult, ShaiError> {
        let verdict = validate(command_str);
        if !verdict.safe {
            tracing::warn!(command = command_str, reason = verdict.reason(), "command blocked");
            return Err(ShaiError::UnsafeCommand {
                reason: verdict.reason().to_string(),
            });
        }

        if command_str.trim().is_empty() {
            return Err(ShaiError::ExecutionFailed {
                message: "empty command".to_string(),
            });
        }

        let mut cmd = Command::new("bash");
        cmd.arg("-c")
            .arg(command_str)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = working_dir.or(self.default_dir.as_deref()) {
            cmd.current_dir(dir);
        }

        tracing::debug!(command = command_str, "executing");

        let output = cmd.output().await.map_err(|e| ShaiError::ExecutionFailed {
            message: e.to_string(),
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            Ok(ExecutionResult {
                success: true,
                exit_code,
                stdout,
                // Empty stderr on success is omitted, not an empty string
                stderr: if stderr.is_empty() { None } else { Some(stderr) },
            })
        } else {
            Ok(ExecutionResult {
                success: false,
                exit_code,
                stdout,
                stderr: Some(stderr),
            })
        }
    }
}

/// Result of one command execution
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExecutionResult {
    /// Whether the command exited with status 0
    pub success: bool,
    /// Exit code of the process (-1 when killed by a signal)
    pub exit_code: i32,
    /// Trimmed standard output
    pub stdout: String,
    /// Trimmed standard error, omitted when empty on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}
