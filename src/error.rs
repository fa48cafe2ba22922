//! Structured error types for shai
//!
//! Recoverable tool-side failures are modeled here so the dispatch boundary
//! can turn them into tool output the model sees and can react to. Transport
//! failures at the model boundary stay `anyhow::Error` and abort the turn.

use thiserror::Error;

/// Primary error type for shai operations
#[derive(Error, Debug)]
pub enum ShaiError {
    /// Validator rejected the command; no process was spawned
    #[error("unsafe command blocked: {reason}")]
    UnsafeCommand { reason: String },

    /// The child process could not be spawned or completed
    #[error("failed to execute command: {message}")]
    ExecutionFailed { message: String },

    /// The model requested a tool that is not registered
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },

    /// Tool input did not match the declared schema
    #[error("invalid tool arguments for {tool}: {reason}")]
    InvalidToolArguments { tool: String, reason: String },
}
