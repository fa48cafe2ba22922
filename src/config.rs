//! Configuration management
//!
//! A single YAML file with serde defaults, so a missing file or a partial
//! one both work. API keys may come from the environment instead of the
//! file (`SHAI_API_KEY`, then `OPENAI_API_KEY`).

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "shai.yaml";

/// Default config directory name
const CONFIG_DIR_NAME: &str = "shai";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant running inside a terminal chat. \
You can run read-only shell commands through the run_bash tool to explore the \
user's system: listing and reading files, searching, checking processes, and \
inspecting git state. Destructive commands, file writes, and privilege \
escalation are blocked; if a command is rejected, explain what you were \
trying to learn and either pick a safe alternative or ask the user to run it \
themselves. Be concise and use the tool rather than guessing about the system.";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// API endpoint base URL (OpenAI-compatible)
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// API key; environment variables take precedence when unset
    pub api_key: Option<String>,

    /// Maximum model steps per turn (bounds tool round-trips)
    pub max_steps: usize,

    /// System prompt sent on every turn
    pub system_prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_steps: 30,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, or defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// The resolved API key: config file first, then environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("SHAI_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Default config file location (`~/.config/shai/shai.yaml`)
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}
