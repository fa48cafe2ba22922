//! Command-line interface definitions

use clap::Parser;
use std::path::PathBuf;

/// A terminal chat agent with a read-only shell tool
#[derive(Parser, Debug)]
#[command(name = "shai", version, about)]
pub struct Cli {
    /// One-shot question; runs a single turn without the TUI
    #[arg(trailing_var_arg = true)]
    pub query: Vec<String>,

    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the configured model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the configured endpoint base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override the maximum model steps per turn
    #[arg(long)]
    pub max_steps: Option<usize>,
}
