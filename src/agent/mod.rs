pub mod core;
pub mod registry;
pub mod tool;
pub mod tools;

pub use core::{AgentEvent, ConversationEngine};
pub use registry::ToolRegistry;
pub use tool::Tool;
