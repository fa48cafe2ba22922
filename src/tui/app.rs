//! TUI application state
//!
//! A read model of the conversation: the transcript mirror, the in-flight
//! stream buffer, and the input line. All mutation comes from either
//! keyboard input or `AgentEvent`s; the engine remains the sole owner of
//! the authoritative transcript.

use crate::agent::AgentEvent;
use crate::transcript::TranscriptEntry;

/// Application state for the chat view
#[derive(Debug, Default)]
pub struct App {
    /// Mirror of the transcript, in append order
    pub entries: Vec<TranscriptEntry>,
    /// In-flight assistant text for the current turn
    pub stream: String,
    /// Current input line
    pub input: String,
    /// A turn is active; input is held until it finishes
    pub busy: bool,
    /// Status line (state, usage totals, or the last error)
    pub status: String,
    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        App::default()
    }

    /// Fold one engine event into the view state.
    pub fn apply_agent_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::StreamDelta(delta) => {
                self.stream.push_str(&delta);
            }
            AgentEvent::Entry(entry) => {
                match &entry {
                    TranscriptEntry::Assistant { .. } => {
                        // The buffer folded into the committed entry
                        self.stream.clear();
                    }
                    TranscriptEntry::ToolCall { tool, .. } => {
                        self.status = format!("Running tool '{}'...", tool);
                    }
                    TranscriptEntry::ToolResult { .. } => {
                        self.status = "Thinking...".to_string();
                    }
                    TranscriptEntry::User { .. } => {}
                }
                self.entries.push(entry);
            }
            AgentEvent::TurnFinished(usage) => {
                self.busy = false;
                self.status = usage.to_string();
            }
            AgentEvent::TurnFailed(message) => {
                self.busy = false;
                // The uncommitted buffer is discarded with the turn
                self.stream.clear();
                self.status = format!("Error: {}", message);
            }
        }
    }

    /// Take the input line for submission, marking the turn active.
    /// Returns `None` while busy or when the line is blank.
    pub fn submit(&mut self) -> Option<String> {
        if self.busy || self.input.trim().is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.input);
        self.busy = true;
        self.status = "Thinking...".to_string();
        Some(line)
    }

    pub fn enter_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn delete_char(&mut self) {
        self.input.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TokenUsage;

    #[test]
    fn submit_refused_while_busy() {
        let mut app = App::new();
        app.input = "first".to_string();
        assert_eq!(app.submit().as_deref(), Some("first"));
        assert!(app.busy);

        app.input = "second".to_string();
        assert_eq!(app.submit(), None);
    }

    #[test]
    fn stream_folds_into_committed_entry() {
        let mut app = App::new();
        app.apply_agent_event(AgentEvent::StreamDelta("Hel".into()));
        app.apply_agent_event(AgentEvent::StreamDelta("lo".into()));
        assert_eq!(app.stream, "Hello");

        app.apply_agent_event(AgentEvent::Entry(TranscriptEntry::Assistant {
            content: "Hello".into(),
        }));
        assert!(app.stream.is_empty());
        assert_eq!(app.entries.len(), 1);
    }

    #[test]
    fn failed_turn_discards_stream_and_unblocks_input() {
        let mut app = App::new();
        app.input = "hi".to_string();
        app.submit();
        app.apply_agent_event(AgentEvent::StreamDelta("partial".into()));
        app.apply_agent_event(AgentEvent::TurnFailed("connection reset".into()));

        assert!(!app.busy);
        assert!(app.stream.is_empty());
        assert!(app.status.contains("connection reset"));
    }

    #[test]
    fn finished_turn_shows_usage() {
        let mut app = App::new();
        app.busy = true;
        app.apply_agent_event(AgentEvent::TurnFinished(TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }));
        assert!(!app.busy);
        assert!(app.status.contains("15"));
    }
}
