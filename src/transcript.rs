//! Append-only conversation transcript
//!
//! The transcript is the single source of truth for what happened in a
//! session: user turns, committed assistant turns, and the tool activity in
//! between. The conversation engine is the only writer; the presentation
//! layer observes entries through the event channel and keeps its own read
//! model.

use serde_json::Value;

/// One record in the conversation transcript.
///
/// Tool entries are observer-facing artifacts only; they are not replayed
/// to the model on later turns (see `Transcript::replay_messages`).
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    /// A submitted user message
    User { content: String },
    /// A committed assistant answer (one per turn)
    Assistant { content: String },
    /// The model requested a tool invocation
    ToolCall { tool: String, input: Value },
    /// The invocation completed (or failed in a model-visible way)
    ToolResult {
        tool: String,
        input: Value,
        output: Value,
    },
}

/// Ordered, append-only store of transcript entries.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries are immutable once appended and are never
    /// reordered or removed.
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Read-only view of all entries in occurrence order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The user/assistant turns to replay as model-visible history.
    ///
    /// Tool calls and results are deliberately dropped here: the model only
    /// sees them inside the step sequence of the turn they happened in.
    pub fn replay_messages(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e, TranscriptEntry::User { .. } | TranscriptEntry::Assistant { .. }))
    }
}
