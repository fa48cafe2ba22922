//! Conversation engine
//!
//! Drives the streaming tool-use loop for one session: appends user turns
//! to the transcript, streams model steps, dispatches tool calls strictly
//! in order, folds results back into the step sequence, and commits exactly
//! one assistant turn per user submission.
//!
//! State machine per turn: Idle -> Streaming -> (ToolDispatch <-> Streaming)*
//! -> Idle. The engine is the sole writer of the transcript; the
//! presentation layer mirrors it from the event channel.

use crate::agent::registry::ToolRegistry;
use crate::llm::chat::{FunctionPayload, ToolCallPayload};
use crate::llm::{ChatBackend, ChatMessage, ChatRequest, StreamEvent, TokenUsage};
use crate::transcript::{Transcript, TranscriptEntry};
use futures_util::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events emitted to the presentation layer while a turn runs.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// An entry was appended to the transcript
    Entry(TranscriptEntry),
    /// Incremental assistant text for the in-flight stream buffer
    StreamDelta(String),
    /// The turn committed its assistant entry; usage totals for the turn
    TurnFinished(TokenUsage),
    /// Transport failure aborted the turn; no assistant entry committed
    TurnFailed(String),
}

/// The conversation engine for one session.
pub struct ConversationEngine {
    backend: Arc<dyn ChatBackend>,
    registry: ToolRegistry,
    transcript: Transcript,
    system_prompt: String,
    max_steps: usize,
    event_tx: mpsc::UnboundedSender<AgentEvent>,
}

impl ConversationEngine {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        registry: ToolRegistry,
        system_prompt: String,
        max_steps: usize,
        event_tx: mpsc::UnboundedSender<AgentEvent>,
    ) -> Self {
        Self {
            backend,
            registry,
            transcript: Transcript::new(),
            system_prompt,
            max_steps,
            event_tx,
        }
    }

    /// Process submissions until the input channel closes.
    ///
    /// Submissions are handled one at a time; the UI holds new input while
    /// a turn is active, so nothing interleaves mid-turn.
    pub async fn run(mut self, mut input_rx: mpsc::UnboundedReceiver<String>) {
        while let Some(input) = input_rx.recv().await {
            self.run_turn(&input).await;
        }
    }

    /// Run one turn: user submission through to the committed assistant
    /// answer, potentially spanning several tool round-trips.
    pub async fn run_turn(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        self.append(TranscriptEntry::User {
            content: input.to_string(),
        });

        // Model-visible history: system prompt plus replayed user/assistant
        // turns. Tool entries from earlier turns are not replayed.
        let mut messages = vec![ChatMessage::system(self.system_prompt.clone())];
        for entry in self.transcript.replay_messages() {
            match entry {
                TranscriptEntry::User { content } => messages.push(ChatMessage::user(content)),
                TranscriptEntry::Assistant { content } => {
                    messages.push(ChatMessage::assistant(content))
                }
                _ => unreachable!("replay_messages only yields user/assistant"),
            }
        }

        let mut buffer = String::new();
        let mut usage = TokenUsage::default();
        let mut steps = 0;

        loop {
            if steps >= self.max_steps {
                tracing::info!(max_steps = self.max_steps, "step cap reached");
                break;
            }
            steps += 1;

            let request =
                ChatRequest::new(messages.clone()).with_tools(self.registry.specs());
            let mut stream = self.backend.stream_chat(request);

            // Streaming: extend the buffer fragment by fragment, collect
            // any tool-call requests for dispatch after the step completes.
            let mut segment = String::new();
            let mut tool_calls = Vec::new();

            while let Some(event) = stream.next().await {
                match event {
                    Ok(StreamEvent::TextDelta(delta)) => {
                        buffer.push_str(&delta);
                        segment.push_str(&delta);
                        self.emit(AgentEvent::StreamDelta(delta));
                    }
                    Ok(StreamEvent::ToolCall(call)) => tool_calls.push(call),
                    Ok(StreamEvent::Usage(step_usage)) => usage.add(&step_usage),
                    Ok(StreamEvent::Done) => break,
                    Err(e) => {
                        // Transport failure: fatal to this turn only. The
                        // transcript stays as it was; no partial assistant
                        // entry is committed.
                        tracing::error!(error = %e, "model call failed");
                        self.emit(AgentEvent::TurnFailed(e.to_string()));
                        return;
                    }
                }
            }

            if tool_calls.is_empty() {
                // Final text-only completion
                break;
            }

            // Feed the step sequence back: the assistant message carrying
            // the calls, then one tool message per result.
            messages.push(ChatMessage::assistant_with_tool_calls(
                segment.clone(),
                tool_calls
                    .iter()
                    .map(|call| ToolCallPayload {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: FunctionPayload {
                            name: call.name.clone(),
                            arguments: arguments_text(&call.input),
                        },
                    })
                    .collect(),
            ));

            // ToolDispatch: strictly sequential, in requested order.
            for call in tool_calls {
                self.append(TranscriptEntry::ToolCall {
                    tool: call.name.clone(),
                    input: call.input.clone(),
                });

                let output = self.registry.dispatch(&call.name, &call.input).await;

                self.append(TranscriptEntry::ToolResult {
                    tool: call.name.clone(),
                    input: call.input,
                    output: output.clone(),
                });

                messages.push(ChatMessage::tool_result(call.id, output.to_string()));
            }
        }

        // Exactly one assistant entry per turn, whether the model finished
        // naturally or ran into the step cap.
        self.append(TranscriptEntry::Assistant { content: buffer });
        self.emit(AgentEvent::TurnFinished(usage));
    }

    /// Read-only view of the transcript
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn append(&mut self, entry: TranscriptEntry) {
        self.transcript.push(entry.clone());
        self.emit(AgentEvent::Entry(entry));
    }

    fn emit(&self, event: AgentEvent) {
        // A closed channel means the UI is gone; the turn still completes
        // so the transcript stays consistent.
        let _ = self.event_tx.send(event);
    }
}

/// The wire form of tool-call arguments fed back to the model.
fn arguments_text(input: &Value) -> String {
    match input {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::RunBashTool;
    use crate::executor::CommandExecutor;
    use crate::llm::chat::ToolCallRequest;
    use anyhow::Result;
    use futures::stream::BoxStream;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays scripted step streams and records requests.
    struct ScriptedBackend {
        steps: Mutex<VecDeque<Vec<Result<StreamEvent>>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(steps: Vec<Vec<Result<StreamEvent>>>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn stream_chat(&self, request: ChatRequest) -> BoxStream<'static, Result<StreamEvent>> {
            self.requests.lock().unwrap().push(request);
            let step = self.steps.lock().unwrap().pop_front().unwrap_or_default();
            Box::pin(futures::stream::iter(step))
        }
    }

    fn text(s: &str) -> Result<StreamEvent> {
        Ok(StreamEvent::TextDelta(s.to_string()))
    }

    fn tool_call(id: &str, command: &str) -> Result<StreamEvent> {
        Ok(StreamEvent::ToolCall(ToolCallRequest {
            id: id.to_string(),
            name: "run_bash".to_string(),
            input: json!({ "command": command }),
        }))
    }

    fn done() -> Result<StreamEvent> {
        Ok(StreamEvent::Done)
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(vec![Arc::new(RunBashTool::new(Arc::new(
            CommandExecutor::new(),
        )))])
    }

    fn engine(
        backend: Arc<ScriptedBackend>,
        max_steps: usize,
    ) -> (
        ConversationEngine,
        mpsc::UnboundedReceiver<AgentEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = ConversationEngine::new(
            backend,
            registry(),
            "You are a test assistant.".to_string(),
            max_steps,
            tx,
        );
        (engine, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AgentEvent>) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn text_only_turn_commits_one_assistant_entry() {
        let backend = Arc::new(ScriptedBackend::new(vec![vec![
            text("Hello"),
            text(", world"),
            done(),
        ]]));
        let (mut engine, mut rx) = engine(backend, 30);

        engine.run_turn("hi").await;

        let entries = engine.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            TranscriptEntry::User {
                content: "hi".into()
            }
        );
        assert_eq!(
            entries[1],
            TranscriptEntry::Assistant {
                content: "Hello, world".into()
            }
        );

        let events = drain(&mut rx);
        let deltas: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::StreamDelta(d) => Some(d.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(deltas, vec!["Hello", ", world"]);
        assert!(matches!(events.last(), Some(AgentEvent::TurnFinished(_))));
    }

    #[tokio::test]
    async fn tool_round_trip_orders_entries() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![text("Checking. "), tool_call("call_1", "echo hi"), done()],
            vec![text("It printed hi."), done()],
        ]));
        let (mut engine, _rx) = engine(backend, 30);

        engine.run_turn("what does echo hi do?").await;

        let entries = engine.transcript().entries();
        assert_eq!(entries.len(), 4);
        assert!(matches!(entries[0], TranscriptEntry::User { .. }));
        assert!(matches!(entries[1], TranscriptEntry::ToolCall { .. }));
        match &entries[2] {
            TranscriptEntry::ToolResult { output, .. } => {
                assert_eq!(output["success"], true);
                assert_eq!(output["stdout"], "hi");
            }
            other => panic!("expected ToolResult, got {:?}", other),
        }
        // All turn text accumulates into the single committed entry
        assert_eq!(
            entries[3],
            TranscriptEntry::Assistant {
                content: "Checking. It printed hi.".into()
            }
        );
    }

    #[tokio::test]
    async fn two_tool_calls_dispatch_in_request_order() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![
                tool_call("call_1", "echo first"),
                tool_call("call_2", "echo second"),
                done(),
            ],
            vec![text("Both ran."), done()],
        ]));
        let (mut engine, _rx) = engine(backend, 30);

        engine.run_turn("run both").await;

        let entries = engine.transcript().entries();
        assert_eq!(entries.len(), 6);
        assert!(matches!(entries[0], TranscriptEntry::User { .. }));
        match (&entries[1], &entries[2]) {
            (
                TranscriptEntry::ToolCall { input, .. },
                TranscriptEntry::ToolResult { output, .. },
            ) => {
                assert_eq!(input["command"], "echo first");
                assert_eq!(output["stdout"], "first");
            }
            other => panic!("unexpected pair: {:?}", other),
        }
        match (&entries[3], &entries[4]) {
            (
                TranscriptEntry::ToolCall { input, .. },
                TranscriptEntry::ToolResult { output, .. },
            ) => {
                assert_eq!(input["command"], "echo second");
                assert_eq!(output["stdout"], "second");
            }
            other => panic!("unexpected pair: {:?}", other),
        }
        assert!(matches!(entries[5], TranscriptEntry::Assistant { .. }));
    }

    #[tokio::test]
    async fn blocked_command_surfaces_as_tool_output() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![tool_call("call_1", "rm -rf /"), done()],
            vec![text("That command is blocked."), done()],
        ]));
        let (mut engine, _rx) = engine(backend, 30);

        engine.run_turn("delete everything").await;

        let entries = engine.transcript().entries();
        match &entries[2] {
            TranscriptEntry::ToolResult { output, .. } => {
                assert!(output["error"].as_str().unwrap().contains("'rm'"));
            }
            other => panic!("expected ToolResult, got {:?}", other),
        }
        // The conversation continued to a committed answer
        assert!(matches!(entries[3], TranscriptEntry::Assistant { .. }));
    }

    #[tokio::test]
    async fn transport_failure_commits_nothing() {
        let backend = Arc::new(ScriptedBackend::new(vec![vec![
            text("partial"),
            Err(anyhow::anyhow!("connection reset")),
        ]]));
        let (mut engine, mut rx) = engine(backend, 30);

        engine.run_turn("hi").await;

        // Only the user entry; no partial assistant turn
        let entries = engine.transcript().entries();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0], TranscriptEntry::User { .. }));

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::TurnFailed(msg) if msg.contains("connection reset"))));
        assert!(!events
            .iter()
            .any(|e| matches!(e, AgentEvent::TurnFinished(_))));
    }

    #[tokio::test]
    async fn step_cap_commits_accumulated_text() {
        // The model calls a tool on every step and never answers
        let steps = (0..5)
            .map(|i| {
                vec![
                    text("step "),
                    tool_call(&format!("call_{}", i), "echo loop"),
                    done(),
                ]
            })
            .collect();
        let backend = Arc::new(ScriptedBackend::new(steps));
        let (mut engine, mut rx) = engine(backend, 3);

        engine.run_turn("loop forever").await;

        let entries = engine.transcript().entries();
        // User + 3 ToolCall/ToolResult pairs + Assistant
        assert_eq!(entries.len(), 8);
        assert_eq!(
            entries.last(),
            Some(&TranscriptEntry::Assistant {
                content: "step step step ".into()
            })
        );
        // Reaching the cap is not an error
        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(AgentEvent::TurnFinished(_))));
    }

    #[tokio::test]
    async fn replay_excludes_tool_entries_from_later_turns() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![tool_call("call_1", "echo hi"), done()],
            vec![text("hi was printed"), done()],
            vec![text("second answer"), done()],
        ]));
        let backend_handle = Arc::clone(&backend);
        let (mut engine, _rx) = engine(backend, 30);

        engine.run_turn("first").await;
        engine.run_turn("second").await;

        let requests = backend_handle.requests.lock().unwrap();
        // Third request is the first step of the second turn
        let history = &requests[2].messages;
        assert!(history
            .iter()
            .all(|m| m.tool_calls.is_none() && m.tool_call_id.is_none()));
        let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
        assert!(contents.contains(&"first"));
        assert!(contents.contains(&"hi was printed"));
        assert!(contents.contains(&"second"));
    }

    #[tokio::test]
    async fn empty_submission_is_ignored() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let (mut engine, mut rx) = engine(backend, 30);

        engine.run_turn("   ").await;

        assert!(engine.transcript().is_empty());
        assert!(drain(&mut rx).is_empty());
    }
}
