//! Event Loop Module
//!
//! Bridges crossterm keyboard input and engine events into one select
//! loop. Input is read on a dedicated thread so the terminal never blocks
//! the async runtime; the engine's child-process waits happen on its own
//! task, so the transcript keeps rendering while a tool runs.

use crate::agent::AgentEvent;
use crate::tui::app::App;
use crate::tui::draw;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

pub async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    submit_tx: mpsc::UnboundedSender<String>,
    mut agent_rx: mpsc::UnboundedReceiver<AgentEvent>,
) -> io::Result<()> {
    let mut input_rx = spawn_input_thread();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    loop {
        terminal.draw(|frame| draw::draw(frame, app))?;

        tokio::select! {
            maybe_input = input_rx.recv() => {
                match maybe_input {
                    Some(Event::Key(key)) => handle_key_event(app, key, &submit_tx),
                    Some(_) => {}
                    None => break,
                }
            }
            maybe_event = agent_rx.recv() => {
                if let Some(agent_event) = maybe_event {
                    app.apply_agent_event(agent_event);
                }
            }
            _ = tick.tick() => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events
fn handle_key_event(app: &mut App, key: KeyEvent, submit_tx: &mpsc::UnboundedSender<String>) {
    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Enter => {
            if let Some(line) = app.submit() {
                let _ = submit_tx.send(line);
            }
        }
        KeyCode::Char(c) => {
            app.enter_char(c);
        }
        KeyCode::Backspace => {
            app.delete_char();
        }
        _ => {}
    }
}

/// Read crossterm events on a dedicated thread.
///
/// The thread exits when the receiving side is dropped.
fn spawn_input_thread() -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
    rx
}
