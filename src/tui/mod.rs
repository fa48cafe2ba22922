//! TUI shell
//!
//! Thin presentation layer over the conversation engine: a transcript
//! view, a one-line input, and a status line. Terminal state is restored
//! on the way out even when the event loop errors.

use crate::agent::AgentEvent;
use crate::tui::app::App;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tokio::sync::mpsc;

pub mod app;
pub mod draw;
pub mod event_loop;

/// Run the chat UI until the user quits.
pub async fn run(
    mut app: App,
    submit_tx: mpsc::UnboundedSender<String>,
    agent_rx: mpsc::UnboundedReceiver<AgentEvent>,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop::run(&mut terminal, &mut app, submit_tx, agent_rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
