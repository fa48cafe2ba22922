//! Transcript rendering
//!
//! One line per transcript entry, colored by role, with the in-flight
//! stream buffer rendered as a provisional assistant line. The newest
//! content stays pinned to the bottom of the viewport.

use crate::transcript::TranscriptEntry;
use crate::tui::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // transcript
            Constraint::Length(1), // status
            Constraint::Length(1), // input
        ])
        .split(frame.area());

    let mut lines: Vec<Line> = app.entries.iter().map(entry_line).collect();
    if !app.stream.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("assistant: {}", app.stream),
            Style::default().fg(Color::Green),
        )));
    }

    // Pin to the bottom when the transcript outgrows the viewport
    let height = chunks[0].height as usize;
    let scroll = lines.len().saturating_sub(height) as u16;
    let transcript = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(transcript, chunks[0]);

    let status = Paragraph::new(Span::styled(
        app.status.clone(),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(status, chunks[1]);

    let prompt = "❯❯ ";
    let input = Paragraph::new(format!("{}{}", prompt, app.input));
    frame.render_widget(input, chunks[2]);
    frame.set_cursor_position(Position::new(
        chunks[2].x + (prompt.chars().count() + app.input.chars().count()) as u16,
        chunks[2].y,
    ));
}

fn entry_line(entry: &TranscriptEntry) -> Line<'static> {
    match entry {
        TranscriptEntry::User { content } => Line::from(Span::styled(
            format!("user: {}", content),
            Style::default().fg(Color::Blue),
        )),
        TranscriptEntry::Assistant { content } => Line::from(Span::styled(
            format!("assistant: {}", content),
            Style::default().fg(Color::Green),
        )),
        TranscriptEntry::ToolCall { tool, input } => Line::from(Span::styled(
            format!("🔧 {} {}", tool, input),
            Style::default().fg(Color::Yellow),
        )),
        TranscriptEntry::ToolResult { tool, output, .. } => Line::from(Span::styled(
            format!("✓ {}: {}", tool, output),
            Style::default().fg(Color::DarkGray),
        )),
    }
}
