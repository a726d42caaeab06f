//! UI rendering
//!
//! Layout, top to bottom:
//! - Title bar (1 line)
//! - Guesses, highlighted against the reference (remaining space)
//! - Guess editor (fixed height)
//! - Alert line (1 line)
//! - Hint panel (fixed height)

use super::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use rubyle::diff::{HighlightSpan, MatchLabel};
use rubyle::session::Severity;

const MIN_TERMINAL_WIDTH: u16 = 40;
const EDITOR_HEIGHT: u16 = 10;
const HINT_PANEL_HEIGHT: u16 = 4;

pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.area();

    if size.width < MIN_TERMINAL_WIDTH {
        render_error_too_narrow(frame, size);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(EDITOR_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(HINT_PANEL_HEIGHT),
        ])
        .split(size);

    render_title_bar(frame, chunks[0], app);
    render_guesses(frame, chunks[1], app);
    render_editor(frame, chunks[2], app);
    render_alert(frame, chunks[3], app);
    render_hints(frame, chunks[4], app);
}

fn render_error_too_narrow(frame: &mut Frame, area: Rect) {
    let msg = format!(
        "Terminal too narrow: {} < {} chars",
        area.width, MIN_TERMINAL_WIDTH
    );
    let paragraph =
        Paragraph::new(msg).style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
    frame.render_widget(paragraph, area);
}

fn render_title_bar(frame: &mut Frame, area: Rect, app: &App) {
    let status = if app.session.is_solved() {
        "solved"
    } else {
        "Ctrl+S submit | F1 symbols | F2 length | Esc quit"
    };
    let title = format!("rubyle:: {}", status);
    let paragraph = Paragraph::new(title).style(
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(paragraph, area);
}

fn label_style(label: Option<MatchLabel>) -> Style {
    match label {
        Some(MatchLabel::Strong) => Style::default().fg(Color::Black).bg(Color::Green),
        Some(MatchLabel::Weak) => Style::default().fg(Color::Black).bg(Color::Yellow),
        None => Style::default(),
    }
}

/// Lay highlighted spans out as lines, splitting spans that cross line breaks
pub fn highlighted_lines(source: &str, spans: &[HighlightSpan]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    for span in spans {
        let style = label_style(span.label);
        let mut pieces = span.text(source).split('\n').peekable();
        while let Some(piece) = pieces.next() {
            if !piece.is_empty() {
                current.push(Span::styled(piece.to_string(), style));
            }
            if pieces.peek().is_some() {
                lines.push(Line::from(std::mem::take(&mut current)));
            }
        }
    }
    lines.push(Line::from(current));
    lines
}

fn render_guesses(frame: &mut Frame, area: Rect, app: &App) {
    let guesses = app.session.guesses();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Guesses ({})", guesses.len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for (number, guess) in guesses.iter().enumerate() {
        lines.push(Line::styled(
            format!("#{}", number + 1),
            Style::default().fg(Color::DarkGray),
        ));
        lines.extend(highlighted_lines(&guess.source, &guess.spans));
    }

    // Keep the latest guess in view
    let overflow = lines.len().saturating_sub(inner.height as usize);
    let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}

fn render_editor(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Your guess");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = app.editor.lines().iter().map(|line| Line::raw(line.as_str())).collect();
    let (row, col) = app.editor.cursor();
    let scroll = (row + 1).saturating_sub(inner.height as usize);
    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);

    let x = inner.x.saturating_add(u16::try_from(col).unwrap_or(u16::MAX));
    let y = inner
        .y
        .saturating_add(u16::try_from(row).unwrap_or(u16::MAX).saturating_sub(scroll));
    frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), y));
}

fn render_alert(frame: &mut Frame, area: Rect, app: &App) {
    let Some(alert) = app.session.alert() else {
        return;
    };
    let style = match alert.severity {
        Severity::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Severity::Info => Style::default().fg(Color::Cyan),
        Severity::Success => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    };
    frame.render_widget(Paragraph::new(alert.message.as_str()).style(style), area);
}

fn render_hints(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Hints");
    let hints = app.session.hints();

    let symbols = if hints.symbols {
        let names: Vec<&str> = app.session.symbols().iter().map(String::as_str).collect();
        format!("Symbols: {}", names.join(" "))
    } else {
        "Symbols: hidden (F1)".to_string()
    };
    let length = if hints.code_length {
        format!("Length: {} chars", app.session.code_length())
    } else {
        "Length: hidden (F2)".to_string()
    };

    let paragraph = Paragraph::new(vec![Line::raw(symbols), Line::raw(length)])
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
