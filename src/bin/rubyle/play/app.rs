//! Game state and key handling
//!
//! Keys:
//! - Ctrl+S or Alt+Enter: submit the guess
//! - F1 / F2: toggle the symbol and length hints
//! - Esc or Ctrl+C: quit
//! - everything else edits the guess

use super::editor::Editor;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rubyle::error::SubmitError;
use rubyle::hints::Hint;
use rubyle::session::Session;
use std::time::Instant;

pub struct App {
    pub session: Session,
    pub editor: Editor,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            editor: Editor::default(),
            should_quit: false,
        }
    }

    /// Handle a key press. Returns whether anything changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if control => self.should_quit = true,
            KeyCode::Char('s') if control => self.submit(),
            KeyCode::Enter if alt => self.submit(),
            KeyCode::F(1) => {
                self.session.toggle_hint(Hint::Symbols);
            }
            KeyCode::F(2) => {
                self.session.toggle_hint(Hint::CodeLength);
            }
            KeyCode::Enter => self.editor.newline(),
            KeyCode::Tab => self.editor.insert_str("  "),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete(),
            KeyCode::Left => self.editor.left(),
            KeyCode::Right => self.editor.right(),
            KeyCode::Up => self.editor.up(),
            KeyCode::Down => self.editor.down(),
            KeyCode::Home => self.editor.home(),
            KeyCode::End => self.editor.end(),
            KeyCode::Char(c) if !control && !alt => self.editor.insert(c),
            _ => return false,
        }
        true
    }

    fn submit(&mut self) {
        let text = self.editor.text();
        match self.session.submit(&text) {
            Ok(_) => self.editor.clear(),
            Err(SubmitError::Empty) => self.session.notify("Type a guess first"),
            // The session has already raised an alert for the syntax error
            Err(SubmitError::Syntax(_)) => {}
        }
    }

    /// Advance the clock. Returns whether an alert was cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.session.expire_alert(now)
    }
}
