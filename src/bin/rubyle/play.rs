//! Interactive terminal game
//!
//! - app: game state plus key handling
//! - editor: the multi-line guess buffer
//! - ui: layout and rendering
mod app;
mod editor;
mod ui;

use app::App;
use crossterm::event::{self, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::prelude::*;
use rubyle::session::Session;
use std::io;
use std::time::{Duration, Instant};

/// Alerts are expired on this tick even when no key is pressed
const TICK: Duration = Duration::from_millis(250);

pub fn run(session: Session) -> io::Result<()> {
    let mut app = App::new(session);

    let raw_mode = RawModeGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    drop(raw_mode);
    terminal.clear()?;
    terminal.show_cursor()?;

    result
}

/// Raw mode that is left again when the guard drops, including on early returns
struct RawModeGuard {
    leave: fn() -> io::Result<()>,
}

impl RawModeGuard {
    fn enter() -> io::Result<Self> {
        Self::with(enable_raw_mode, disable_raw_mode)
    }

    fn with(enter: fn() -> io::Result<()>, leave: fn() -> io::Result<()>) -> io::Result<Self> {
        enter()?;
        Ok(Self { leave })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = (self.leave)() {
            tracing::warn!("failed to restore the terminal: {}", err);
        }
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(TICK)? {
            // Resize needs no handling: the next draw picks up the new size
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
        app.tick(Instant::now());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static LEFT: AtomicUsize = AtomicUsize::new(0);

    fn leave() -> io::Result<()> {
        LEFT.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn failing_setup() -> io::Result<()> {
        let _guard = RawModeGuard::with(|| Ok(()), leave)?;
        Err(io::Error::new(io::ErrorKind::Other, "terminal unavailable"))
    }

    #[test]
    fn test_raw_mode_is_left_when_setup_fails() {
        let before = LEFT.load(Ordering::SeqCst);
        assert!(failing_setup().is_err());
        assert_eq!(LEFT.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_failed_enter_leaves_nothing_to_restore() {
        let result = RawModeGuard::with(
            || Err(io::Error::new(io::ErrorKind::Other, "not a tty")),
            || panic!("nothing to leave"),
        );
        assert!(result.is_err());
    }
}
