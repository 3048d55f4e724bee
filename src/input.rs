use crate::app::InputSource;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Keyboard input polled from the terminal without blocking.
pub(crate) struct TerminalInput;

impl InputSource for TerminalInput {
    fn quit_requested(&mut self) -> anyhow::Result<bool> {
        let mut quit = false;
        let mut seen = 0;
        // drain whatever is already queued, never wait
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(k) = event::read()? {
                quit |= is_quit_key(&k);
            }
            seen += 1;
            if seen >= 32 {
                break;
            }
        }
        Ok(quit)
    }
}

pub(crate) fn is_quit_key(k: &KeyEvent) -> bool {
    if k.kind != KeyEventKind::Press {
        return false;
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => k.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
