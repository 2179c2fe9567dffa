//! TUI event handling with crossterm.
//!
//! # Overview
//!
//! Key presses are translated to [`Action`]s according to the current
//! [`KeyContext`]:
//!
//! | Context      | Keys                                                          |
//! |--------------|---------------------------------------------------------------|
//! | Main         | `j`/Down, `k`/Up, Space/Enter/`t` toggle, `a` add, `d`/Delete remove, `L` logout, `q` quit |
//! | Login, Form  | characters, Backspace, Tab, Enter submit, Esc cancel          |
//! | Ringing      | Enter/Space/`s` claim a solve; every other key just nudges     |
//! | Notice       | any key dismisses                                             |
//!
//! Ctrl+C maps to [`Action::ForceQuit`] everywhere.
//!
//! # Example
//!
//! ```
//! use codealarm::tui::events::resolve;
//! use codealarm::tui::{Action, KeyContext};
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//!
//! let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
//! assert_eq!(resolve(KeyContext::Main, &key), Some(Action::Quit));
//! assert_eq!(resolve(KeyContext::LoginInput, &key), Some(Action::InputChar('q')));
//! ```

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

use super::app::{Action, KeyContext};

/// Error reading terminal events.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to read terminal event: {0}")]
    Io(#[from] io::Error),
}

/// Reads crossterm events and resolves them to actions.
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Wait up to `timeout` for a key press and resolve it in `context`.
    ///
    /// Returns `Ok(None)` on timeout and for unbound keys, resizes and
    /// mouse events.
    pub fn poll(&self, timeout: Duration, context: KeyContext) -> Result<Option<Action>, EventError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(resolve(context, &key)),
            _ => Ok(None),
        }
    }
}

/// Map a key press to an action.
///
/// Key releases and repeats reported by some terminals are ignored.
#[must_use]
pub fn resolve(context: KeyContext, key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::ForceQuit),
            _ => None,
        };
    }

    match context {
        KeyContext::Notice => Some(Action::DismissNotice),
        KeyContext::LoginInput | KeyContext::Form => resolve_text(key),
        KeyContext::Main => resolve_main(key),
        KeyContext::Ringing => Some(match key.code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s') => Action::ClaimSolved,
            _ => Action::Nudge,
        }),
    }
}

fn resolve_text(key: &KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char(c) => Some(Action::InputChar(c)),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Tab | KeyCode::BackTab => Some(Action::NextField),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Esc => Some(Action::Cancel),
        _ => None,
    }
}

fn resolve_main(key: &KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(Action::NavigateDown),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::NavigateUp),
        KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('t') => Some(Action::ToggleAlarm),
        KeyCode::Char('a') | KeyCode::Char('+') => Some(Action::OpenAddAlarm),
        KeyCode::Char('d') | KeyCode::Delete => Some(Action::RemoveAlarm),
        KeyCode::Char('L') => Some(Action::Logout),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}
