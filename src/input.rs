//! Key bindings.

use crate::session::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    SoftDrop,
    Start,
    Pause,
    Stop,
    Quit,
    None,
}

impl Action {
    /// The session command this action sends while a game is running.
    pub fn command(self) -> Option<Command> {
        match self {
            Self::MoveLeft => Some(Command::MoveLeft),
            Self::MoveRight => Some(Command::MoveRight),
            Self::RotateCw => Some(Command::RotateCw),
            Self::RotateCcw => Some(Command::RotateCcw),
            Self::SoftDrop => Some(Command::SoftDrop),
            _ => None,
        }
    }
}

/// Map key event to action. Arrows plus Q/W for rotation, with hjkl as an alternative.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Up | KeyCode::Char('w' | 'W' | 'k') => Action::RotateCw,
        KeyCode::Char('q' | 'Q') => Action::RotateCcw,
        KeyCode::Enter | KeyCode::Char('s' | 'S') => Action::Start,
        KeyCode::Char('p' | 'P' | ' ') => Action::Pause,
        KeyCode::Char('x' | 'X') => Action::Stop,
        _ => Action::None,
    }
}
