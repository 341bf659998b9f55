use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Quit,

    // Input handling
    Character(char),
    Backspace,
    Delete,
    Enter,
    Escape,
    Tab,
    BackTab,

    // Navigation
    Up,
    Down,
    Left,
    Right,

    // Other
    Tick,
}

pub struct EventHandler {
    poll_interval: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Waits up to the poll interval for input; yields `Tick` when none arrives.
    pub async fn next_event(&mut self) -> Result<AppEvent> {
        if event::poll(self.poll_interval)? {
            match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    Ok(Self::map_key_event(key_event))
                }
                _ => Ok(AppEvent::Tick),
            }
        } else {
            Ok(AppEvent::Tick)
        }
    }

    fn map_key_event(key_event: KeyEvent) -> AppEvent {
        match key_event {
            // Global quit with Ctrl+C
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => AppEvent::Quit,

            KeyEvent {
                code: KeyCode::Esc, ..
            } => AppEvent::Escape,

            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => AppEvent::Enter,

            KeyEvent {
                code: KeyCode::BackTab,
                ..
            } => AppEvent::BackTab,

            KeyEvent {
                code: KeyCode::Tab, ..
            } => AppEvent::Tab,

            KeyEvent {
                code: KeyCode::Up, ..
            } => AppEvent::Up,

            KeyEvent {
                code: KeyCode::Down,
                ..
            } => AppEvent::Down,

            KeyEvent {
                code: KeyCode::Left,
                ..
            } => AppEvent::Left,

            KeyEvent {
                code: KeyCode::Right,
                ..
            } => AppEvent::Right,

            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => AppEvent::Backspace,

            KeyEvent {
                code: KeyCode::Delete,
                ..
            } => AppEvent::Delete,

            // Input characters
            KeyEvent {
                code: KeyCode::Char(c),
                modifiers: KeyModifiers::NONE,
                ..
            } => AppEvent::Character(c),

            KeyEvent {
                code: KeyCode::Char(c),
                modifiers: KeyModifiers::SHIFT,
                ..
            } => AppEvent::Character(c.to_uppercase().next().unwrap_or(c)),

            _ => AppEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        EventHandler::map_key_event(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn ctrl_c_quits() {
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::CONTROL), AppEvent::Quit);
        assert_eq!(
            key(KeyCode::Char('c'), KeyModifiers::NONE),
            AppEvent::Character('c')
        );
    }

    #[test]
    fn shifted_characters_are_uppercased() {
        assert_eq!(
            key(KeyCode::Char('d'), KeyModifiers::SHIFT),
            AppEvent::Character('D')
        );
    }

    #[test]
    fn unmapped_keys_become_ticks() {
        assert_eq!(key(KeyCode::F(5), KeyModifiers::NONE), AppEvent::Tick);
        assert_eq!(key(KeyCode::Char('s'), KeyModifiers::ALT), AppEvent::Tick);
    }
}
