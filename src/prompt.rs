use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Pending,
    Done,
    Cancelled,
}

/// Feeds one key into a hidden input buffer.
pub fn apply_key(buffer: &mut String, key: KeyEvent) -> Entry {
    match key.code {
        KeyCode::Enter => Entry::Done,
        KeyCode::Esc => Entry::Cancelled,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Entry::Cancelled,
        KeyCode::Backspace => {
            buffer.pop();
            Entry::Pending
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            buffer.push(c);
            Entry::Pending
        }
        _ => Entry::Pending,
    }
}

/// Reads a line without echoing it. Raw mode is always restored.
pub fn read_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    enable_raw_mode().context("Failed to switch terminal to raw mode")?;
    let result = read_hidden();
    let restored = disable_raw_mode();
    println!();
    restored.context("Failed to restore terminal mode")?;
    result
}

fn read_hidden() -> Result<String> {
    let mut buffer = String::new();
    loop {
        if let Event::Key(key) = event::read().context("Failed to read password")? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match apply_key(&mut buffer, key) {
                Entry::Pending => {}
                Entry::Done => return Ok(buffer),
                Entry::Cancelled => bail!("Password entry cancelled"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn typed_keys_collect_until_enter() {
        let mut buffer = String::new();
        for c in "s3cr3t".chars() {
            assert_eq!(apply_key(&mut buffer, key(KeyCode::Char(c))), Entry::Pending);
        }
        assert_eq!(apply_key(&mut buffer, key(KeyCode::Backspace)), Entry::Pending);
        assert_eq!(apply_key(&mut buffer, key(KeyCode::Enter)), Entry::Done);
        assert_eq!(buffer, "s3cr3");
    }

    #[test]
    fn escape_and_ctrl_c_cancel() {
        let mut buffer = String::new();
        assert_eq!(apply_key(&mut buffer, key(KeyCode::Esc)), Entry::Cancelled);
        assert_eq!(
            apply_key(&mut buffer, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Entry::Cancelled
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn shifted_characters_are_kept() {
        let mut buffer = String::new();
        apply_key(&mut buffer, KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT));
        apply_key(&mut buffer, key(KeyCode::Left));
        assert_eq!(buffer, "A");
    }
}
