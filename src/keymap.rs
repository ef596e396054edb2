use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::{Action, EditKey};
use crate::models::SuggestMode;
use crate::view::{DashboardView, Focus, FormField};

/// Maps a key press to an action given what currently has focus.
///
/// Precedence: confirm dialog, then the open modal, then the AI title input,
/// then the task board.
pub fn action_for_key(view: &DashboardView, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    if view.confirm.is_some() {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(Action::Confirm),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::Cancel),
            _ => None,
        };
    }

    if view.modal_open() {
        return modal_action(view, key);
    }

    match view.focus {
        Focus::AiTitle => match key.code {
            KeyCode::Esc | KeyCode::Tab => Some(Action::FocusBoard),
            KeyCode::Enter => Some(Action::AiSuggest(SuggestMode::Draft)),
            code => edit_key(code).map(Action::Edit),
        },
        _ => board_action(key),
    }
}

fn modal_action(view: &DashboardView, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => return Some(Action::CloseModal),
        KeyCode::Tab => return Some(Action::FocusNext),
        KeyCode::BackTab => return Some(Action::FocusPrevious),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Action::SubmitForm)
        }
        _ => {}
    }

    match (view.focus, key.code) {
        (Focus::Form(FormField::Description), KeyCode::Enter) => Some(Action::Edit(EditKey::Newline)),
        (_, KeyCode::Enter) => Some(Action::SubmitForm),
        (_, code) => edit_key(code).map(Action::Edit),
    }
}

fn board_action(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('n') => Some(Action::OpenModal),
        KeyCode::Char('a') | KeyCode::Char('/') => Some(Action::FocusAiTitle),
        KeyCode::Char('g') => Some(Action::AiSuggest(SuggestMode::Draft)),
        KeyCode::Char('p') => Some(Action::AiSuggest(SuggestMode::Plan)),
        KeyCode::Char('c') => Some(Action::CreateFromSuggestion),
        KeyCode::Char('t') => Some(Action::TestCreate),
        KeyCode::Char('d') | KeyCode::Delete => Some(Action::DeleteSelected),
        KeyCode::Char('s') => Some(Action::AdvanceSelectedStatus),
        KeyCode::Char('f') => Some(Action::CycleFilter),
        KeyCode::Char('r') => Some(Action::Reload),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrevious),
        _ => None,
    }
}

fn edit_key(code: KeyCode) -> Option<EditKey> {
    match code {
        KeyCode::Char(c) => Some(EditKey::Char(c)),
        KeyCode::Backspace => Some(EditKey::Backspace),
        KeyCode::Left => Some(EditKey::Left),
        KeyCode::Right => Some(EditKey::Right),
        KeyCode::Up => Some(EditKey::Up),
        KeyCode::Down => Some(EditKey::Down),
        KeyCode::Home => Some(EditKey::Home),
        KeyCode::End => Some(EditKey::End),
        _ => None,
    }
}
