//! Element tree the controller mutates and the renderer draws.
//!
//! Each element has a stable identity (a struct field, or a task id for cards)
//! so the controller never has to search for things by their rendered content.

use std::time::Duration;

use crate::field::TextField;
use crate::models::{Filter, Task, TaskStatus};
use crate::toast::Toasts;

pub const CREATE_FROM_SUGGESTION_LABEL: &str = "✨ Create Task with AI Description";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    None,
    Flex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Status,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Status,
            FormField::Status => FormField::Title,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FormField::Title => FormField::Status,
            FormField::Description => FormField::Title,
            FormField::Status => FormField::Description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Board,
    AiTitle,
    Form(FormField),
}

/// The create-task form inside the modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: TextField,
    pub description: TextField,
    pub status: TaskStatus,
}

impl Default for TaskForm {
    fn default() -> Self {
        TaskForm {
            title: TextField::single_line(),
            description: TextField::multi_line(),
            status: TaskStatus::Todo,
        }
    }
}

impl TaskForm {
    pub fn reset(&mut self) {
        self.title.clear();
        self.description.clear();
        self.status = TaskStatus::default();
    }
}

/// The action button shown under an AI suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionAction {
    pub label: &'static str,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponsePanel {
    pub hidden: bool,
    pub text: String,
    pub action: Option<SuggestionAction>,
}

impl Default for AiResponsePanel {
    fn default() -> Self {
        AiResponsePanel {
            hidden: true,
            text: String::new(),
            action: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub message: String,
    pub task_id: i64,
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub modal: Display,
    pub form: TaskForm,
    pub ai_title: TextField,
    pub ai_response: AiResponsePanel,
    pub cards: Vec<Task>,
    pub selected: Option<usize>,
    pub confirm: Option<ConfirmDialog>,
    pub toasts: Toasts,
    pub focus: Focus,
}

impl DashboardView {
    pub fn new(toast_ttl: Duration) -> Self {
        DashboardView {
            modal: Display::None,
            form: TaskForm::default(),
            ai_title: TextField::single_line(),
            ai_response: AiResponsePanel::default(),
            cards: Vec::new(),
            selected: None,
            confirm: None,
            toasts: Toasts::new(toast_ttl),
            focus: Focus::Board,
        }
    }

    pub fn modal_open(&self) -> bool {
        self.modal == Display::Flex
    }

    pub fn visible_cards(&self, filter: Filter) -> Vec<&Task> {
        self.cards.iter().filter(|task| filter.matches(task)).collect()
    }

    pub fn selected_card(&self, filter: Filter) -> Option<&Task> {
        self.selected
            .and_then(|i| self.visible_cards(filter).get(i).copied())
    }

    pub fn set_cards(&mut self, cards: Vec<Task>, filter: Filter) {
        self.cards = cards;
        self.clamp_selection(filter);
    }

    /// Adds a card unless one with the same id is already present.
    pub fn insert_card(&mut self, task: Task, filter: Filter) {
        if !self.cards.iter().any(|card| card.id == task.id) {
            self.cards.push(task);
        }
        self.clamp_selection(filter);
    }

    /// Removes the card for `task_id`. Returns whether one was present.
    pub fn remove_card(&mut self, task_id: i64, filter: Filter) -> bool {
        let before = self.cards.len();
        self.cards.retain(|card| card.id != task_id);
        let removed = self.cards.len() != before;
        self.clamp_selection(filter);
        removed
    }

    /// Swaps in the server's copy of a card. Returns whether the id was present.
    pub fn replace_card(&mut self, task: Task, filter: Filter) -> bool {
        let Some(card) = self.cards.iter_mut().find(|card| card.id == task.id) else {
            return false;
        };
        *card = task;
        self.clamp_selection(filter);
        true
    }

    pub fn select_next(&mut self, filter: Filter) {
        let len = self.visible_cards(filter).len();
        if len == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    pub fn select_previous(&mut self, filter: Filter) {
        let len = self.visible_cards(filter).len();
        if len == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        });
    }

    pub fn clamp_selection(&mut self, filter: Filter) {
        let len = self.visible_cards(filter).len();
        self.selected = match (len, self.selected) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(i)) => Some(i.min(len - 1)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: String::new(),
            status,
            total_minutes: 0,
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn view_with(ids: &[i64]) -> DashboardView {
        let mut view = DashboardView::new(Duration::from_secs(3));
        view.set_cards(ids.iter().map(|&id| task(id, TaskStatus::Todo)).collect(), Filter::All);
        view
    }

    #[test]
    fn remove_card_only_touches_matching_id() {
        let mut view = view_with(&[1, 2, 3]);
        assert!(view.remove_card(2, Filter::All));
        let ids: Vec<i64> = view.cards.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(!view.remove_card(99, Filter::All));
        assert_eq!(view.cards.len(), 2);
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut view = view_with(&[1, 2]);
        assert_eq!(view.selected, Some(0));
        view.select_next(Filter::All);
        view.select_next(Filter::All);
        assert_eq!(view.selected, Some(0));
        view.select_previous(Filter::All);
        assert_eq!(view.selected, Some(1));
    }

    #[test]
    fn selection_clamps_after_removal() {
        let mut view = view_with(&[1, 2]);
        view.select_next(Filter::All);
        view.remove_card(2, Filter::All);
        assert_eq!(view.selected, Some(0));
        view.remove_card(1, Filter::All);
        assert_eq!(view.selected, None);
    }

    #[test]
    fn filter_limits_visible_cards() {
        let mut view = DashboardView::new(Duration::from_secs(3));
        view.set_cards(
            vec![task(1, TaskStatus::Todo), task(2, TaskStatus::Done), task(3, TaskStatus::Done)],
            Filter::Done,
        );
        let visible: Vec<i64> = view.visible_cards(Filter::Done).iter().map(|t| t.id).collect();
        assert_eq!(visible, vec![2, 3]);
        assert_eq!(view.selected_card(Filter::Done).map(|t| t.id), Some(2));
        assert_eq!(view.cards.len(), 3);
    }

    #[test]
    fn insert_card_skips_duplicates() {
        let mut view = view_with(&[1]);
        view.insert_card(task(1, TaskStatus::Done), Filter::All);
        view.insert_card(task(2, TaskStatus::Todo), Filter::All);
        assert_eq!(view.cards.len(), 2);
    }

    #[test]
    fn form_reset_restores_defaults() {
        let mut form = TaskForm::default();
        form.title.set_text("x");
        form.status = TaskStatus::Done;
        form.reset();
        assert_eq!(form, TaskForm::default());
    }
}
