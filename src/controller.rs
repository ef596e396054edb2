//! Dashboard controller: owns the UI state and the view, turns user actions
//! into backend commands, and applies backend results back onto the view.

use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use crate::bridge::{ApiEvent, Command, CreateOrigin};
use crate::error::ApiError;
use crate::models::{NewTask, StatePatch, SuggestMode, SuggestRequest, Task, TaskStatus, UiState};
use crate::scheduler::{Deferred, Scheduler};
use crate::toast::ToastKind;
use crate::view::{
    ConfirmDialog, DashboardView, Display, Focus, FormField, SuggestionAction,
    CREATE_FROM_SUGGESTION_LABEL,
};

/// Cursor and editing keys applied to whichever field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    Newline,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    OpenModal,
    CloseModal,
    SubmitForm,
    AiSuggest(SuggestMode),
    TestCreate,
    DeleteTask(i64),
    DeleteSelected,
    ChangeStatus(i64, TaskStatus),
    AdvanceSelectedStatus,
    Confirm,
    Cancel,
    CreateFromSuggestion,
    SelectNext,
    SelectPrevious,
    CycleFilter,
    Reload,
    FocusNext,
    FocusPrevious,
    FocusAiTitle,
    FocusBoard,
    Edit(EditKey),
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub reload_delay: Duration,
    pub toast_ttl: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            reload_delay: Duration::from_millis(1000),
            toast_ttl: Duration::from_millis(3000),
        }
    }
}

pub struct DashboardController {
    state: UiState,
    view: DashboardView,
    commands: UnboundedSender<Command>,
    scheduler: Scheduler,
    reload_delay: Duration,
    should_quit: bool,
}

impl DashboardController {
    pub fn new(commands: UnboundedSender<Command>, settings: ControllerSettings) -> Self {
        log::info!("Dashboard controller initialized");
        DashboardController {
            state: UiState::default(),
            view: DashboardView::new(settings.toast_ttl),
            commands,
            scheduler: Scheduler::default(),
            reload_delay: settings.reload_delay,
            should_quit: false,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[cfg(test)]
    pub fn pending_reloads(&self) -> usize {
        self.scheduler.count(Deferred::ReloadTasks)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::OpenModal => self.open_modal(),
            Action::CloseModal => self.close_modal(),
            Action::SubmitForm => self.create_task(),
            Action::AiSuggest(mode) => self.get_ai_suggestion(mode),
            Action::TestCreate => self.test_task_creation(),
            Action::DeleteTask(task_id) => self.delete_task(task_id),
            Action::DeleteSelected => {
                if let Some(task_id) = self.view.selected_card(self.state.filter).map(|t| t.id) {
                    self.dispatch(Action::DeleteTask(task_id));
                }
            }
            Action::ChangeStatus(task_id, status) => self.change_status(task_id, status),
            Action::AdvanceSelectedStatus => {
                if let Some(task) = self.view.selected_card(self.state.filter) {
                    let (task_id, status) = (task.id, task.status.next());
                    self.dispatch(Action::ChangeStatus(task_id, status));
                }
            }
            Action::Confirm => self.confirm(),
            Action::Cancel => self.cancel_confirm(),
            Action::CreateFromSuggestion => {
                if let Some(action) = self.view.ai_response.action.clone() {
                    self.create_task_with_ai_description(&action.description);
                }
            }
            Action::SelectNext => self.view.select_next(self.state.filter),
            Action::SelectPrevious => self.view.select_previous(self.state.filter),
            Action::CycleFilter => {
                let filter = self.state.filter.next();
                self.update_state(StatePatch {
                    filter: Some(filter),
                    ..StatePatch::default()
                });
            }
            Action::Reload => self.reload_tasks(),
            Action::FocusNext => self.move_focus(FormField::next),
            Action::FocusPrevious => self.move_focus(FormField::previous),
            Action::FocusAiTitle => self.view.focus = Focus::AiTitle,
            Action::FocusBoard => self.view.focus = Focus::Board,
            Action::Edit(key) => self.edit_focused(key),
            Action::Quit => self.should_quit = true,
        }
    }

    // Modal management

    pub fn open_modal(&mut self) {
        log::debug!("Opening modal");
        self.state.show_create_modal = true;
        self.view.focus = Focus::Form(FormField::Title);
        self.update_modal_visibility();
    }

    pub fn close_modal(&mut self) {
        log::debug!("Closing modal");
        self.state.show_create_modal = false;
        self.reset_form();
        self.update_modal_visibility();
    }

    fn update_modal_visibility(&mut self) {
        let shown = if self.state.show_create_modal {
            Display::Flex
        } else {
            Display::None
        };
        match (self.view.modal, shown) {
            (Display::None, Display::Flex) if !matches!(self.view.focus, Focus::Form(_)) => {
                self.view.focus = Focus::Form(FormField::Title);
            }
            (Display::Flex, Display::None) if matches!(self.view.focus, Focus::Form(_)) => {
                self.view.focus = Focus::Board;
            }
            _ => {}
        }
        self.view.modal = shown;
    }

    fn reset_form(&mut self) {
        self.state.new_task = NewTask::default();
        self.state.ai_response.clear();
        self.state.ai_task_title.clear();
        self.view.form.reset();
    }

    fn move_focus(&mut self, step: fn(FormField) -> FormField) {
        if let Focus::Form(field) = self.view.focus {
            self.view.focus = Focus::Form(step(field));
        }
    }

    // Task management

    pub fn create_task(&mut self) {
        let title = self.view.form.title.text().trim().to_string();
        let description = self.view.form.description.text().trim().to_string();
        let status = self.view.form.status;

        if title.is_empty() {
            self.show_toast("Task title is required", ToastKind::Error);
            return;
        }

        let task = NewTask {
            title,
            description,
            status,
        };
        log::debug!("Creating task: {:?}", task);
        if !self.send(Command::CreateTask {
            task,
            origin: CreateOrigin::Form,
        }) {
            self.show_toast("Network error creating task", ToastKind::Error);
        }
    }

    /// Creates a placeholder task for manually checking the create round trip.
    pub fn test_task_creation(&mut self) {
        let task = NewTask {
            title: format!("Test Task {}", chrono::Utc::now().timestamp_millis()),
            description: "This is a test task".to_string(),
            status: Default::default(),
        };
        if !self.send(Command::CreateTask {
            task,
            origin: CreateOrigin::Diagnostic,
        }) {
            self.show_toast("Test failed with error", ToastKind::Error);
        }
    }

    /// Asks for confirmation; the DELETE is only sent from `confirm`.
    pub fn delete_task(&mut self, task_id: i64) {
        self.view.confirm = Some(ConfirmDialog {
            message: "Are you sure you want to delete this task?".to_string(),
            task_id,
        });
    }

    pub fn confirm(&mut self) {
        let Some(dialog) = self.view.confirm.take() else {
            return;
        };
        if !self.send(Command::DeleteTask {
            task_id: dialog.task_id,
        }) {
            self.show_toast("Error deleting task", ToastKind::Error);
        }
    }

    pub fn cancel_confirm(&mut self) {
        self.view.confirm = None;
    }

    pub fn change_status(&mut self, task_id: i64, status: TaskStatus) {
        log::debug!("Moving task {} to {}", task_id, status.as_str());
        if !self.send(Command::ChangeStatus { task_id, status }) {
            self.show_toast("Error updating task status", ToastKind::Error);
        }
    }

    /// Re-fetches the task list, replacing every card once it arrives.
    pub fn reload_tasks(&mut self) {
        if !self.send(Command::ListTasks) {
            self.show_toast("Error loading tasks", ToastKind::Error);
        }
    }

    // AI integration

    pub fn get_ai_suggestion(&mut self, mode: SuggestMode) {
        if mode == SuggestMode::Draft {
            let title = self.view.ai_title.text().trim().to_string();
            if title.is_empty() {
                self.show_toast("Please enter a task title first", ToastKind::Error);
                return;
            }
            self.state.ai_task_title = title;
        }

        let request = match mode {
            SuggestMode::Draft => SuggestRequest::draft(self.state.ai_task_title.clone()),
            other => SuggestRequest::for_mode(other),
        };
        if !self.send(Command::Suggest { request }) {
            self.show_toast("Error getting AI suggestion", ToastKind::Error);
        }
    }

    pub fn display_ai_response(&mut self, suggestion: &str) {
        self.view.ai_response.text = suggestion.to_string();
        self.view.ai_response.hidden = false;
        self.add_create_task_button(suggestion);
    }

    /// Replaces any existing action under the suggestion with a fresh one.
    pub fn add_create_task_button(&mut self, description: &str) {
        self.view.ai_response.action = Some(SuggestionAction {
            label: CREATE_FROM_SUGGESTION_LABEL,
            description: description.to_string(),
        });
    }

    pub fn create_task_with_ai_description(&mut self, description: &str) {
        let ai_task_title = self.view.ai_title.text().trim().to_string();
        if ai_task_title.is_empty() {
            self.show_toast("Please enter a task title first", ToastKind::Error);
            return;
        }

        self.view.form.title.set_text(&ai_task_title);
        self.view.form.description.set_text(description);
        self.sync_draft_from_form();
        self.open_modal();
        self.show_toast(
            "AI description applied! Fill in any details and create your task.",
            ToastKind::Success,
        );
    }

    // Utilities

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        let message = message.into();
        log::debug!("toast [{:?}] {}", kind, message);
        self.view.toasts.push(message, kind, Instant::now());
    }

    // State management

    pub fn update_state(&mut self, patch: StatePatch) {
        self.state.merge(patch);
        self.render();
    }

    /// Brings modal visibility and the description field in line with `state`.
    pub fn render(&mut self) {
        self.update_modal_visibility();
        self.update_description_field();
        self.view.clamp_selection(self.state.filter);
    }

    fn update_description_field(&mut self) {
        if self.view.form.description.text() != self.state.new_task.description {
            self.view.form.description.set_text(&self.state.new_task.description);
        }
    }

    fn sync_draft_from_form(&mut self) {
        self.state.new_task = NewTask {
            title: self.view.form.title.text(),
            description: self.view.form.description.text(),
            status: self.view.form.status,
        };
    }

    fn edit_focused(&mut self, key: EditKey) {
        match self.view.focus {
            Focus::Board => {}
            Focus::AiTitle => apply_edit(&mut self.view.ai_title, key),
            Focus::Form(FormField::Title) => {
                apply_edit(&mut self.view.form.title, key);
                self.sync_draft_from_form();
            }
            Focus::Form(FormField::Description) => {
                apply_edit(&mut self.view.form.description, key);
                self.sync_draft_from_form();
            }
            Focus::Form(FormField::Status) => {
                let status = &mut self.view.form.status;
                match key {
                    EditKey::Left | EditKey::Up => *status = status.previous(),
                    EditKey::Right | EditKey::Down | EditKey::Char(' ') => *status = status.next(),
                    _ => {}
                }
                self.sync_draft_from_form();
            }
        }
    }

    // Backend results and timers

    pub fn handle_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::TaskCreated { origin, result } => self.on_task_created(origin, result),
            ApiEvent::TasksLoaded(result) => self.on_tasks_loaded(result),
            ApiEvent::TaskDeleted { task_id, result } => self.on_task_deleted(task_id, result),
            ApiEvent::StatusChanged { task_id, result } => self.on_status_changed(task_id, result),
            ApiEvent::Suggestion { mode, result } => self.on_suggestion(mode, result),
        }
    }

    fn on_task_created(&mut self, origin: CreateOrigin, result: Result<Option<Task>, ApiError>) {
        match (origin, result) {
            (CreateOrigin::Form, Ok(created)) => {
                self.show_toast("Task created successfully!", ToastKind::Success);
                self.close_modal();
                if let Some(task) = created {
                    self.view.insert_card(task, self.state.filter);
                }
                self.schedule_reload();
            }
            (CreateOrigin::Form, Err(ApiError::Status { code, body, .. })) => {
                self.show_toast(format!("Failed to create task: {}", code), ToastKind::Error);
                log::error!("Task creation error: {}", body);
            }
            (CreateOrigin::Form, Err(e)) => {
                log::error!("Task creation error: {}", e);
                self.show_toast("Network error creating task", ToastKind::Error);
            }
            (CreateOrigin::Diagnostic, Ok(created)) => {
                self.show_toast("Test task created successfully!", ToastKind::Success);
                if let Some(task) = created {
                    self.view.insert_card(task, self.state.filter);
                }
                self.schedule_reload();
            }
            (CreateOrigin::Diagnostic, Err(ApiError::Status { code, .. })) => {
                self.show_toast(format!("Test failed: {}", code), ToastKind::Error);
            }
            (CreateOrigin::Diagnostic, Err(e)) => {
                log::error!("Test task creation error: {}", e);
                self.show_toast("Test failed with error", ToastKind::Error);
            }
        }
    }

    fn on_tasks_loaded(&mut self, result: Result<Vec<Task>, ApiError>) {
        match result {
            Ok(tasks) => {
                log::debug!("Loaded {} tasks", tasks.len());
                self.view.set_cards(tasks, self.state.filter);
            }
            Err(ApiError::Status { code, body, .. }) => {
                log::error!("Task list error: {}", body);
                self.show_toast(format!("Failed to load tasks: {}", code), ToastKind::Error);
            }
            Err(e) => {
                log::error!("Task list error: {}", e);
                self.show_toast("Error loading tasks", ToastKind::Error);
            }
        }
    }

    fn on_task_deleted(&mut self, task_id: i64, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                self.view.remove_card(task_id, self.state.filter);
                self.show_toast("Task deleted successfully!", ToastKind::Success);
            }
            Err(ApiError::Status { code, body, .. }) => {
                log::error!("Delete error ({}): {}", code, body);
                self.show_toast("Failed to delete task", ToastKind::Error);
            }
            Err(e) => {
                log::error!("Delete error: {}", e);
                self.show_toast("Error deleting task", ToastKind::Error);
            }
        }
    }

    fn on_status_changed(&mut self, task_id: i64, result: Result<Task, ApiError>) {
        match result {
            Ok(task) => {
                let status = task.status;
                if !self.view.replace_card(task, self.state.filter) {
                    log::debug!("Task {} changed status but has no card", task_id);
                }
                self.show_toast(
                    format!("Task moved to {}", status.as_str()),
                    ToastKind::Success,
                );
            }
            Err(ApiError::Status { code, body, .. }) => {
                log::error!("Status change error ({}): {}", code, body);
                self.show_toast(format!("Failed to update task status: {}", code), ToastKind::Error);
            }
            Err(e) => {
                log::error!("Status change error: {}", e);
                self.show_toast("Error updating task status", ToastKind::Error);
            }
        }
    }

    fn on_suggestion(&mut self, mode: SuggestMode, result: Result<String, ApiError>) {
        match result {
            Ok(suggestion) => {
                self.state.ai_response = suggestion.clone();
                self.display_ai_response(&suggestion);
                if mode == SuggestMode::Draft {
                    // The form may still be closed; it keeps the text for later.
                    self.view.form.description.set_text(&suggestion);
                    self.sync_draft_from_form();
                }
                self.show_toast("AI suggestion received!", ToastKind::Success);
            }
            Err(ApiError::Status { code, detail, .. }) => {
                let detail = detail.unwrap_or_else(|| format!("HTTP {}", code));
                self.show_toast(format!("Failed to get AI suggestion: {}", detail), ToastKind::Error);
            }
            Err(e) => {
                log::error!("AI suggestion error: {}", e);
                self.show_toast("Error getting AI suggestion", ToastKind::Error);
            }
        }
    }

    fn schedule_reload(&mut self) {
        self.scheduler
            .schedule(Instant::now() + self.reload_delay, Deferred::ReloadTasks);
    }

    /// Runs deferred work that is due and expires old toasts.
    pub fn tick(&mut self, now: Instant) {
        for work in self.scheduler.due(now) {
            match work {
                Deferred::ReloadTasks => self.reload_tasks(),
            }
        }
        self.view.toasts.prune(now);
    }

    /// Queues a command; false when the bridge is gone.
    fn send(&mut self, command: Command) -> bool {
        let name = command.name();
        match self.commands.send(command) {
            Ok(()) => {
                log::debug!("queued {}", name);
                true
            }
            Err(_) => {
                log::error!("backend bridge disconnected, {} not sent", name);
                false
            }
        }
    }
}

fn apply_edit(field: &mut crate::field::TextField, key: EditKey) {
    match key {
        EditKey::Char(c) => field.insert_char(c),
        EditKey::Newline => field.insert_newline(),
        EditKey::Backspace => field.delete_char(),
        EditKey::Left => field.move_cursor_left(),
        EditKey::Right => field.move_cursor_right(),
        EditKey::Up => field.move_cursor_up(),
        EditKey::Down => field.move_cursor_down(),
        EditKey::Home => field.move_to_start_of_line(),
        EditKey::End => field.move_to_end_of_line(),
    }
}
