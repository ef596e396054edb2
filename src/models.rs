use serde::{Deserialize, Serialize};

/// A task as returned by the `/tasks` endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub total_minutes: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    #[serde(other)]
    Other,
}

impl TaskStatus {
    /// Statuses offered by the create form, in cycling order.
    pub const SELECTABLE: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Other => "other",
        }
    }

    pub fn next(self) -> Self {
        match self {
            TaskStatus::Todo => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Done,
            TaskStatus::Done | TaskStatus::Other => TaskStatus::Todo,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            TaskStatus::Todo | TaskStatus::Other => TaskStatus::Done,
            TaskStatus::InProgress => TaskStatus::Todo,
            TaskStatus::Done => TaskStatus::InProgress,
        }
    }
}

/// Draft values for the create-task form. Also the `POST /tasks/` body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SuggestMode {
    /// Write a description for a task title
    Draft,
    /// Plan the day from the current task list
    Plan,
}

/// Body of `POST /ai/suggest`. `title` is only sent in draft mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub mode: SuggestMode,
}

impl SuggestRequest {
    pub fn draft(title: impl Into<String>) -> Self {
        SuggestRequest {
            title: Some(title.into()),
            mode: SuggestMode::Draft,
        }
    }

    pub fn for_mode(mode: SuggestMode) -> Self {
        SuggestRequest { title: None, mode }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestResponse {
    pub suggestion: String,
}

/// Error payload returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Flattens `detail` into display text. Validation errors arrive as a list.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Body of both `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Todo,
    InProgress,
    Done,
}

impl Filter {
    pub const ALL: [Filter; 4] = [Filter::All, Filter::Todo, Filter::InProgress, Filter::Done];

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Todo => "Todo",
            Filter::InProgress => "In Progress",
            Filter::Done => "Done",
        }
    }

    pub fn index(&self) -> usize {
        Filter::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Filter::ALL[(self.index() + 1) % Filter::ALL.len()]
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Todo => task.status == TaskStatus::Todo,
            Filter::InProgress => task.status == TaskStatus::InProgress,
            Filter::Done => task.status == TaskStatus::Done,
        }
    }
}

/// In-memory dashboard state, owned by the controller for the session lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiState {
    pub show_create_modal: bool,
    pub ai_task_title: String,
    pub ai_response: String,
    pub filter: Filter,
    pub new_task: NewTask,
}

/// Partial update merged into `UiState` by `update_state`.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub show_create_modal: Option<bool>,
    pub ai_task_title: Option<String>,
    pub ai_response: Option<String>,
    pub filter: Option<Filter>,
    pub new_task: Option<NewTask>,
}

impl UiState {
    pub fn merge(&mut self, patch: StatePatch) {
        if let Some(show) = patch.show_create_modal {
            self.show_create_modal = show;
        }
        if let Some(title) = patch.ai_task_title {
            self.ai_task_title = title;
        }
        if let Some(response) = patch.ai_response {
            self.ai_response = response;
        }
        if let Some(filter) = patch.filter {
            self.filter = filter;
        }
        if let Some(new_task) = patch.new_task {
            self.new_task = new_task;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_serializes_in_form_order() {
        let task = NewTask {
            title: "Fix bug".to_string(),
            description: "details".to_string(),
            status: TaskStatus::Todo,
        };
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(json, r#"{"title":"Fix bug","description":"details","status":"todo"}"#);
    }

    #[test]
    fn draft_request_carries_title() {
        let json = serde_json::to_string(&SuggestRequest::draft("Write report")).unwrap();
        assert_eq!(json, r#"{"title":"Write report","mode":"draft"}"#);
    }

    #[test]
    fn plan_request_omits_title() {
        let json = serde_json::to_string(&SuggestRequest::for_mode(SuggestMode::Plan)).unwrap();
        assert_eq!(json, r#"{"mode":"plan"}"#);
    }

    #[test]
    fn task_decodes_backend_payload() {
        let json = r#"{
            "id": 7,
            "title": "Ship it",
            "description": "",
            "status": "in_progress",
            "total_minutes": 30,
            "user_id": 1,
            "created_at": "2024-05-01T10:00:00",
            "updated_at": null
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.updated_at, None);
    }

    #[test]
    fn unknown_status_decodes_as_other() {
        let task: Task = serde_json::from_str(r#"{"id":1,"title":"x","status":"blocked"}"#).unwrap();
        assert_eq!(task.status, TaskStatus::Other);
    }

    #[test]
    fn error_body_detail_text() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Task not found"}"#).unwrap();
        assert_eq!(body.detail_text().as_deref(), Some("Task not found"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert!(body.detail_text().unwrap().contains("field required"));

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.detail_text(), None);
    }

    #[test]
    fn filter_cycles_through_all_values() {
        let mut filter = Filter::All;
        for expected in [Filter::Todo, Filter::InProgress, Filter::Done, Filter::All] {
            filter = filter.next();
            assert_eq!(filter, expected);
        }
    }

    #[test]
    fn merge_only_touches_given_fields() {
        let mut state = UiState {
            ai_task_title: "keep".to_string(),
            ..UiState::default()
        };
        state.merge(StatePatch {
            filter: Some(Filter::Done),
            ..StatePatch::default()
        });
        assert_eq!(state.filter, Filter::Done);
        assert_eq!(state.ai_task_title, "keep");
    }
}
