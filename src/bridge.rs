//! Runtime bridge between the UI thread and the HTTP client.
//!
//! The UI queues `Command`s; each one runs in its own tokio task and reports
//! back a single `ApiEvent`. Requests are independent: they may complete in any
//! order and none is ever cancelled.

use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{NewTask, SuggestMode, SuggestRequest, Task, TaskStatus};
use crate::session::CookieStore;

/// Which UI action asked for a task to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOrigin {
    Form,
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTask { task: NewTask, origin: CreateOrigin },
    ListTasks,
    DeleteTask { task_id: i64 },
    ChangeStatus { task_id: i64, status: TaskStatus },
    Suggest { request: SuggestRequest },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateTask { .. } => "create_task",
            Command::ListTasks => "list_tasks",
            Command::DeleteTask { .. } => "delete_task",
            Command::ChangeStatus { .. } => "change_status",
            Command::Suggest { .. } => "suggest",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiEvent {
    TaskCreated {
        origin: CreateOrigin,
        result: Result<Option<Task>, ApiError>,
    },
    TasksLoaded(Result<Vec<Task>, ApiError>),
    TaskDeleted {
        task_id: i64,
        result: Result<(), ApiError>,
    },
    StatusChanged {
        task_id: i64,
        result: Result<Task, ApiError>,
    },
    Suggestion {
        mode: SuggestMode,
        result: Result<String, ApiError>,
    },
}

/// Starts the command loop on `handle`.
pub fn spawn_bridge(
    handle: &Handle,
    client: ApiClient,
    cookies: CookieStore,
    commands: UnboundedReceiver<Command>,
    events: UnboundedSender<ApiEvent>,
) {
    handle.spawn(run(client, cookies, commands, events));
}

async fn run(
    client: ApiClient,
    cookies: CookieStore,
    mut commands: UnboundedReceiver<Command>,
    events: UnboundedSender<ApiEvent>,
) {
    while let Some(command) = commands.recv().await {
        log::debug!("dispatching {} to {}", command.name(), client.base_url());
        let cookies = cookies.clone();
        let client = client.clone();
        let events = events.clone();
        tokio::spawn(async move {
            // Token is re-read per request so a login from another shell takes effect.
            let token = match tokio::task::spawn_blocking(move || cookies.token()).await {
                Ok(token) => token,
                Err(e) => {
                    log::error!("Cookie read task failed: {}", e);
                    None
                }
            };
            let event = execute(&client, token.as_deref(), command).await;
            if events.send(event).is_err() {
                log::debug!("UI gone, dropping API result");
            }
        });
    }
    log::debug!("command channel closed, bridge shutting down");
}

pub async fn execute(client: &ApiClient, token: Option<&str>, command: Command) -> ApiEvent {
    match command {
        Command::CreateTask { task, origin } => ApiEvent::TaskCreated {
            origin,
            result: client.create_task(token, &task).await,
        },
        Command::ListTasks => ApiEvent::TasksLoaded(client.list_tasks(token).await),
        Command::DeleteTask { task_id } => ApiEvent::TaskDeleted {
            task_id,
            result: client.delete_task(token, task_id).await,
        },
        Command::ChangeStatus { task_id, status } => ApiEvent::StatusChanged {
            task_id,
            result: client.change_status(token, task_id, status).await,
        },
        Command::Suggest { request } => {
            let mode = request.mode;
            ApiEvent::Suggestion {
                mode,
                result: client.suggest(token, &request).await,
            }
        }
    }
}
