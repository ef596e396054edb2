use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use crate::error::ApiError;
use crate::models::{
    Credentials, ErrorBody, LoginResponse, NewTask, RegisterResponse, SuggestRequest, SuggestResponse, Task,
    TaskStatus,
};

/// HTTP client for the task and AI endpoints.
///
/// Every call takes the bearer token explicitly so the caller can re-read the
/// cookie jar per request. A `None` token sends the request unauthenticated and
/// leaves rejection to the backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `POST /tasks/`. The created task is decoded when the body allows it;
    /// a 2xx with an unexpected body still counts as success.
    pub async fn create_task(&self, token: Option<&str>, task: &NewTask) -> Result<Option<Task>, ApiError> {
        let request = self.authorized(self.client.post(self.url("/tasks/")), token).json(task);
        let response = check(request.send().await?).await?;
        let body = response.text().await?;
        match serde_json::from_str::<Task>(&body) {
            Ok(created) => Ok(Some(created)),
            Err(e) => {
                log::warn!("Created task but could not decode response: {}", e);
                Ok(None)
            }
        }
    }

    /// `GET /tasks/`
    pub async fn list_tasks(&self, token: Option<&str>) -> Result<Vec<Task>, ApiError> {
        let request = self.authorized(self.client.get(self.url("/tasks/")), token);
        let response = check(request.send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `DELETE /tasks/{id}`
    pub async fn delete_task(&self, token: Option<&str>, task_id: i64) -> Result<(), ApiError> {
        let request = self.authorized(self.client.delete(self.url(&format!("/tasks/{}", task_id))), token);
        check(request.send().await?).await?;
        Ok(())
    }

    /// `POST /tasks/{id}/status?status=...`, returning the updated task.
    pub async fn change_status(
        &self,
        token: Option<&str>,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Task, ApiError> {
        let request = self
            .authorized(self.client.post(self.url(&format!("/tasks/{}/status", task_id))), token)
            .query(&[("status", status.as_str())]);
        let response = check(request.send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /ai/suggest`, returning the suggestion text.
    pub async fn suggest(&self, token: Option<&str>, request: &SuggestRequest) -> Result<String, ApiError> {
        let builder = self.authorized(self.client.post(self.url("/ai/suggest")), token).json(request);
        let response = check(builder.send().await?).await?;
        let body = response.text().await?;
        let parsed: SuggestResponse = serde_json::from_str(&body)?;
        Ok(parsed.suggestion)
    }

    /// `POST /auth/login`
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = self.post_credentials("/auth/login", username, password).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /auth/register`
    pub async fn register(&self, username: &str, password: &str) -> Result<RegisterResponse, ApiError> {
        let body = self.post_credentials("/auth/register", username, password).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_credentials(&self, path: &str, username: &str, password: &str) -> Result<String, ApiError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = check(self.client.post(self.url(path)).json(&credentials).send().await?).await?;
        Ok(response.text().await?)
    }
}

/// Turns non-2xx responses into `ApiError::Status`, keeping the body and any `detail`.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.detail_text());
    Err(ApiError::Status {
        code: status.as_u16(),
        body,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SuggestMode;
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        routing::{delete, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct Recorded {
        requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    impl Recorded {
        fn push(&self, route: &str, headers: &HeaderMap, body: Value) {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            self.requests.lock().unwrap().push((route.to_string(), auth, body));
        }

        fn all(&self) -> Vec<(String, Option<String>, Value)> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn create(State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        rec.push("create", &headers, body.clone());
        if body["title"] == "reject" {
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": "bad title"})));
        }
        (
            StatusCode::CREATED,
            Json(json!({
                "id": 41,
                "title": body["title"],
                "description": body["description"],
                "status": body["status"],
                "total_minutes": 0,
                "user_id": 1,
                "created_at": "2024-05-01T10:00:00"
            })),
        )
    }

    async fn list(State(rec): State<Recorded>, headers: HeaderMap) -> Json<Value> {
        rec.push("list", &headers, Value::Null);
        Json(json!([
            {"id": 1, "title": "one", "description": "", "status": "todo"},
            {"id": 2, "title": "two", "description": "", "status": "done"}
        ]))
    }

    async fn remove(State(rec): State<Recorded>, headers: HeaderMap, Path(id): Path<i64>) -> (StatusCode, Json<Value>) {
        rec.push("delete", &headers, json!(id));
        if id == 404 {
            return (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"})));
        }
        (StatusCode::OK, Json(json!({"ok": true})))
    }

    async fn suggest(State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        rec.push("suggest", &headers, body.clone());
        if headers.get("authorization").is_none() {
            return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})));
        }
        (StatusCode::OK, Json(json!({"suggestion": "Draft text"})))
    }

    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "secret" {
            (StatusCode::OK, Json(json!({"access_token": "jwt-token", "token_type": "bearer"})))
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Incorrect username or password"})))
        }
    }

    async fn change_status(
        State(rec): State<Recorded>,
        headers: HeaderMap,
        Path(id): Path<i64>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let status = params.get("status").cloned().unwrap_or_default();
        rec.push("status", &headers, json!({"id": id, "status": status}));
        if id == 404 {
            return (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"})));
        }
        (
            StatusCode::OK,
            Json(json!({"id": id, "title": "moved", "description": "", "status": status})),
        )
    }

    async fn register(State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        rec.push("register", &headers, body.clone());
        if body["username"] == "taken" {
            return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Username already registered"})));
        }
        (StatusCode::OK, Json(json!({"message": "User created successfully", "user_id": 7})))
    }

    async fn spawn_server() -> (ApiClient, Recorded) {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let recorded = Recorded::default();
        let app = Router::new()
            .route("/tasks/", post(create).get(list))
            .route("/tasks/:id", delete(remove))
            .route("/tasks/:id/status", post(change_status))
            .route("/ai/suggest", post(suggest))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .with_state(recorded.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let client = ApiClient::new(format!("http://{}/", addr), None).expect("client");
        (client, recorded)
    }

    #[tokio::test]
    async fn create_task_posts_form_payload_with_bearer() {
        let (client, recorded) = spawn_server().await;
        let task = NewTask {
            title: "Fix bug".to_string(),
            description: "details".to_string(),
            status: TaskStatus::Todo,
        };
        let created = client.create_task(Some("abc"), &task).await.expect("create");
        assert_eq!(created.map(|t| t.id), Some(41));

        let requests = recorded.all();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1.as_deref(), Some("Bearer abc"));
        assert_eq!(
            requests[0].2,
            json!({"title": "Fix bug", "description": "details", "status": "todo"})
        );
    }

    #[tokio::test]
    async fn create_task_surfaces_status_and_detail() {
        let (client, _) = spawn_server().await;
        let task = NewTask {
            title: "reject".to_string(),
            ..NewTask::default()
        };
        let err = client.create_task(Some("abc"), &task).await.unwrap_err();
        match err {
            ApiError::Status { code, detail, body } => {
                assert_eq!(code, 422);
                assert_eq!(detail.as_deref(), Some("bad title"));
                assert!(body.contains("bad title"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_tasks_decodes_array() {
        let (client, _) = spawn_server().await;
        let tasks = client.list_tasks(Some("abc")).await.expect("list");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn delete_task_targets_id() {
        let (client, recorded) = spawn_server().await;
        client.delete_task(Some("abc"), 9).await.expect("delete");
        let err = client.delete_task(Some("abc"), 404).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        let ids: Vec<Value> = recorded.all().into_iter().map(|r| r.2).collect();
        assert_eq!(ids, vec![json!(9), json!(404)]);
    }

    #[tokio::test]
    async fn suggest_draft_sends_title_and_mode() {
        let (client, recorded) = spawn_server().await;
        let text = client
            .suggest(Some("abc"), &SuggestRequest::draft("Write report"))
            .await
            .expect("suggest");
        assert_eq!(text, "Draft text");
        assert_eq!(recorded.all()[0].2, json!({"title": "Write report", "mode": "draft"}));
    }

    #[tokio::test]
    async fn missing_token_is_sent_without_authorization() {
        let (client, recorded) = spawn_server().await;
        let err = client
            .suggest(None, &SuggestRequest::for_mode(SuggestMode::Plan))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(recorded.all()[0].1, None);
        assert_eq!(recorded.all()[0].2, json!({"mode": "plan"}));
    }

    #[tokio::test]
    async fn login_returns_access_token() {
        let (client, _) = spawn_server().await;
        let response = client.login("alice", "secret").await.expect("login");
        assert_eq!(response.access_token, "jwt-token");
        let err = client.login("alice", "wrong").await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }

    #[tokio::test]
    async fn change_status_sends_query_and_decodes_task() {
        let (client, recorded) = spawn_server().await;
        let task = client
            .change_status(Some("abc"), 3, TaskStatus::InProgress)
            .await
            .expect("status");
        assert_eq!(task.id, 3);
        assert_eq!(task.status, TaskStatus::InProgress);

        let requests = recorded.all();
        assert_eq!(requests[0].0, "status");
        assert_eq!(requests[0].1.as_deref(), Some("Bearer abc"));
        assert_eq!(requests[0].2, json!({"id": 3, "status": "in_progress"}));

        let err = client.change_status(Some("abc"), 404, TaskStatus::Done).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn register_posts_credentials() {
        let (client, recorded) = spawn_server().await;
        let created = client.register("bob", "pw").await.expect("register");
        assert_eq!(created.user_id, Some(7));
        assert_eq!(created.message, "User created successfully");
        assert_eq!(recorded.all()[0].2, json!({"username": "bob", "password": "pw"}));

        match client.register("taken", "pw").await.unwrap_err() {
            ApiError::Status { code, detail, .. } => {
                assert_eq!(code, 400);
                assert_eq!(detail.as_deref(), Some("Username already registered"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = ApiClient::new(format!("http://{}", addr), Some(Duration::from_secs(2))).unwrap();
        let err = client.list_tasks(None).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
