//! In-memory task service used as either backing endpoint in tests and local
//! runs. Every request is appended to a [`Journal`] before it is handled, so
//! tests can assert which requests reached which endpoint.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const MAX_RECORDED_BODY: usize = 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_completed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

/// Full replacement body for `PUT /tasks/{id}`. An `id` field in the body is
/// ignored; the path wins.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub name: String,
    pub description: Option<String>,
    pub is_completed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

/// A request as seen by the server, before routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Shared, append-only log of received requests.
#[derive(Clone, Debug, Default)]
pub struct Journal(Arc<Mutex<Vec<RecordedRequest>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, entry: RecordedRequest) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, Task>>>;

pub fn app() -> Router {
    router(Journal::new())
}

pub fn router(journal: Journal) -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task)
                .put(update_task)
                .patch(patch_task)
                .delete(delete_task),
        )
        .with_state(db)
        .layer(middleware::from_fn_with_state(journal, record))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Journal::new()).await
}

pub async fn serve(listener: TcpListener, journal: Journal) -> Result<(), std::io::Error> {
    axum::serve(listener, router(journal)).await
}

async fn record(State(journal): State<Journal>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_RECORDED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to buffer request body");
            return (StatusCode::BAD_REQUEST, "failed to read request body").into_response();
        }
    };
    tracing::debug!(method = %parts.method, uri = %parts.uri, "request received");
    journal.push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_tasks(State(db): State<Db>) -> Json<Vec<Task>> {
    let tasks = db.read().await;
    Json(tasks.values().cloned().collect())
}

async fn create_task(
    State(db): State<Db>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), StatusCode> {
    if input.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let task = Task {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
        is_completed: input.is_completed,
    };
    db.write().await.insert(task.id, task.clone());
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, StatusCode> {
    let tasks = db.read().await;
    tasks.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>, StatusCode> {
    let mut tasks = db.write().await;
    let task = tasks.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    task.name = input.name;
    task.description = input.description;
    task.is_completed = input.is_completed;
    Ok(Json(task.clone()))
}

async fn patch_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<PatchTask>,
) -> Result<Json<Task>, StatusCode> {
    let mut tasks = db.write().await;
    let task = tasks.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        task.name = name;
    }
    if let Some(description) = input.description {
        task.description = Some(description);
    }
    if let Some(is_completed) = input.is_completed {
        task.is_completed = is_completed;
    }
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut tasks = db.write().await;
    tasks.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}
