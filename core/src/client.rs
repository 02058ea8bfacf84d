//! Stateless request builder and response parser for the task API.
//!
//! # Design
//! `TaskClient` carries no mutable state and never touches the network.
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` with a path relative to whichever endpoint serves it, and a
//! `parse_*` method that consumes the `HttpResponse`.

use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTask, PatchTask, Task, UpdateTask};

const DEFAULT_COLLECTION: &str = "/tasks";

/// Request builder and response parser for the task collection.
#[derive(Debug, Clone)]
pub struct TaskClient {
    collection: String,
}

impl Default for TaskClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskClient {
    pub fn new() -> Self {
        Self::with_collection(DEFAULT_COLLECTION)
    }

    /// Use a collection path other than `/tasks`, e.g. `/api/tasks`.
    pub fn with_collection(collection: &str) -> Self {
        let trimmed = collection.trim_matches('/');
        Self {
            collection: format!("/{trimmed}"),
        }
    }

    fn item_path(&self, id: Uuid) -> String {
        format!("{}/{id}", self.collection)
    }

    pub fn build_list_tasks(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.collection.clone())
    }

    pub fn build_get_task(&self, id: Uuid) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.item_path(id))
    }

    pub fn build_create_task(&self, input: &CreateTask) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Post, self.collection.clone()).with_json_body(body))
    }

    pub fn build_update_task(&self, input: &UpdateTask) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Put, self.item_path(input.id)).with_json_body(body))
    }

    pub fn build_patch_task(&self, id: Uuid, input: &PatchTask) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Patch, self.item_path(id)).with_json_body(body))
    }

    pub fn build_delete_task(&self, id: Uuid) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.item_path(id))
    }

    pub fn parse_list_tasks(&self, response: HttpResponse) -> Result<Vec<Task>, ApiError> {
        check_status(&response, &[200])?;
        deserialize(&response.body)
    }

    pub fn parse_get_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response, &[200])?;
        deserialize(&response.body)
    }

    pub fn parse_create_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response, &[200, 201])?;
        deserialize(&response.body)
    }

    /// `None` when the server acknowledged the update without a body (204).
    pub fn parse_update_task(&self, response: HttpResponse) -> Result<Option<Task>, ApiError> {
        check_status(&response, &[200, 204])?;
        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(None);
        }
        deserialize(&response.body).map(Some)
    }

    pub fn parse_patch_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response, &[200])?;
        deserialize(&response.body)
    }

    pub fn parse_delete_task(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])?;
        Ok(())
    }
}

fn deserialize<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map unexpected status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<(), ApiError> {
    if expected.contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, response.body.clone()))
}
