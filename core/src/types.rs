//! Domain DTOs for the task API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any schema drift between the two crates. Field
//! names follow the API's camelCase wire format.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single task returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_completed: bool,
}

impl Task {
    /// Replacement body with the completion flag flipped.
    pub fn toggled(&self) -> UpdateTask {
        UpdateTask {
            is_completed: !self.is_completed,
            ..UpdateTask::from(self)
        }
    }

    /// Replacement body with a new name.
    pub fn renamed(&self, name: &str) -> UpdateTask {
        UpdateTask {
            name: name.to_string(),
            ..UpdateTask::from(self)
        }
    }
}

/// Request payload for creating a new task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

/// Full replacement payload for `PUT /tasks/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_completed: bool,
}

impl From<&Task> for UpdateTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            is_completed: task.is_completed,
        }
    }
}

impl From<UpdateTask> for Task {
    fn from(update: UpdateTask) -> Self {
        Self {
            id: update.id,
            name: update.name,
            description: update.description,
            is_completed: update.is_completed,
        }
    }
}

/// Partial update payload for `PATCH /tasks/{id}`. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}
