//! Task operations routed through the dual-endpoint router.
//!
//! `TodoApi` is what application code talks to: it builds requests with
//! `TaskClient`, sends them with `Router::send`, and parses whatever comes
//! back. Which endpoint actually answered is invisible at this level.

use uuid::Uuid;

use crate::client::TaskClient;
use crate::error::ApiError;
use crate::router::Router;
use crate::transport::Transport;
use crate::types::{CreateTask, PatchTask, Task, UpdateTask};

pub struct TodoApi<T> {
    router: Router<T>,
    client: TaskClient,
}

impl<T: Transport + 'static> TodoApi<T> {
    pub fn new(router: Router<T>) -> Self {
        Self::with_client(router, TaskClient::new())
    }

    pub fn with_client(router: Router<T>, client: TaskClient) -> Self {
        Self { router, client }
    }

    pub fn router(&self) -> &Router<T> {
        &self.router
    }

    pub fn list(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.router.send(&self.client.build_list_tasks()).into_result()?;
        self.client.parse_list_tasks(response)
    }

    pub fn get(&self, id: Uuid) -> Result<Task, ApiError> {
        let response = self.router.send(&self.client.build_get_task(id)).into_result()?;
        self.client.parse_get_task(response)
    }

    /// Create a task named `name`, trimmed. Blank names are rejected locally.
    pub fn create(&self, name: &str, description: Option<String>) -> Result<Task, ApiError> {
        let input = CreateTask {
            name: non_blank(name)?.to_string(),
            description,
            is_completed: false,
        };
        let request = self.client.build_create_task(&input)?;
        let response = self.router.send(&request).into_result()?;
        self.client.parse_create_task(response)
    }

    /// Flip the completion flag by replacing the whole task.
    pub fn toggle(&self, task: &Task) -> Result<Task, ApiError> {
        self.replace(task.toggled().into())
    }

    /// Rename by replacing the whole task. Blank names are rejected locally.
    pub fn rename(&self, task: &Task, name: &str) -> Result<Task, ApiError> {
        let name = non_blank(name)?;
        self.replace(task.renamed(name).into())
    }

    pub fn patch(&self, id: Uuid, patch: &PatchTask) -> Result<Task, ApiError> {
        let request = self.client.build_patch_task(id, patch)?;
        let response = self.router.send(&request).into_result()?;
        self.client.parse_patch_task(response)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let response = self.router.send(&self.client.build_delete_task(id)).into_result()?;
        self.client.parse_delete_task(response)
    }

    /// PUT `updated`; a bodiless acknowledgement yields `updated` itself.
    fn replace(&self, updated: Task) -> Result<Task, ApiError> {
        let request = self.client.build_update_task(&UpdateTask::from(&updated))?;
        let response = self.router.send(&request).into_result()?;
        Ok(self.client.parse_update_task(response)?.unwrap_or(updated))
    }
}

fn non_blank(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("task name must not be blank".to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};
    use crate::router::{Endpoint, MirrorMode};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers primary requests from a queue; the secondary always gets 200.
    #[derive(Default)]
    struct QueuedTransport {
        replies: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<(String, HttpRequest)>>,
    }

    impl Transport for QueuedTransport {
        fn execute(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push((url.to_string(), request.clone()));
            if url.starts_with("http://secondary") {
                return Ok(HttpResponse::new(200, ""));
            }
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| HttpResponse::new(500, "no reply queued")))
        }
    }

    fn api(replies: Vec<HttpResponse>) -> TodoApi<QueuedTransport> {
        api_with(TaskClient::new(), replies)
    }

    fn api_with(client: TaskClient, replies: Vec<HttpResponse>) -> TodoApi<QueuedTransport> {
        let transport = QueuedTransport {
            replies: Mutex::new(replies.into()),
            ..QueuedTransport::default()
        };
        let router = Router::new(
            Endpoint::new("http://primary"),
            Endpoint::new("http://secondary"),
            transport,
        )
        .with_mirror_mode(MirrorMode::Await);
        TodoApi::with_client(router, client)
    }

    fn requests(api: &TodoApi<QueuedTransport>) -> Vec<(String, HttpRequest)> {
        api.router().transport().requests.lock().unwrap().clone()
    }

    fn task() -> Task {
        Task {
            id: Uuid::nil(),
            name: "buy milk".to_string(),
            description: None,
            is_completed: false,
        }
    }

    #[test]
    fn create_trims_name() {
        let api = api(vec![HttpResponse::new(
            201,
            r#"{"id":"00000000-0000-0000-0000-000000000000","name":"buy milk","isCompleted":false}"#,
        )]);

        let created = api.create("  buy milk  ", None).unwrap();

        assert_eq!(created.name, "buy milk");
        let sent = requests(&api);
        let body: serde_json::Value =
            serde_json::from_str(sent[0].1.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "buy milk");
        // primary, then mirror
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].0, "http://secondary/tasks");
    }

    #[test]
    fn blank_names_are_rejected_without_requests() {
        let api = api(Vec::new());

        assert!(matches!(api.create("   ", None), Err(ApiError::InvalidInput(_))));
        assert!(matches!(api.rename(&task(), ""), Err(ApiError::InvalidInput(_))));
        assert!(requests(&api).is_empty());
    }

    #[test]
    fn toggle_puts_full_task_and_keeps_local_copy_on_204() {
        let api = api(vec![HttpResponse::new(204, "")]);

        let toggled = api.toggle(&task()).unwrap();

        assert!(toggled.is_completed);
        assert_eq!(toggled.name, "buy milk");
        let sent = requests(&api);
        let (url, request) = &sent[0];
        assert_eq!(url, "http://primary/tasks/00000000-0000-0000-0000-000000000000");
        assert_eq!(request.method, HttpMethod::Put);
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["isCompleted"], true);
        assert_eq!(body["id"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn rename_prefers_server_copy() {
        let api = api(vec![HttpResponse::new(
            200,
            r#"{"id":"00000000-0000-0000-0000-000000000000","name":"buy oat milk","isCompleted":true}"#,
        )]);

        let renamed = api.rename(&task(), " buy oat milk ").unwrap();

        assert_eq!(renamed.name, "buy oat milk");
        assert!(renamed.is_completed);
    }

    #[test]
    fn not_found_surfaces_as_api_error() {
        let api = api(vec![HttpResponse::new(404, "")]);

        assert!(matches!(api.delete(Uuid::nil()), Err(ApiError::NotFound)));
        // rejected by primary, so no mirror
        assert_eq!(requests(&api).len(), 1);
    }

    #[test]
    fn list_is_never_mirrored() {
        let api = api(vec![HttpResponse::new(200, "[]")]);

        assert!(api.list().unwrap().is_empty());
        assert_eq!(requests(&api).len(), 1);
    }

    #[test]
    fn custom_collection_is_used_on_both_endpoints() {
        let api = api_with(TaskClient::with_collection("/api/todos/"), vec![HttpResponse::new(204, "")]);

        api.delete(Uuid::nil()).unwrap();

        let urls: Vec<_> = requests(&api).into_iter().map(|(url, _)| url).collect();
        assert_eq!(
            urls,
            vec![
                "http://primary/api/todos/00000000-0000-0000-0000-000000000000",
                "http://secondary/api/todos/00000000-0000-0000-0000-000000000000",
            ]
        );
    }
}
