/*
[INPUT]:  Task ids, editable task fields, encoded photo payloads
[OUTPUT]: Task records and ids of created resources
[POS]:    HTTP layer - task and photo endpoints
[UPDATE]: When adding new task endpoints or changing response format
*/

use crate::http::{Result, TaskdeskClient};
use crate::types::{AddPhotoRequest, CreatedResponse, SaveTaskRequest, Task, TaskFields, TaskId};
use reqwest::Method;

impl TaskdeskClient {
    /// Fetch a single task with its photos and comments.
    ///
    /// GET /api/tasks/{id}
    ///
    /// Returns `Ok(None)` when the server has no such task.
    pub async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        let builder = self.request(Method::GET, &["api", "tasks", id.as_str()])?;
        match self.send_json(builder).await {
            Ok(task) => Ok(Some(task)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Create a task and return its new id
    ///
    /// POST /api/tasks
    pub async fn create_task(&self, fields: &TaskFields, user_id: &str) -> Result<TaskId> {
        let body = SaveTaskRequest { fields, user_id };
        let builder = self.request(Method::POST, &["api", "tasks"])?.json(&body);
        let created: CreatedResponse = self.send_json(builder).await?;
        Ok(TaskId::new(created.id))
    }

    /// Overwrite the editable fields of an existing task
    ///
    /// PUT /api/tasks/{id}
    pub async fn save_task(&self, id: &TaskId, fields: &TaskFields, user_id: &str) -> Result<()> {
        let body = SaveTaskRequest { fields, user_id };
        let builder = self
            .request(Method::PUT, &["api", "tasks", id.as_str()])?
            .json(&body);
        self.send_empty(builder).await
    }

    /// Attach a photo given as a base64 data URL, returning the photo id
    ///
    /// POST /api/tasks/{id}/photos
    pub async fn add_photo(&self, task_id: &TaskId, data_url: &str) -> Result<String> {
        let body = AddPhotoRequest {
            photo: data_url.to_string(),
        };
        let builder = self
            .request(Method::POST, &["api", "tasks", task_id.as_str(), "photos"])?
            .json(&body);
        let created: CreatedResponse = self.send_json(builder).await?;
        Ok(created.id)
    }
}
