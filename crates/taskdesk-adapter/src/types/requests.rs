/*
[INPUT]:  Editable task fields and sub-resource payloads
[OUTPUT]: Typed request bodies for task, photo and comment endpoints
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::DEFAULT_TASK_STATUS;

/// Fields a user edits on the task form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: String,
    pub customer_id: String,
}

impl Default for TaskFields {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            status: DEFAULT_TASK_STATUS.to_string(),
            customer_id: String::new(),
        }
    }
}

/// Body for `POST /api/tasks` and `PUT /api/tasks/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTaskRequest<'a> {
    #[serde(flatten)]
    pub fields: &'a TaskFields,
    pub user_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPhotoRequest {
    /// Base64 data URL (`data:<mime>;base64,<payload>`).
    pub photo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}
