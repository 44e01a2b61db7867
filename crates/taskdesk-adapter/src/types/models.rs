/*
[INPUT]:  Task API schema (camelCase JSON)
[OUTPUT]: Task, Photo, Comment, Customer, User and the TaskId sentinel type
[POS]:    Data layer - domain records shared by gateway and store
[UPDATE]: When API schema changes or new types added
*/

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier used by a task that has not been persisted yet.
pub const NEW_TASK_ID: &str = "new";

/// Status assigned to freshly initialized tasks.
pub const DEFAULT_TASK_STATUS: &str = "New";

/// Task identifier. The value `"new"` marks a task that only exists locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `"new"` sentinel.
    pub fn placeholder() -> Self {
        Self(NEW_TASK_ID.to_string())
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == NEW_TASK_ID
    }

    /// True when the id refers to a task the server knows about.
    pub fn is_persisted(&self) -> bool {
        !self.0.is_empty() && !self.is_placeholder()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Task {
    /// Empty local task carrying the `"new"` sentinel id.
    pub fn placeholder() -> Self {
        Self {
            id: TaskId::placeholder(),
            title: String::new(),
            description: String::new(),
            location: String::new(),
            status: default_status(),
            customer_id: String::new(),
            photos: Vec::new(),
            comments: Vec::new(),
        }
    }
}

fn default_status() -> String {
    DEFAULT_TASK_STATUS.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    #[serde(default)]
    pub task_id: String,
    /// Content reference as served by the API (URL or data URL).
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
