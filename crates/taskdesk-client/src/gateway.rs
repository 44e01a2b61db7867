/*
[INPUT]:  Task ids, editable fields, encoded photos, comment text
[OUTPUT]: Remote task API results behind a mockable trait
[POS]:    Port - the orchestration layer's view of the task API
[UPDATE]: When the orchestration layer needs a new remote call
*/

use std::fmt::Debug;

use async_trait::async_trait;
use taskdesk_adapter::{Customer, Result, Task, TaskFields, TaskId, TaskdeskClient, User};

/// Remote operations the task service sequences.
#[async_trait]
pub trait TaskGateway: Send + Sync + Debug {
    /// `Ok(None)` when the task does not exist.
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>>;
    async fn create_task(&self, fields: &TaskFields, user_id: &str) -> Result<TaskId>;
    async fn save_task(&self, id: &TaskId, fields: &TaskFields, user_id: &str) -> Result<()>;
    async fn add_photo(&self, task_id: &TaskId, data_url: &str) -> Result<String>;
    async fn create_comment(&self, task_id: &TaskId, text: &str) -> Result<String>;
    async fn delete_comment(&self, comment_id: &str) -> Result<()>;
    async fn get_customers(&self) -> Result<Vec<Customer>>;
    async fn get_users(&self) -> Result<Vec<User>>;
}

#[async_trait]
impl TaskGateway for TaskdeskClient {
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        TaskdeskClient::get_task(self, id).await
    }

    async fn create_task(&self, fields: &TaskFields, user_id: &str) -> Result<TaskId> {
        TaskdeskClient::create_task(self, fields, user_id).await
    }

    async fn save_task(&self, id: &TaskId, fields: &TaskFields, user_id: &str) -> Result<()> {
        TaskdeskClient::save_task(self, id, fields, user_id).await
    }

    async fn add_photo(&self, task_id: &TaskId, data_url: &str) -> Result<String> {
        TaskdeskClient::add_photo(self, task_id, data_url).await
    }

    async fn create_comment(&self, task_id: &TaskId, text: &str) -> Result<String> {
        TaskdeskClient::create_comment(self, task_id, text).await
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        TaskdeskClient::delete_comment(self, comment_id).await
    }

    async fn get_customers(&self) -> Result<Vec<Customer>> {
        TaskdeskClient::get_customers(self).await
    }

    async fn get_users(&self) -> Result<Vec<User>> {
        TaskdeskClient::get_users(self).await
    }
}
