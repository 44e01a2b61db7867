//! In-memory fakes shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use taskdesk_adapter::{
    Comment, Customer, Photo, Result, Task, TaskFields, TaskId, TaskRequestCompleted,
    TaskdeskError, User,
};
use tokio::sync::mpsc;

use crate::gateway::TaskGateway;
use crate::notice::NoticePresenter;
use crate::waiter::HubConnector;

/// Keeps every notice it is asked to show.
#[derive(Debug, Default)]
pub struct RecordingNotices {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotices {
    pub fn messages(&self) -> Vec<String> {
        self.shown
            .lock()
            .expect("notices lock")
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub fn dismiss_labels(&self) -> Vec<String> {
        self.shown
            .lock()
            .expect("notices lock")
            .iter()
            .map(|(_, label)| label.clone())
            .collect()
    }
}

impl NoticePresenter for RecordingNotices {
    fn show(&self, message: &str, dismiss_label: &str) {
        self.shown
            .lock()
            .expect("notices lock")
            .push((message.to_string(), dismiss_label.to_string()));
    }
}

/// Task backend kept in memory. Records each call as `"op"` or `"op:<id>"`.
#[derive(Debug, Default)]
pub struct FakeGateway {
    tasks: Mutex<HashMap<TaskId, Task>>,
    customers: Vec<Customer>,
    users: Vec<User>,
    calls: Mutex<Vec<String>>,
    failing_ops: Mutex<HashSet<&'static str>>,
    failing_photos: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
}

impl FakeGateway {
    pub fn with_task(task: Task) -> Self {
        let gateway = Self::default();
        gateway.insert(task);
        gateway
    }

    pub fn with_directory(customers: Vec<Customer>, users: Vec<User>) -> Self {
        Self {
            customers,
            users,
            ..Self::default()
        }
    }

    pub fn insert(&self, task: Task) {
        self.tasks
            .lock()
            .expect("tasks lock")
            .insert(task.id.clone(), task);
    }

    pub fn stored(&self, id: &str) -> Option<Task> {
        self.tasks
            .lock()
            .expect("tasks lock")
            .get(&TaskId::new(id))
            .cloned()
    }

    /// Make every call of `op` fail with a server error.
    pub fn fail(&self, op: &'static str) {
        self.failing_ops.lock().expect("ops lock").insert(op);
    }

    /// Make uploads of this exact payload fail.
    pub fn fail_photo(&self, data_url: impl Into<String>) {
        self.failing_photos
            .lock()
            .expect("photos lock")
            .insert(data_url.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, op: &'static str, id: Option<&str>) -> Result<()> {
        let entry = match id {
            Some(id) => format!("{op}:{id}"),
            None => op.to_string(),
        };
        self.calls.lock().expect("calls lock").push(entry);
        if self.failing_ops.lock().expect("ops lock").contains(op) {
            return Err(server_error(op));
        }
        Ok(())
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

fn server_error(op: &str) -> TaskdeskError {
    TaskdeskError::Api {
        status: 500,
        message: format!("{op} failed"),
    }
}

#[async_trait]
impl TaskGateway for FakeGateway {
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        self.record("get_task", Some(id.as_str()))?;
        Ok(self.tasks.lock().expect("tasks lock").get(id).cloned())
    }

    async fn create_task(&self, fields: &TaskFields, _user_id: &str) -> Result<TaskId> {
        self.record("create_task", None)?;
        let id = TaskId::new(self.fresh_id("t"));
        self.insert(Task {
            id: id.clone(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            location: fields.location.clone(),
            status: fields.status.clone(),
            customer_id: fields.customer_id.clone(),
            photos: Vec::new(),
            comments: Vec::new(),
        });
        Ok(id)
    }

    async fn save_task(&self, id: &TaskId, fields: &TaskFields, _user_id: &str) -> Result<()> {
        self.record("save_task", Some(id.as_str()))?;
        let mut tasks = self.tasks.lock().expect("tasks lock");
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| TaskdeskError::NotFound(id.to_string()))?;
        task.title = fields.title.clone();
        task.description = fields.description.clone();
        task.location = fields.location.clone();
        task.status = fields.status.clone();
        task.customer_id = fields.customer_id.clone();
        Ok(())
    }

    async fn add_photo(&self, task_id: &TaskId, data_url: &str) -> Result<String> {
        self.record("add_photo", Some(task_id.as_str()))?;
        if self.failing_photos.lock().expect("photos lock").contains(data_url) {
            return Err(server_error("add_photo"));
        }
        let photo_id = self.fresh_id("p");
        let mut tasks = self.tasks.lock().expect("tasks lock");
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskdeskError::NotFound(task_id.to_string()))?;
        task.photos.push(Photo {
            id: photo_id.clone(),
            task_id: task_id.to_string(),
            url: data_url.to_string(),
        });
        Ok(photo_id)
    }

    async fn create_comment(&self, task_id: &TaskId, text: &str) -> Result<String> {
        self.record("create_comment", Some(task_id.as_str()))?;
        let comment_id = self.fresh_id("m");
        let mut tasks = self.tasks.lock().expect("tasks lock");
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskdeskError::NotFound(task_id.to_string()))?;
        task.comments.push(Comment {
            id: comment_id.clone(),
            task_id: task_id.to_string(),
            text: text.to_string(),
            author: None,
            created_at: None,
        });
        Ok(comment_id)
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        self.record("delete_comment", Some(comment_id))?;
        for task in self.tasks.lock().expect("tasks lock").values_mut() {
            task.comments.retain(|comment| comment.id != comment_id);
        }
        Ok(())
    }

    async fn get_customers(&self) -> Result<Vec<Customer>> {
        self.record("get_customers", None)?;
        Ok(self.customers.clone())
    }

    async fn get_users(&self) -> Result<Vec<User>> {
        self.record("get_users", None)?;
        Ok(self.users.clone())
    }
}

/// Hub connector backed by an in-process channel.
#[derive(Debug, Default)]
pub struct FakeConnector {
    sender: tokio::sync::Mutex<Option<mpsc::Sender<TaskRequestCompleted>>>,
    connects: AtomicUsize,
    failing: AtomicBool,
    hanging: AtomicBool,
}

impl FakeConnector {
    pub fn failing() -> Self {
        let connector = Self::default();
        connector.failing.store(true, Ordering::Relaxed);
        connector
    }

    /// A hub that accepts the connection but never completes it.
    pub fn hanging() -> Self {
        let connector = Self::default();
        connector.hanging.store(true, Ordering::Relaxed);
        connector
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::Relaxed)
    }

    pub async fn emit(&self, id: &str, result_id: &str) {
        let sender = self.sender.lock().await.clone().expect("connected");
        sender
            .send(TaskRequestCompleted {
                id: id.to_string(),
                result_id: result_id.to_string(),
            })
            .await
            .expect("dispatch loop alive");
    }

    /// Close the current connection.
    pub async fn disconnect(&self) {
        self.sender.lock().await.take();
    }
}

#[async_trait]
impl HubConnector for FakeConnector {
    async fn connect(&self) -> Result<mpsc::Receiver<TaskRequestCompleted>> {
        self.connects.fetch_add(1, Ordering::Relaxed);
        if self.hanging.load(Ordering::Relaxed) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::Relaxed) {
            return Err(TaskdeskError::WebSocket("connection refused".to_string()));
        }
        let (tx, rx) = mpsc::channel(16);
        *self.sender.lock().await = Some(tx);
        Ok(rx)
    }
}
