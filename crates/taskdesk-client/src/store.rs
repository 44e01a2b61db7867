/*
[INPUT]:  TaskAction messages dispatched by the orchestration layer
[OUTPUT]: Immutable TaskState snapshots published via `watch`
[POS]:    State layer - single-writer task store with subscriptions
[UPDATE]: When adding actions or snapshot fields
*/

use std::sync::Arc;

use serde::Serialize;
use taskdesk_adapter::{Comment, Customer, Photo, Task, TaskId, User};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Current projection of task-related state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    pub task: Option<Task>,
    pub customers: Vec<Customer>,
    pub users: Vec<User>,
    pub is_loading: bool,
    pub is_photos_loading: bool,
    pub is_comments_loading: bool,
    pub is_customers_loading: bool,
    pub is_users_loading: bool,
}

/// State change messages. The store is the only place they are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    SetTask(Task),
    SetIsLoading(bool),
    SetTaskPhotos(Vec<Photo>),
    RemoveTaskPhoto(Photo),
    SetIsPhotosLoading(bool),
    SetComments(Vec<Comment>),
    SetIsCommentsLoading(bool),
    SetCustomers(Vec<Customer>),
    SetIsCustomersLoading(bool),
    SetUsers(Vec<User>),
    SetIsUsersLoading(bool),
}

impl TaskState {
    /// Apply one action in place.
    pub fn apply(&mut self, action: TaskAction) {
        match action {
            TaskAction::SetTask(task) => self.task = Some(task),
            TaskAction::SetIsLoading(value) => self.is_loading = value,
            TaskAction::SetTaskPhotos(photos) => match self.task.as_mut() {
                Some(task) => task.photos = photos,
                None => warn!("photos dispatched without a task; ignored"),
            },
            TaskAction::RemoveTaskPhoto(photo) => {
                if let Some(task) = self.task.as_mut() {
                    task.photos.retain(|existing| existing.id != photo.id);
                }
            }
            TaskAction::SetIsPhotosLoading(value) => self.is_photos_loading = value,
            TaskAction::SetComments(comments) => match self.task.as_mut() {
                Some(task) => task.comments = comments,
                None => warn!("comments dispatched without a task; ignored"),
            },
            TaskAction::SetIsCommentsLoading(value) => self.is_comments_loading = value,
            TaskAction::SetCustomers(customers) => self.customers = customers,
            TaskAction::SetIsCustomersLoading(value) => self.is_customers_loading = value,
            TaskAction::SetUsers(users) => self.users = users,
            TaskAction::SetIsUsersLoading(value) => self.is_users_loading = value,
        }
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task.as_ref().map(|task| &task.id)
    }
}

/// Single-writer store. Cloning shares the same underlying state.
#[derive(Debug, Clone)]
pub struct TaskStore {
    state: Arc<watch::Sender<Arc<TaskState>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_state(TaskState::default())
    }

    pub fn with_state(state: TaskState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self {
            state: Arc::new(tx),
        }
    }

    /// Apply an action and publish the resulting snapshot to every subscriber.
    pub fn dispatch(&self, action: TaskAction) {
        debug!(action = action_name(&action), "dispatch");
        self.state.send_modify(|current| {
            let mut next = (**current).clone();
            next.apply(action);
            *current = Arc::new(next);
        });
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> Arc<TaskState> {
        self.state.borrow().clone()
    }

    /// Receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<TaskState>> {
        self.state.subscribe()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

fn action_name(action: &TaskAction) -> &'static str {
    match action {
        TaskAction::SetTask(_) => "set_task",
        TaskAction::SetIsLoading(_) => "set_is_loading",
        TaskAction::SetTaskPhotos(_) => "set_task_photos",
        TaskAction::RemoveTaskPhoto(_) => "remove_task_photo",
        TaskAction::SetIsPhotosLoading(_) => "set_is_photos_loading",
        TaskAction::SetComments(_) => "set_comments",
        TaskAction::SetIsCommentsLoading(_) => "set_is_comments_loading",
        TaskAction::SetCustomers(_) => "set_customers",
        TaskAction::SetIsCustomersLoading(_) => "set_is_customers_loading",
        TaskAction::SetUsers(_) => "set_users",
        TaskAction::SetIsUsersLoading(_) => "set_is_users_loading",
    }
}
