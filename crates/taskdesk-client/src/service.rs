/*
[INPUT]:  User intents (load/save task, photos, comments, lookups), TaskGateway, TaskStore
[OUTPUT]: Dispatched TaskActions and user-facing notices
[POS]:    Orchestration layer - sequences remote calls and store updates
[UPDATE]: When adding task operations or changing failure/cleanup semantics
*/

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use taskdesk_adapter::{Photo, Result, Task, TaskFields, TaskId};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::gateway::TaskGateway;
use crate::notice::NoticePresenter;
use crate::photo::PhotoSource;
use crate::store::{TaskAction, TaskState, TaskStore};

pub const SAVE_TASK_FIRST: &str = "Please save the task first";
pub const TASK_NOT_FOUND: &str = "Task not found";
pub const ERROR_LOADING_TASK: &str = "Error loading task";
pub const ERROR_SAVING_TASK: &str = "Error saving task";
pub const ERROR_LOADING_PHOTOS: &str = "Error";
pub const ERROR_ADDING_PHOTO: &str = "Error adding photo";
pub const ERROR_READING_FILE: &str = "Error reading file";
pub const ERROR_LOADING_COMMENTS: &str = "Error loading comments";
pub const ERROR_ADDING_COMMENT: &str = "Error adding comment";
pub const ERROR_DELETING_COMMENT: &str = "Error deleting comment";
pub const ERROR_LOADING_CUSTOMERS: &str = "Error loading customers";
pub const ERROR_LOADING_USERS: &str = "Error loading users";

pub const DEFAULT_DISMISS_LABEL: &str = "Close";

/// Drives one task's state through the remote API.
///
/// Every mutation follows intent -> remote call -> authoritative reload; the
/// only local-only change is [`remove_task_photo`](Self::remove_task_photo).
/// Failures never escape: they are logged and shown as notices.
///
/// Once the service's cancellation token fires, operations stop before
/// their next remote call or dispatch and show nothing further.
#[derive(Debug, Clone)]
pub struct TaskService {
    store: TaskStore,
    snapshot: watch::Receiver<Arc<TaskState>>,
    gateway: Arc<dyn TaskGateway>,
    notices: Arc<dyn NoticePresenter>,
    dismiss_label: String,
    cancel: CancellationToken,
}

impl TaskService {
    pub fn new(
        store: TaskStore,
        gateway: Arc<dyn TaskGateway>,
        notices: Arc<dyn NoticePresenter>,
    ) -> Self {
        let snapshot = store.subscribe();
        Self {
            store,
            snapshot,
            gateway,
            notices,
            dismiss_label: DEFAULT_DISMISS_LABEL.to_string(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_dismiss_label(mut self, dismiss_label: impl Into<String>) -> Self {
        self.dismiss_label = dismiss_label.into();
        self
    }

    /// A handle whose operations stop once `cancel` fires.
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Latest snapshot the service has observed.
    pub fn snapshot(&self) -> Arc<TaskState> {
        self.snapshot.borrow().clone()
    }

    /// True when the current task has been persisted; shows a notice otherwise.
    pub fn validate(&self) -> bool {
        self.persisted_task_id().is_some()
    }

    pub async fn load_task(&self, id: &TaskId) {
        if id.is_placeholder() {
            self.dispatch(TaskAction::SetTask(Task::placeholder()));
            self.dispatch(TaskAction::SetIsLoading(false));
            return;
        }

        self.dispatch(TaskAction::SetIsLoading(true));
        match self.call("get_task", self.gateway.get_task(id)).await {
            Some(Ok(Some(task))) => {
                debug!(task_id = %id, "task loaded");
                self.dispatch(TaskAction::SetTask(task));
            }
            Some(Ok(None)) => {
                warn!(task_id = %id, "task not found");
                self.notify(TASK_NOT_FOUND);
            }
            Some(Err(err)) => {
                error!(task_id = %id, error = %err, "error loading task");
                self.notify(ERROR_LOADING_TASK);
            }
            None => {}
        }
        self.dispatch(TaskAction::SetIsLoading(false));
    }

    /// Create the task when it is still `"new"` (or nothing is loaded),
    /// otherwise update it; then reload whatever id is best known.
    pub async fn save_task(&self, fields: &TaskFields, user_id: &str) {
        self.dispatch(TaskAction::SetIsLoading(true));

        let current = self.current_task_id();
        let reload_id = match current {
            Some(id) if id.is_persisted() => {
                match self.call("save_task", self.gateway.save_task(&id, fields, user_id)).await {
                    Some(Ok(())) => info!(task_id = %id, "task saved"),
                    Some(Err(err)) => {
                        error!(task_id = %id, error = %err, "error saving task");
                        self.notify(ERROR_SAVING_TASK);
                    }
                    None => return,
                }
                id
            }
            _ => match self.call("create_task", self.gateway.create_task(fields, user_id)).await {
                Some(Ok(id)) => {
                    info!(task_id = %id, "task created");
                    id
                }
                Some(Err(err)) => {
                    error!(error = %err, "error creating task");
                    self.notify(ERROR_SAVING_TASK);
                    TaskId::placeholder()
                }
                None => return,
            },
        };

        self.load_task(&reload_id).await;
    }

    pub async fn load_task_photos(&self) {
        let Some(task_id) = self.persisted_task_id() else {
            return;
        };

        match self.call("get_task", self.gateway.get_task(&task_id)).await {
            Some(Ok(Some(task))) => self.dispatch(TaskAction::SetTaskPhotos(task.photos)),
            Some(Ok(None)) => {
                warn!(task_id = %task_id, "task not found while loading photos");
                self.notify(TASK_NOT_FOUND);
            }
            Some(Err(err)) => {
                error!(task_id = %task_id, error = %err, "error loading photos");
                self.notify(ERROR_LOADING_PHOTOS);
            }
            None => {}
        }
        self.dispatch(TaskAction::SetIsPhotosLoading(false));
    }

    /// Upload every photo concurrently, wait for all of them to settle, then
    /// reload. A failed photo only costs itself.
    pub async fn add_task_photos(&self, photos: &[PhotoSource]) {
        let Some(task_id) = self.persisted_task_id() else {
            return;
        };

        self.dispatch(TaskAction::SetIsPhotosLoading(true));
        let results = join_all(photos.iter().map(|photo| self.upload_photo(&task_id, photo))).await;
        let uploaded = results.iter().flatten().count();
        info!(
            task_id = %task_id,
            uploaded,
            failed = results.len() - uploaded,
            "photo uploads settled"
        );

        self.load_task_photos().await;
    }

    async fn upload_photo(&self, task_id: &TaskId, photo: &PhotoSource) -> Option<String> {
        let data_url = match photo.to_data_url().await {
            Ok(data_url) => data_url,
            Err(err) => {
                error!(photo = %photo.name(), error = %err, "error reading photo");
                self.notify(ERROR_READING_FILE);
                return None;
            }
        };

        match self.call("add_photo", self.gateway.add_photo(task_id, &data_url)).await? {
            Ok(photo_id) => {
                debug!(task_id = %task_id, photo_id = %photo_id, "photo uploaded");
                Some(photo_id)
            }
            Err(err) => {
                error!(task_id = %task_id, photo = %photo.name(), error = %err, "error adding photo");
                self.notify(ERROR_ADDING_PHOTO);
                None
            }
        }
    }

    /// Drop a photo from local state only; the server is not told.
    pub fn remove_task_photo(&self, photo: &Photo) {
        if !self.validate() {
            return;
        }
        self.dispatch(TaskAction::RemoveTaskPhoto(photo.clone()));
    }

    pub async fn load_task_comments(&self) {
        let Some(task_id) = self.persisted_task_id() else {
            return;
        };

        match self.call("get_task", self.gateway.get_task(&task_id)).await {
            Some(Ok(Some(task))) => self.dispatch(TaskAction::SetComments(task.comments)),
            Some(Ok(None)) => {
                warn!(task_id = %task_id, "task not found while loading comments");
                self.notify(TASK_NOT_FOUND);
            }
            Some(Err(err)) => {
                error!(task_id = %task_id, error = %err, "error loading comments");
                self.notify(ERROR_LOADING_COMMENTS);
            }
            None => {}
        }
        self.dispatch(TaskAction::SetIsCommentsLoading(false));
    }

    /// On failure the comments are not reloaded, so the loading flag stays set.
    pub async fn add_task_comment(&self, text: &str) {
        let Some(task_id) = self.persisted_task_id() else {
            return;
        };

        self.dispatch(TaskAction::SetIsCommentsLoading(true));
        match self.call("create_comment", self.gateway.create_comment(&task_id, text)).await {
            Some(Ok(comment_id)) => debug!(task_id = %task_id, comment_id = %comment_id, "comment added"),
            Some(Err(err)) => {
                error!(task_id = %task_id, error = %err, "error adding comment");
                self.notify(ERROR_ADDING_COMMENT);
                return;
            }
            None => return,
        }
        self.load_task_comments().await;
    }

    /// On failure the comments are not reloaded, so the loading flag stays set.
    pub async fn delete_task_comment(&self, comment_id: &str) {
        if !self.validate() {
            return;
        }

        self.dispatch(TaskAction::SetIsCommentsLoading(true));
        match self.call("delete_comment", self.gateway.delete_comment(comment_id)).await {
            Some(Ok(())) => debug!(comment_id, "comment deleted"),
            Some(Err(err)) => {
                error!(comment_id, error = %err, "error deleting comment");
                self.notify(ERROR_DELETING_COMMENT);
                return;
            }
            None => return,
        }
        self.load_task_comments().await;
    }

    pub async fn load_customers(&self) {
        self.dispatch(TaskAction::SetIsCustomersLoading(true));
        match self.call("get_customers", self.gateway.get_customers()).await {
            Some(Ok(customers)) => self.dispatch(TaskAction::SetCustomers(customers)),
            Some(Err(err)) => {
                error!(error = %err, "error loading customers");
                self.notify(ERROR_LOADING_CUSTOMERS);
            }
            None => {}
        }
        self.dispatch(TaskAction::SetIsCustomersLoading(false));
    }

    pub async fn load_users(&self) {
        self.dispatch(TaskAction::SetIsUsersLoading(true));
        match self.call("get_users", self.gateway.get_users()).await {
            Some(Ok(users)) => self.dispatch(TaskAction::SetUsers(users)),
            Some(Err(err)) => {
                error!(error = %err, "error loading users");
                self.notify(ERROR_LOADING_USERS);
            }
            None => {}
        }
        self.dispatch(TaskAction::SetIsUsersLoading(false));
    }

    fn current_task_id(&self) -> Option<TaskId> {
        self.snapshot.borrow().task_id().cloned()
    }

    fn persisted_task_id(&self) -> Option<TaskId> {
        match self.current_task_id() {
            Some(id) if id.is_persisted() => Some(id),
            _ => {
                self.notify(SAVE_TASK_FIRST);
                None
            }
        }
    }

    /// Run a remote call unless cancelled. `None` means the operation was
    /// cancelled before or while the call ran.
    async fn call<T>(&self, op: &'static str, call: impl Future<Output = Result<T>>) -> Option<Result<T>> {
        if self.cancel.is_cancelled() {
            debug!(op, "skipping remote call; operation cancelled");
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(op, "remote call abandoned; operation cancelled");
                None
            }
            result = call => Some(result),
        }
    }

    fn dispatch(&self, action: TaskAction) {
        if self.cancel.is_cancelled() {
            debug!(?action, "dropping dispatch; operation cancelled");
            return;
        }
        self.store.dispatch(action);
    }

    fn notify(&self, message: &str) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.notices.show(message, &self.dismiss_label);
    }
}
