/*
[INPUT]:  Correlation ids of queued backend requests + a hub connector
[OUTPUT]: The result id each request produced, once the hub reports it
[POS]:    Notification layer - one-shot waits over a shared hub connection
[UPDATE]: When changing connection, timeout or cancellation semantics
*/

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use taskdesk_adapter::{NotificationSocket, TaskRequestCompleted};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::notice::NoticePresenter;
use crate::service::DEFAULT_DISMISS_LABEL;

pub const CONNECT_FAILED_NOTICE: &str = "Could not connect to notification service";
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Opens the hub connection and hands back its completion events.
#[async_trait]
pub trait HubConnector: Send + Sync + Debug {
    async fn connect(&self) -> taskdesk_adapter::Result<mpsc::Receiver<TaskRequestCompleted>>;
}

#[async_trait]
impl HubConnector for NotificationSocket {
    async fn connect(&self) -> taskdesk_adapter::Result<mpsc::Receiver<TaskRequestCompleted>> {
        NotificationSocket::connect(self).await
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError {
    #[error("no completion for request {correlation_id} within {timeout:?}")]
    TimedOut {
        correlation_id: String,
        timeout: Duration,
    },
    #[error("wait cancelled")]
    Cancelled,
    #[error("notification hub disconnected")]
    Disconnected,
}

#[derive(Debug, Default)]
struct Pending {
    /// Set by the dispatch loop when its connection ends.
    closed: bool,
    waiters: HashMap<String, Vec<(u64, oneshot::Sender<String>)>>,
}

/// Resolves correlation ids to result ids as hub completions arrive.
///
/// Holds one entry per correlation id still being waited on; entries leave
/// the map when their completion is dispatched or every waiter gave up.
#[derive(Debug, Clone)]
pub struct NotificationWaiter {
    connector: Arc<dyn HubConnector>,
    notices: Arc<dyn NoticePresenter>,
    dismiss_label: String,
    timeout: Option<Duration>,
    dispatcher: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
    pending: Arc<Mutex<Pending>>,
    next_waiter: Arc<AtomicU64>,
    shutdown: CancellationToken,
}

impl NotificationWaiter {
    pub fn new(connector: Arc<dyn HubConnector>, notices: Arc<dyn NoticePresenter>) -> Self {
        Self {
            connector,
            notices,
            dismiss_label: DEFAULT_DISMISS_LABEL.to_string(),
            timeout: Some(DEFAULT_WAIT_TIMEOUT),
            dispatcher: Arc::new(tokio::sync::Mutex::new(None)),
            pending: Arc::new(Mutex::new(Pending::default())),
            next_waiter: Arc::new(AtomicU64::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    /// `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_dismiss_label(mut self, dismiss_label: impl Into<String>) -> Self {
        self.dismiss_label = dismiss_label.into();
        self
    }

    /// Correlation ids currently being waited on.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).waiters.len()
    }

    /// Wait for the completion of `correlation_id`.
    pub async fn wait_for_id(&self, correlation_id: &str) -> Result<String, WaitError> {
        let shutdown = self.shutdown.clone();
        self.wait_for_id_until(correlation_id, &shutdown).await
    }

    /// Like [`wait_for_id`](Self::wait_for_id), but also gives up when `cancel` fires.
    ///
    /// The timeout and both cancellation sources cover the connect phase too.
    pub async fn wait_for_id_until(
        &self,
        correlation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, WaitError> {
        let mut registered = None;
        let wait = self.connect_and_receive(correlation_id, &mut registered);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(WaitError::Cancelled),
            _ = self.shutdown.cancelled() => Err(WaitError::Cancelled),
            result = within(self.timeout, correlation_id, wait) => result,
        };

        match &outcome {
            Ok(result_id) => debug!(correlation_id, result_id = %result_id, "request completed"),
            Err(err) => {
                if let Some(waiter_id) = registered {
                    self.unregister(correlation_id, waiter_id);
                }
                warn!(correlation_id, error = %err, "stopped waiting for request");
            }
        }
        outcome
    }

    /// Stop the dispatch loop and release every waiter.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn connect_and_receive(
        &self,
        correlation_id: &str,
        registered: &mut Option<u64>,
    ) -> Result<String, WaitError> {
        self.ensure_connected().await;
        let (waiter_id, rx) = self.register(correlation_id)?;
        *registered = Some(waiter_id);
        debug!(correlation_id, "waiting for request completion");
        rx.await.map_err(|_| WaitError::Disconnected)
    }

    async fn ensure_connected(&self) {
        let mut dispatcher = self.dispatcher.lock().await;
        {
            let mut pending = lock(&self.pending);
            let running = dispatcher.as_ref().is_some_and(|handle| !handle.is_finished());
            if running && !pending.closed {
                return;
            }
            pending.closed = false;
        }

        match self.connector.connect().await {
            Ok(events) => {
                info!("notification waiter connected");
                let pending = self.pending.clone();
                let shutdown = self.shutdown.clone();
                *dispatcher = Some(tokio::spawn(dispatch_loop(pending, events, shutdown)));
            }
            Err(err) => {
                error!(error = %err, "error establishing notification connection");
                self.notices.show(CONNECT_FAILED_NOTICE, &self.dismiss_label);
            }
        }
    }

    fn register(&self, correlation_id: &str) -> Result<(u64, oneshot::Receiver<String>), WaitError> {
        let mut pending = lock(&self.pending);
        if pending.closed {
            return Err(WaitError::Disconnected);
        }
        let waiter_id = self.next_waiter.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        pending
            .waiters
            .entry(correlation_id.to_string())
            .or_default()
            .push((waiter_id, tx));
        Ok((waiter_id, rx))
    }

    fn unregister(&self, correlation_id: &str, waiter_id: u64) {
        let mut pending = lock(&self.pending);
        if let Some(waiters) = pending.waiters.get_mut(correlation_id) {
            waiters.retain(|(id, _)| *id != waiter_id);
            if waiters.is_empty() {
                pending.waiters.remove(correlation_id);
            }
        }
    }
}

async fn within(
    timeout: Option<Duration>,
    correlation_id: &str,
    wait: impl Future<Output = Result<String, WaitError>>,
) -> Result<String, WaitError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| WaitError::TimedOut {
                correlation_id: correlation_id.to_string(),
                timeout: limit,
            })?,
        None => wait.await,
    }
}

async fn dispatch_loop(
    pending: Arc<Mutex<Pending>>,
    mut events: mpsc::Receiver<TaskRequestCompleted>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let waiters = lock(&pending).waiters.remove(&event.id);
        match waiters {
            Some(waiters) => {
                for (_, tx) in waiters {
                    let _ = tx.send(event.result_id.clone());
                }
            }
            None => debug!(correlation_id = %event.id, "completion with no waiter"),
        }
    }

    // Dropping the senders wakes every remaining waiter with `Disconnected`.
    let mut pending = lock(&pending);
    pending.closed = true;
    let abandoned = std::mem::take(&mut pending.waiters);
    if !abandoned.is_empty() {
        warn!(pending = abandoned.len(), "notification connection closed with waiters outstanding");
    }
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
