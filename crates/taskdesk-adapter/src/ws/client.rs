/*
[INPUT]:  Notification hub WebSocket URL
[OUTPUT]: TaskRequestCompleted events via an mpsc channel
[POS]:    WebSocket layer - hub connection, handshake, keep-alive and read loop
[UPDATE]: When adding new hub events or changing connection logic
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::message::{
    HubFrame, TaskRequestCompleted, handshake_request, parse_frame, parse_handshake_response,
    ping_frame, split_frames,
};
use crate::http::{Result, TaskdeskError};

const EVENT_CHANNEL_CAPACITY: usize = 100;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// WebSocket client for the notification hub
#[derive(Debug, Clone)]
pub struct NotificationSocket {
    url: String,
    keep_alive: Duration,
}

impl NotificationSocket {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            keep_alive: KEEP_ALIVE_INTERVAL,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the socket, complete the hub handshake and start reading.
    ///
    /// The returned receiver yields every completion event until the
    /// connection closes, at which point it reports `None`.
    pub async fn connect(&self) -> Result<mpsc::Receiver<TaskRequestCompleted>> {
        let (ws_stream, _response) =
            tokio::time::timeout(CONNECT_TIMEOUT, connect_async(self.url.as_str()))
                .await
                .map_err(|_| TaskdeskError::Timeout {
                    duration: CONNECT_TIMEOUT.as_secs(),
                })?
                .map_err(|err| TaskdeskError::WebSocket(err.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        write
            .send(WsMessage::Text(handshake_request().into()))
            .await
            .map_err(|err| TaskdeskError::WebSocket(err.to_string()))?;

        let reply = tokio::time::timeout(HANDSHAKE_TIMEOUT, read.next())
            .await
            .map_err(|_| TaskdeskError::Timeout {
                duration: HANDSHAKE_TIMEOUT.as_secs(),
            })?;
        let batched = match reply {
            Some(Ok(WsMessage::Text(text))) => parse_handshake_response(text.as_str())?.to_string(),
            Some(Ok(other)) => {
                return Err(TaskdeskError::Protocol(format!(
                    "unexpected handshake reply: {other:?}"
                )));
            }
            Some(Err(err)) => return Err(TaskdeskError::WebSocket(err.to_string())),
            None => {
                return Err(TaskdeskError::WebSocket(
                    "connection closed during handshake".to_string(),
                ));
            }
        };
        info!(url = %self.url, "notification hub connected");

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let url = self.url.clone();
        let mut keep_alive = tokio::time::interval(self.keep_alive);
        keep_alive.reset();

        tokio::spawn(async move {
            if !batched.is_empty() && !forward_frames(&batched, &event_tx).await {
                let _ = write.send(WsMessage::Close(None)).await;
                info!(url = %url, "notification hub disconnected");
                return;
            }
            loop {
                tokio::select! {
                    _ = event_tx.closed() => {
                        debug!(url = %url, "event receiver dropped; closing hub connection");
                        let _ = write.send(WsMessage::Close(None)).await;
                        break;
                    }
                    _ = keep_alive.tick() => {
                        if write.send(WsMessage::Text(ping_frame().into())).await.is_err() {
                            break;
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Text(text))) => {
                                if !forward_frames(text.as_str(), &event_tx).await {
                                    let _ = write.send(WsMessage::Close(None)).await;
                                    break;
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                warn!(error = %err, "notification hub read failed");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }
            info!(url = %url, "notification hub disconnected");
        });

        Ok(event_rx)
    }
}

/// Forward every completion in `text`. Returns false once the read loop
/// should stop (hub close frame, or nobody listening).
async fn forward_frames(text: &str, event_tx: &mpsc::Sender<TaskRequestCompleted>) -> bool {
    for raw in split_frames(text) {
        let frame = match parse_frame(raw) {
            Ok(frame) => frame,
            Err(err) => {
                log_parse_fail_once(&err, raw);
                continue;
            }
        };

        match &frame {
            HubFrame::Close { error } => {
                info!(error = ?error, "notification hub sent close");
                return false;
            }
            HubFrame::Ping | HubFrame::Other(_) => continue,
            HubFrame::Invocation { target, .. } => {
                let Some(event) = TaskRequestCompleted::from_frame(&frame) else {
                    debug!(target = %target, "ignoring hub invocation");
                    continue;
                };
                debug!(id = %event.id, result_id = %event.result_id, "task request completed");
                if event_tx.send(event).await.is_err() {
                    return false;
                }
            }
        }
    }
    true
}

fn log_parse_fail_once(err: &TaskdeskError, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "hub frame parse failed"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            message = %preview,
            "hub frame parse failed"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forward_frames_skips_noise() {
        let (tx, mut rx) = mpsc::channel(4);
        let text = "not json\u{1e}{\"type\":3,\"invocationId\":\"1\"}\u{1e}{\"type\":1,\"target\":\"NotifyTaskRequestId\",\"arguments\":[\"r2\",\"t9\"]}\u{1e}";

        assert!(forward_frames(text, &tx).await);
        let event = rx.recv().await.expect("event forwarded");
        assert_eq!(event.id, "r2");
        assert_eq!(event.result_id, "t9");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_forward_frames_stops_on_close() {
        let (tx, _rx) = mpsc::channel(4);
        assert!(!forward_frames("{\"type\":7}\u{1e}", &tx).await);
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let value = "ééé";
        assert_eq!(truncate_for_log(value, 3), "é...");
        assert_eq!(truncate_for_log("short", 10), "short");
    }
}
