/*
[INPUT]:  Local SignalR-style hub over tokio-tungstenite
[OUTPUT]: End-to-end results for NotificationWaiter over NotificationSocket
[POS]:    Integration test layer - notification correlation
[UPDATE]: When hub protocol or waiter semantics change
*/

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use taskdesk_adapter::NotificationSocket;
use taskdesk_client::waiter::CONNECT_FAILED_NOTICE;
use taskdesk_client::{ChannelNotices, NotificationWaiter, WaitError};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Hub that completes the handshake, then sends `frames` once `release` fires.
async fn spawn_hub(frames: Vec<&'static str>) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (release, released) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("ws accept");
        ws.next().await.expect("handshake frame").expect("handshake ok");
        ws.send(Message::Text("{}\u{1e}".into())).await.expect("reply");

        let _ = released.await;
        for frame in frames {
            ws.send(Message::Text(frame.into())).await.expect("send frame");
        }
        // Hold the connection open until the client goes away.
        while let Some(Ok(_)) = ws.next().await {}
    });

    (format!("ws://{addr}"), release)
}

async fn until_pending(waiter: &NotificationWaiter, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while waiter.pending_count() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("waiter registered");
}

#[tokio::test]
async fn test_wait_resolves_only_for_matching_id() {
    let (url, release) = spawn_hub(vec![
        "{\"type\":1,\"target\":\"NotifyTaskRequestId\",\"arguments\":[\"r2\",\"t9\"]}\u{1e}",
        "{\"type\":6}\u{1e}{\"type\":1,\"target\":\"NotifyTaskRequestId\",\"arguments\":[\"r1\",\"t7\"]}\u{1e}",
    ])
    .await;
    let (notices, _rx) = ChannelNotices::new();
    let waiter = NotificationWaiter::new(Arc::new(NotificationSocket::new(url)), Arc::new(notices))
        .with_timeout(Some(Duration::from_secs(5)));

    let pending = tokio::spawn({
        let waiter = waiter.clone();
        async move { waiter.wait_for_id("r1").await }
    });
    until_pending(&waiter, 1).await;
    release.send(()).expect("hub alive");

    let result = pending.await.expect("join");
    assert_eq!(result, Ok("t7".to_string()));
    assert_eq!(waiter.pending_count(), 0);
    waiter.shutdown();
}

#[tokio::test]
async fn test_wait_times_out_and_forgets_entry() {
    let (url, _release) = spawn_hub(Vec::new()).await;
    let (notices, _rx) = ChannelNotices::new();
    let waiter = NotificationWaiter::new(Arc::new(NotificationSocket::new(url)), Arc::new(notices))
        .with_timeout(Some(Duration::from_millis(100)));

    let result = waiter.wait_for_id("r1").await;

    assert!(matches!(result, Err(WaitError::TimedOut { .. })));
    assert_eq!(waiter.pending_count(), 0);
    waiter.shutdown();
}

#[tokio::test]
async fn test_unreachable_hub_shows_notice() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let (notices, mut rx) = ChannelNotices::new();
    let waiter = NotificationWaiter::new(
        Arc::new(NotificationSocket::new(format!("ws://{addr}"))),
        Arc::new(notices),
    )
    .with_timeout(Some(Duration::from_millis(50)));

    let result = waiter.wait_for_id("r1").await;

    assert!(result.is_err());
    assert_eq!(rx.try_recv().expect("notice").message, CONNECT_FAILED_NOTICE);
}

#[tokio::test]
async fn test_silent_hub_does_not_outlast_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        // Accept the TCP connection but never answer the upgrade.
        let (_stream, _) = listener.accept().await.expect("accept");
        std::future::pending::<()>().await;
    });

    let (notices, _rx) = ChannelNotices::new();
    let waiter = NotificationWaiter::new(
        Arc::new(NotificationSocket::new(format!("ws://{addr}"))),
        Arc::new(notices),
    )
    .with_timeout(Some(Duration::from_millis(100)));

    let result = tokio::time::timeout(Duration::from_secs(3), waiter.wait_for_id("r1"))
        .await
        .expect("waiter gave up on its own");

    assert!(matches!(result, Err(WaitError::TimedOut { .. })));
    assert_eq!(waiter.pending_count(), 0);
}
