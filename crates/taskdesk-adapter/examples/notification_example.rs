/*
[INPUT]:  Notification hub WebSocket URL
[OUTPUT]: Printed task-request completion events
[POS]:    Examples - hub stream handling
[UPDATE]: When hub events change
*/

use taskdesk_adapter::*;

/// Example: listen to backend job completions
///
/// Usage: cargo run --example notification_example -- ws://localhost:5001/hubs/tasks
#[tokio::main]
async fn main() {
    println!("=== Taskdesk Notification Example ===\n");

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://localhost:5001/hubs/tasks".to_string());
    let socket = NotificationSocket::new(url);

    let mut events = match socket.connect().await {
        Ok(rx) => rx,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", socket.url(), e);
            return;
        }
    };
    println!("✓ Connected to {}\n", socket.url());

    while let Some(event) = events.recv().await {
        println!("request {} finished -> {}", event.id, event.result_id);
    }

    println!("\n✓ Hub closed the connection");
}
