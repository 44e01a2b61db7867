/*
[INPUT]:  Notification hub URL
[OUTPUT]: Stream of task-request completion events
[POS]:    WebSocket layer - real-time backend job notifications
[UPDATE]: When adding new hub events or changing connection logic
*/

pub mod client;
pub mod message;

pub use client::NotificationSocket;
pub use message::{HubFrame, NOTIFY_TASK_REQUEST_ID, TaskRequestCompleted};
