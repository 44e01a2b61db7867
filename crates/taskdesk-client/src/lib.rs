/*
[INPUT]:  Public API exports for taskdesk-client crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod gateway;
pub mod notice;
pub mod photo;
pub mod service;
pub mod store;
pub mod waiter;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use crate::config::ClientSettings;
pub use gateway::TaskGateway;
pub use notice::{ChannelNotices, Notice, NoticePresenter, TracingNotices};
pub use photo::{PhotoError, PhotoSource};
pub use service::TaskService;
pub use store::{TaskAction, TaskState, TaskStore};
pub use waiter::{HubConnector, NotificationWaiter, WaitError};
