/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Taskdesk adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from http
pub use http::{ClientConfig, Credentials, Result, TaskdeskClient, TaskdeskError, DEFAULT_BASE_URL};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{NotificationSocket, TaskRequestCompleted};
