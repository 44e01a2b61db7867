/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for taskdesk-adapter tests

use taskdesk_adapter::{ClientConfig, TaskdeskClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server
pub fn client_for(server: &MockServer) -> TaskdeskClient {
    TaskdeskClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init")
}

/// Random task id so tests never depend on each other's fixtures
pub fn unique_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
