/*
[INPUT]:  Task id + comment text, or a comment id
[OUTPUT]: Created comment ids and delete confirmation
[POS]:    HTTP layer - comment endpoints
[UPDATE]: When adding new comment endpoints or changing comment flow
*/

use crate::http::{Result, TaskdeskClient};
use crate::types::{CreateCommentRequest, CreatedResponse, TaskId};
use reqwest::Method;

impl TaskdeskClient {
    /// Create a comment on a task
    ///
    /// POST /api/tasks/{id}/comments
    pub async fn create_comment(&self, task_id: &TaskId, text: &str) -> Result<String> {
        let body = CreateCommentRequest {
            text: text.to_string(),
        };
        let builder = self
            .request(Method::POST, &["api", "tasks", task_id.as_str(), "comments"])?
            .json(&body);
        let created: CreatedResponse = self.send_json(builder).await?;
        Ok(created.id)
    }

    /// Delete a comment
    ///
    /// DELETE /api/comments/{id}
    pub async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &["api", "comments", comment_id])?;
        self.send_empty(builder).await
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{ClientConfig, TaskdeskClient, TaskdeskError};
    use crate::types::TaskId;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_comment() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("POST"))
            .and(path("/api/tasks/t-1/comments"))
            .and(body_json(serde_json::json!({ "text": "On my way" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "m-3" })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            TaskdeskClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        let id = client
            .create_comment(&TaskId::new("t-1"), "On my way")
            .await
            .expect("create_comment failed");
        assert_eq!(id, "m-3");
    }

    #[tokio::test]
    async fn test_delete_comment_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/comments/m-3"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client =
            TaskdeskClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        let err = client
            .delete_comment("m-3")
            .await
            .expect_err("delete should fail");
        assert!(matches!(err, TaskdeskError::Api { status: 500, ref message } if message == "boom"));
    }
}
