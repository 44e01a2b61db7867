/*
[INPUT]:  Optional bearer token
[OUTPUT]: Customer and user collections for task assignment
[POS]:    HTTP layer - lookup endpoints
[UPDATE]: When adding new lookup endpoints or changing query parameters
*/

use crate::http::{Result, TaskdeskClient};
use crate::types::{Customer, User};
use reqwest::Method;

impl TaskdeskClient {
    /// List customers
    ///
    /// GET /api/customers
    pub async fn get_customers(&self) -> Result<Vec<Customer>> {
        let builder = self.request(Method::GET, &["api", "customers"])?;
        self.send_json(builder).await
    }

    /// List users
    ///
    /// GET /api/users
    pub async fn get_users(&self) -> Result<Vec<User>> {
        let builder = self.request(Method::GET, &["api", "users"])?;
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{ClientConfig, Credentials, TaskdeskClient};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_customers_sends_bearer_token() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/api/customers"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "c-1", "name": "Acme" },
                { "id": "c-2", "name": "Globex", "email": "ops@globex.test" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut client =
            TaskdeskClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        client.set_credentials(Credentials {
            bearer_token: "secret-token".to_string(),
        });

        let customers = client.get_customers().await.expect("get_customers failed");
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[1].email.as_deref(), Some("ops@globex.test"));
    }

    #[tokio::test]
    async fn test_get_users() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "u-1", "displayName": "Dana" }
            ])))
            .mount(&server)
            .await;

        let client =
            TaskdeskClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        let users = client.get_users().await.expect("get_users failed");
        assert_eq!(users[0].display_name, "Dana");
    }
}
