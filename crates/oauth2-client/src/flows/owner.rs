//! Resource owner password credentials grant (RFC 6749 §4.3)

use tracing::debug;

use crate::client::Client;
use crate::config::Overrides;
use crate::error::Result;
use crate::params::Params;
use crate::token::Token;
use crate::utils::{
    client_authorization, require, scope_param, set_authorization, token_request_headers,
};

use super::token_request;

pub struct OwnerFlow<'a> {
    client: &'a Client,
}

impl<'a> OwnerFlow<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get_token(&self, username: &str, password: &str) -> Result<Token> {
        self.get_token_with(username, password, &Overrides::default())
            .await
    }

    pub async fn get_token_with(
        &self,
        username: &str,
        password: &str,
        overrides: &Overrides,
    ) -> Result<Token> {
        let config = self.client.config().merged(overrides);
        let access_token_uri = require(config.access_token_uri.as_deref(), "access_token_uri")?;

        let mut headers = token_request_headers();
        if let Some(authorization) = client_authorization(&config) {
            set_authorization(&mut headers, &authorization)?;
        }

        let mut body = Params::new()
            .with("username", username)
            .with("password", password)
            .with("grant_type", "password");
        if let Some(scope) = scope_param(&config) {
            body.set("scope", scope);
        }

        debug!(grant = "password", "requesting token");
        let response = self
            .client
            .request(token_request(access_token_uri, headers, body, &config))
            .await?;
        Ok(self.client.create_token_from_data(response))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::FakeTransport;
    use crate::config::{ClientConfig, Overrides};
    use crate::error::Error;
    use crate::Client;
    use reqwest::header::AUTHORIZATION;

    fn config() -> ClientConfig {
        ClientConfig::new("abc")
            .with_client_secret("123")
            .with_access_token_uri("https://auth.example.com/token")
            .with_scopes("notifications")
    }

    #[tokio::test]
    async fn exchanges_username_and_password() {
        let transport = FakeTransport::new().respond(
            200,
            r#"{"access_token":"at","refresh_token":"rt","token_type":"bearer","expires_in":3600}"#,
        );
        let client = Client::with_transport(config(), transport.clone());

        let token = client.owner().get_token("blakeembrey", "hunter2").await.unwrap();
        assert_eq!(token.access_token(), Some("at"));
        assert_eq!(token.refresh_token(), Some("rt"));
        assert!(!token.expired());

        let request = transport.last_request();
        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "Basic YWJjOjEyMw==");
        assert_eq!(
            request.body,
            "username=blakeembrey&password=hunter2&grant_type=password&scope=notifications"
        );
    }

    #[tokio::test]
    async fn no_client_id_means_no_authorization_header() {
        let transport = FakeTransport::new().respond(200, r#"{"access_token":"at"}"#);
        let mut config = config();
        config.client_id = None;
        let client = Client::with_transport(config, transport.clone());

        client.owner().get_token("u", "p").await.unwrap();
        assert!(transport.last_request().headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn client_id_without_secret_uses_empty_password() {
        let transport = FakeTransport::new().respond(200, r#"{"access_token":"at"}"#);
        let mut config = config();
        config.client_secret = None;
        let client = Client::with_transport(config, transport.clone());

        client.owner().get_token("u", "p").await.unwrap();
        // base64("abc:")
        assert_eq!(
            transport.last_request().headers.get(AUTHORIZATION).unwrap(),
            "Basic YWJjOg=="
        );
    }

    #[tokio::test]
    async fn override_replaces_scope_and_endpoint() {
        let transport = FakeTransport::new().respond(200, r#"{"access_token":"at"}"#);
        let client = Client::with_transport(config(), transport.clone());

        client
            .owner()
            .get_token_with(
                "u",
                "p",
                &Overrides::new()
                    .access_token_uri("https://other.example.com/token")
                    .scopes(["read", "write"]),
            )
            .await
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.url, "https://other.example.com/token");
        assert_eq!(transport.last_body().get("scope"), Some("read write"));
    }

    #[tokio::test]
    async fn requires_access_token_uri() {
        let transport = FakeTransport::new();
        let client = Client::with_transport(ClientConfig::new("abc"), transport.clone());

        let err = client.owner().get_token("u", "p").await.unwrap_err();
        assert!(matches!(err, Error::Configuration("access_token_uri")));
        assert_eq!(transport.request_count(), 0);
    }
}
