//! JWT bearer assertion grant (RFC 7523 §2.1)
//!
//! The assertion is produced elsewhere; this flow only presents it.

use tracing::debug;

use crate::client::Client;
use crate::config::Overrides;
use crate::constants::JWT_BEARER_GRANT;
use crate::error::Result;
use crate::params::Params;
use crate::token::Token;
use crate::utils::{
    client_authorization, require, scope_param, set_authorization, token_request_headers,
};

use super::token_request;

pub struct JwtBearerFlow<'a> {
    client: &'a Client,
}

impl<'a> JwtBearerFlow<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get_token(&self, assertion: &str) -> Result<Token> {
        self.get_token_with(assertion, &Overrides::default()).await
    }

    pub async fn get_token_with(&self, assertion: &str, overrides: &Overrides) -> Result<Token> {
        let config = self.client.config().merged(overrides);
        let access_token_uri = require(config.access_token_uri.as_deref(), "access_token_uri")?;

        let mut headers = token_request_headers();
        if let Some(authorization) = client_authorization(&config) {
            set_authorization(&mut headers, &authorization)?;
        }

        let mut body = Params::new()
            .with("grant_type", JWT_BEARER_GRANT)
            .with("assertion", assertion);
        if let Some(scope) = scope_param(&config) {
            body.set("scope", scope);
        }

        debug!(grant = "jwt_bearer", "requesting token");
        let response = self
            .client
            .request(token_request(access_token_uri, headers, body, &config))
            .await?;
        Ok(self.client.create_token_from_data(response))
    }
}
