//! Client credentials grant (RFC 6749 §4.4)

use tracing::debug;

use crate::client::Client;
use crate::config::Overrides;
use crate::error::Result;
use crate::params::Params;
use crate::token::Token;
use crate::utils::{
    basic_auth, require, scope_param, set_authorization, token_request_headers,
};

use super::token_request;

pub struct CredentialsFlow<'a> {
    client: &'a Client,
}

impl<'a> CredentialsFlow<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get_token(&self) -> Result<Token> {
        self.get_token_with(&Overrides::default()).await
    }

    /// Confidential clients only: both `client_id` and `client_secret` must
    /// be configured, and they are always sent as basic auth.
    pub async fn get_token_with(&self, overrides: &Overrides) -> Result<Token> {
        let config = self.client.config().merged(overrides);
        let client_id = require(config.client_id.as_deref(), "client_id")?;
        let client_secret = require(config.secret(), "client_secret")?;
        let access_token_uri = require(config.access_token_uri.as_deref(), "access_token_uri")?;

        let mut headers = token_request_headers();
        set_authorization(&mut headers, &basic_auth(client_id, client_secret))?;

        let mut body = Params::new().with("grant_type", "client_credentials");
        if let Some(scope) = scope_param(&config) {
            body.set("scope", scope);
        }

        debug!(grant = "client_credentials", "requesting token");
        let response = self
            .client
            .request(token_request(access_token_uri, headers, body, &config))
            .await?;
        Ok(self.client.create_token_from_data(response))
    }
}
