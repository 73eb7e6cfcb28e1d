//! Authorization code grant (RFC 6749 §4.1)

use reqwest::header::HeaderMap;
use tracing::debug;

use crate::client::Client;
use crate::config::Overrides;
use crate::error::{Error, Result};
use crate::params::Params;
use crate::token::Token;
use crate::utils::{
    basic_auth, create_uri, require, resolve_uri, set_authorization, token_request_headers,
};

use super::{check_redirect, token_request};

pub struct CodeFlow<'a> {
    client: &'a Client,
}

impl<'a> CodeFlow<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// The authorization endpoint URI to send the user to.
    pub fn get_uri(&self) -> Result<String> {
        self.get_uri_with(&Overrides::default())
    }

    pub fn get_uri_with(&self, overrides: &Overrides) -> Result<String> {
        create_uri(&self.client.config().merged(overrides), "code")
    }

    /// Read the code from the URI the user was redirected back to and
    /// exchange it for a token.
    pub async fn get_token(&self, uri: impl AsRef<str>) -> Result<Token> {
        self.get_token_with(uri, &Overrides::default()).await
    }

    /// Redirect checks run in order and all fail before any I/O: configured
    /// path match, non-empty query, OAuth error in the query, `state`
    /// match, `code` present.
    ///
    /// With a client secret configured the client authenticates with basic
    /// auth; without one `client_id` goes in the body instead (RFC 6749
    /// §3.2.1).
    pub async fn get_token_with(
        &self,
        uri: impl AsRef<str>,
        overrides: &Overrides,
    ) -> Result<Token> {
        let config = self.client.config().merged(overrides);
        let client_id = require(config.client_id.as_deref(), "client_id")?;
        let access_token_uri = require(config.access_token_uri.as_deref(), "access_token_uri")?;

        let uri = uri.as_ref();
        let url = resolve_uri(uri)?;
        if let Some(redirect_uri) = config.redirect_uri.as_deref() {
            let expected = resolve_uri(redirect_uri)?;
            if url.path() != expected.path() {
                return Err(Error::RedirectMismatch {
                    path: url.path().to_owned(),
                });
            }
        }

        let query = url
            .query()
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::MissingData(format!("unable to process uri: {uri}")))?;
        let data = Params::decode(query);
        check_redirect(&data, config.state.as_deref())?;

        let code = data
            .get("code")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::MissingData("missing code, unable to request token".into()))?;

        let mut headers: HeaderMap = token_request_headers();
        let mut body = Params::new()
            .with("code", code)
            .with("grant_type", "authorization_code");
        if let Some(redirect_uri) = config.redirect_uri.as_deref() {
            body.set("redirect_uri", redirect_uri);
        }
        match config.secret().filter(|s| !s.is_empty()) {
            Some(secret) => set_authorization(&mut headers, &basic_auth(client_id, secret))?,
            None => body.set("client_id", client_id),
        }

        debug!(grant = "authorization_code", "exchanging authorization code");
        let response = self
            .client
            .request(token_request(access_token_uri, headers, body, &config))
            .await?;
        Ok(self.client.create_token_from_data(response))
    }
}
