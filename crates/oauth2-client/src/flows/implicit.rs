//! Implicit grant (RFC 6749 §4.2)

use tracing::debug;

use crate::client::Client;
use crate::config::Overrides;
use crate::error::{Error, Result};
use crate::params::Params;
use crate::token::Token;
use crate::utils::{create_uri, require, resolve_uri};

use super::check_redirect;

pub struct TokenFlow<'a> {
    client: &'a Client,
}

impl<'a> TokenFlow<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn get_uri(&self) -> Result<String> {
        self.get_uri_with(&Overrides::default())
    }

    pub fn get_uri_with(&self, overrides: &Overrides) -> Result<String> {
        create_uri(&self.client.config().merged(overrides), "token")
    }

    /// Read the token straight out of the redirect URI. No request is made.
    pub fn get_token(&self, uri: impl AsRef<str>) -> Result<Token> {
        self.get_token_with(uri, &Overrides::default())
    }

    /// The redirect path must match the configured `redirect_uri`. Token
    /// data comes from the fragment, with query parameters underneath it so
    /// that servers which put an `error` in the query are still caught.
    pub fn get_token_with(&self, uri: impl AsRef<str>, overrides: &Overrides) -> Result<Token> {
        let config = self.client.config().merged(overrides);
        let redirect_uri = require(config.redirect_uri.as_deref(), "redirect_uri")?;

        let uri = uri.as_ref();
        let url = resolve_uri(uri)?;
        let expected = resolve_uri(redirect_uri)?;
        if url.path() != expected.path() {
            return Err(Error::RedirectMismatch {
                path: url.path().to_owned(),
            });
        }

        let query = url.query().filter(|q| !q.is_empty());
        let fragment = url.fragment().filter(|f| !f.is_empty());
        if query.is_none() && fragment.is_none() {
            return Err(Error::MissingData(format!("unable to process uri: {uri}")));
        }

        let mut data = query.map(Params::decode).unwrap_or_default();
        if let Some(fragment) = fragment {
            data.extend(Params::decode(fragment));
        }
        check_redirect(&data, config.state.as_deref())?;

        if data.get("access_token").is_none_or(str::is_empty) {
            return Err(Error::MissingData(
                "missing access_token, unable to create token".into(),
            ));
        }

        debug!(grant = "implicit", "token read from redirect");
        Ok(self.client.create_token_from_data(data.into_map()))
    }
}
