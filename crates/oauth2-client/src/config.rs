//! Client configuration and per-call overrides
//!
//! A [`ClientConfig`] is fixed for the lifetime of a client. Every flow call
//! merges an [`Overrides`] value over it with [`ClientConfig::merged`],
//! producing a fresh configuration for that call only. Present override
//! fields replace the stored field wholesale, including `scopes` and the
//! extra `body` / `query` / `headers` maps.

use std::collections::BTreeMap;

use common::Secret;
use serde::Deserialize;

/// Requested scopes: a list joined with single spaces, or a string passed
/// through unchanged.
///
/// `Option<Scopes>` carries the omit-vs-empty distinction: `None` leaves the
/// `scope` parameter out entirely, while an empty list or empty string sends
/// `scope=`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scopes {
    List(Vec<String>),
    Single(String),
}

impl Scopes {
    /// The value of the `scope` parameter.
    pub fn to_param(&self) -> String {
        match self {
            Scopes::List(scopes) => scopes.join(" "),
            Scopes::Single(scope) => scope.clone(),
        }
    }
}

impl From<&str> for Scopes {
    fn from(scope: &str) -> Self {
        Scopes::Single(scope.to_owned())
    }
}

impl From<String> for Scopes {
    fn from(scope: String) -> Self {
        Scopes::Single(scope)
    }
}

impl From<Vec<String>> for Scopes {
    fn from(scopes: Vec<String>) -> Self {
        Scopes::List(scopes)
    }
}

impl From<Vec<&str>> for Scopes {
    fn from(scopes: Vec<&str>) -> Self {
        Scopes::List(scopes.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Scopes {
    fn from(scopes: [&str; N]) -> Self {
        Scopes::List(scopes.iter().map(|s| (*s).to_owned()).collect())
    }
}

/// OAuth 2.0 client configuration.
///
/// Every field is optional at the type level; each flow validates the
/// fields it needs and fails with [`crate::Error::Configuration`] before any
/// I/O when one is missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub client_id: Option<String>,
    /// Never read from TOML directly; callers load it from the environment
    /// or a file and set it with [`ClientConfig::with_client_secret`].
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    pub access_token_uri: Option<String>,
    pub authorization_uri: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: Option<Scopes>,
    pub state: Option<String>,
    /// Extra form fields merged into every token request body
    pub body: BTreeMap<String, String>,
    /// Extra query parameters merged into every request URL
    pub query: BTreeMap<String, String>,
    /// Extra headers merged into every token request. An empty
    /// `Authorization` value removes the computed client authentication.
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    pub fn with_client_secret(mut self, secret: impl Into<Secret<String>>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_access_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.access_token_uri = Some(uri.into());
        self
    }

    pub fn with_authorization_uri(mut self, uri: impl Into<String>) -> Self {
        self.authorization_uri = Some(uri.into());
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn with_scopes(mut self, scopes: impl Into<Scopes>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_body(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The configuration for one call: `overrides` laid over `self`.
    ///
    /// `self` is never modified.
    pub fn merged(&self, overrides: &Overrides) -> ClientConfig {
        let base = self.clone();
        let o = overrides.clone();
        ClientConfig {
            client_id: o.client_id.or(base.client_id),
            client_secret: o.client_secret.or(base.client_secret),
            access_token_uri: o.access_token_uri.or(base.access_token_uri),
            authorization_uri: o.authorization_uri.or(base.authorization_uri),
            redirect_uri: o.redirect_uri.or(base.redirect_uri),
            scopes: o.scopes.or(base.scopes),
            state: o.state.or(base.state),
            body: o.body.unwrap_or(base.body),
            query: o.query.unwrap_or(base.query),
            headers: o.headers.unwrap_or(base.headers),
        }
    }

    /// The client secret as plain text, if configured.
    pub(crate) fn secret(&self) -> Option<&str> {
        self.client_secret.as_ref().map(|s| s.expose().as_str())
    }
}

/// Per-call configuration overrides. Unset fields fall back to the client's
/// stored [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub client_id: Option<String>,
    pub client_secret: Option<Secret<String>>,
    pub access_token_uri: Option<String>,
    pub authorization_uri: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: Option<Scopes>,
    pub state: Option<String>,
    pub body: Option<BTreeMap<String, String>>,
    pub query: Option<BTreeMap<String, String>>,
    pub headers: Option<BTreeMap<String, String>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<Secret<String>>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn access_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.access_token_uri = Some(uri.into());
        self
    }

    pub fn authorization_uri(mut self, uri: impl Into<String>) -> Self {
        self.authorization_uri = Some(uri.into());
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn scopes(mut self, scopes: impl Into<Scopes>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Add one extra body field, replacing the client's stored `body` map
    /// for this call.
    pub fn body(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }
}
