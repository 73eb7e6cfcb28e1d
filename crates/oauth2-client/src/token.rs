//! Issued tokens: signing requests, expiry, refresh
//!
//! A [`Token`] keeps the raw response it was built from so a refresh
//! response may omit unchanged fields (e.g. `scope`) and still carry them
//! forward. `expires` is always a concrete instant: `expires_in` from the
//! response counted from construction time, or the end of time when the
//! server did not send one.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use common::Secret;
use reqwest::Method;
use reqwest::header::{CACHE_CONTROL, HeaderValue, PRAGMA};
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::form_urlencoded;

use crate::client::Client;
use crate::config::Overrides;
use crate::error::{Error, Result};
use crate::params::Params;
use crate::request::RequestSpec;
use crate::utils::{
    client_authorization, request_options, require, set_authorization, token_request_headers,
};

/// A new expiry: seconds from now (negative is already expired) or an
/// absolute instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Seconds(i64),
    At(DateTime<Utc>),
}

impl From<i64> for Expiry {
    fn from(seconds: i64) -> Self {
        Expiry::Seconds(seconds)
    }
}

impl From<i32> for Expiry {
    fn from(seconds: i32) -> Self {
        Expiry::Seconds(seconds.into())
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        Expiry::At(at)
    }
}

impl Expiry {
    fn resolve(self) -> DateTime<Utc> {
        match self {
            Expiry::Seconds(seconds) => Duration::try_seconds(seconds)
                .and_then(|d| Utc::now().checked_add_signed(d))
                .unwrap_or(if seconds < 0 {
                    DateTime::<Utc>::MIN_UTC
                } else {
                    DateTime::<Utc>::MAX_UTC
                }),
            Expiry::At(at) => at,
        }
    }

    /// Interpret a raw `expires_in`-style value: a JSON number or numeric
    /// string is seconds from now, an RFC 3339 string is an instant.
    pub fn from_value(value: &Value) -> Result<Expiry> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .map(Expiry::Seconds)
                .ok_or_else(|| Error::InvalidExpiry(value.to_string())),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(seconds) = s.parse::<i64>() {
                    Ok(Expiry::Seconds(seconds))
                } else if let Some(seconds) = s.parse::<f64>().ok().filter(|f| f.is_finite()) {
                    Ok(Expiry::Seconds(seconds as i64))
                } else {
                    DateTime::parse_from_rfc3339(s)
                        .map(|at| Expiry::At(at.with_timezone(&Utc)))
                        .map_err(|_| Error::InvalidExpiry(value.to_string()))
                }
            }
            other => Err(Error::InvalidExpiry(other.to_string())),
        }
    }
}

/// An access token issued by the authorization server.
///
/// Identity fields are fixed at construction; only `expires` changes, via
/// [`Token::expires_in`].
#[derive(Clone)]
pub struct Token {
    client: Client,
    data: Map<String, Value>,
    token_type: Option<String>,
    access_token: Option<Secret<String>>,
    refresh_token: Option<Secret<String>>,
    expires: DateTime<Utc>,
}

impl Token {
    pub(crate) fn new(client: Client, data: Map<String, Value>) -> Self {
        let token_type = data
            .get("token_type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        let access_token = non_empty_str(&data, "access_token").map(Secret::from);
        let refresh_token = non_empty_str(&data, "refresh_token").map(Secret::from);
        let expires = data
            .get("expires_in")
            .and_then(|v| Expiry::from_value(v).ok())
            .map(Expiry::resolve)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            client,
            data,
            token_type,
            access_token,
            refresh_token,
            expires,
        }
    }

    /// Lower-cased `token_type`, e.g. `"bearer"`.
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|s| s.expose().as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|s| s.expose().as_str())
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Granted scope as reported by the server, if any.
    pub fn scope(&self) -> Option<&str> {
        self.data.get("scope").and_then(Value::as_str)
    }

    /// The raw response data this token was built from.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Reset the expiry and return the new instant.
    pub fn expires_in(&mut self, expiry: impl Into<Expiry>) -> DateTime<Utc> {
        self.expires = expiry.into().resolve();
        self.expires
    }

    /// [`Token::expires_in`] for untyped input. Fails with
    /// [`Error::InvalidExpiry`] for anything but a number, a numeric string
    /// or an RFC 3339 timestamp.
    pub fn expires_in_value(&mut self, value: &Value) -> Result<DateTime<Utc>> {
        let expiry = Expiry::from_value(value)?;
        Ok(self.expires_in(expiry))
    }

    /// True once the current time is strictly after `expires`.
    pub fn expired(&self) -> bool {
        Utc::now() > self.expires
    }

    /// Attach this token to `request`.
    ///
    /// Bearer tokens set `Authorization: Bearer <token>`. Any other type
    /// replaces the `access_token` query parameter (keeping the fragment)
    /// and sets `Pragma` / `Cache-Control: no-store`.
    pub fn sign<'a>(&self, request: &'a mut RequestSpec) -> Result<&'a mut RequestSpec> {
        let access_token = self.access_token().ok_or(Error::MissingAccessToken)?;

        if self.token_type() == Some("bearer") {
            set_authorization(&mut request.headers, &format!("Bearer {access_token}"))?;
        } else {
            request.url = with_access_token(&request.url, access_token);
            request
                .headers
                .insert(PRAGMA, HeaderValue::from_static("no-store"));
            request
                .headers
                .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        }

        Ok(request)
    }

    /// Exchange the refresh token for a new token using the client's
    /// stored configuration.
    pub async fn refresh(&self) -> Result<Token> {
        self.refresh_with(&Overrides::default()).await
    }

    /// Exchange the refresh token for a new token.
    ///
    /// Fails with [`Error::MissingRefreshToken`] before any I/O when no
    /// refresh token is held. The new token's data is this token's data
    /// with the response laid over it.
    pub async fn refresh_with(&self, overrides: &Overrides) -> Result<Token> {
        let refresh_token = self
            .refresh_token
            .as_ref()
            .ok_or(Error::MissingRefreshToken)?;

        let config = self.client.config().merged(overrides);
        let access_token_uri = require(config.access_token_uri.as_deref(), "access_token_uri")?;

        let mut headers = token_request_headers();
        if let Some(authorization) = client_authorization(&config) {
            set_authorization(&mut headers, &authorization)?;
        }

        let spec = RequestSpec {
            url: access_token_uri.to_owned(),
            method: Method::POST,
            body: Params::new()
                .with("refresh_token", refresh_token.expose().as_str())
                .with("grant_type", "refresh_token"),
            query: Params::new(),
            headers,
        };

        debug!(grant = "refresh_token", "refreshing access token");
        let response = self.client.request(request_options(spec, &config)).await?;

        let mut data = self.data.clone();
        data.extend(response);
        info!("access token refreshed");
        Ok(self.client.create_token_from_data(data))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("access_token", &self.access_token)
            .field("refresh_token", &self.refresh_token)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

fn non_empty_str(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// `url` with any existing `access_token` query parameter replaced by
/// `access_token`. Other parameters keep their original encoding and the
/// fragment is reattached unchanged.
fn with_access_token(url: &str, access_token: &str) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let (path, query) = match base.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (base, None),
    };

    let encoded: String = form_urlencoded::byte_serialize(access_token.as_bytes()).collect();
    let token_pair = format!("access_token={encoded}");

    let mut pairs: Vec<&str> = query
        .map(|q| {
            q.split('&')
                .filter(|pair| {
                    !pair.is_empty()
                        && *pair != "access_token"
                        && !pair.starts_with("access_token=")
                })
                .collect()
        })
        .unwrap_or_default();
    pairs.push(&token_pair);

    let mut signed = format!("{path}?{}", pairs.join("&"));
    if let Some(fragment) = fragment {
        signed.push('#');
        signed.push_str(fragment);
    }
    signed
}
