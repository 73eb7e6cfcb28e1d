//! Client façade
//!
//! Owns the configuration and the transport, hands out the five grant
//! flows, and performs the token endpoint round trip:
//! 1. Serialize `query` onto the URL and `body` as form-encoded text
//! 2. Send through the transport (exactly one exchange, no retries)
//! 3. Parse the response as JSON, falling back to form decoding
//! 4. Fail with [`Error::Auth`] if the body carries an OAuth error,
//!    whatever the status
//! 5. Fail with [`Error::Status`] if the status is outside `200..399`

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{AuthError, Error, Result};
use crate::flows::{CodeFlow, CredentialsFlow, JwtBearerFlow, OwnerFlow, TokenFlow};
use crate::params::Params;
use crate::request::RequestSpec;
use crate::token::Token;
use crate::transport::{ReqwestTransport, Transport, TransportRequest};

/// OAuth 2.0 client. Cheap to clone; clones share configuration and
/// transport.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Client using the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner { config, transport }),
        }
    }

    /// The stored configuration. Flow calls never modify it.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Authorization code grant (RFC 6749 §4.1)
    pub fn code(&self) -> CodeFlow<'_> {
        CodeFlow::new(self)
    }

    /// Implicit grant (RFC 6749 §4.2)
    pub fn token(&self) -> TokenFlow<'_> {
        TokenFlow::new(self)
    }

    /// Resource owner password credentials grant (RFC 6749 §4.3)
    pub fn owner(&self) -> OwnerFlow<'_> {
        OwnerFlow::new(self)
    }

    /// Client credentials grant (RFC 6749 §4.4)
    pub fn credentials(&self) -> CredentialsFlow<'_> {
        CredentialsFlow::new(self)
    }

    /// JWT bearer assertion grant (RFC 7523 §2.1)
    pub fn jwt(&self) -> JwtBearerFlow<'_> {
        JwtBearerFlow::new(self)
    }

    /// Build a token from known values without a network round trip, e.g.
    /// to restore one issued earlier.
    ///
    /// `access_token`, `refresh_token` and `token_type` are laid over
    /// `data`, so the explicit arguments win. A token restored without an
    /// access token can still be refreshed but not used to sign.
    pub fn create_token(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        token_type: Option<&str>,
        data: Option<Map<String, Value>>,
    ) -> Token {
        let mut data = data.unwrap_or_default();
        if let Some(access) = access_token {
            data.insert("access_token".into(), Value::from(access));
        }
        if let Some(refresh) = refresh_token {
            data.insert("refresh_token".into(), Value::from(refresh));
        }
        if let Some(token_type) = token_type {
            data.insert("token_type".into(), Value::from(token_type));
        }
        self.create_token_from_data(data)
    }

    /// Build a token from a raw token endpoint response.
    pub fn create_token_from_data(&self, data: Map<String, Value>) -> Token {
        Token::new(self.clone(), data)
    }

    /// Perform one HTTP exchange and return the parsed response body.
    pub async fn request(&self, spec: RequestSpec) -> Result<Map<String, Value>> {
        let RequestSpec {
            mut url,
            method,
            body,
            query,
            headers,
        } = spec;

        let query = query.encode();
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        let endpoint = without_query(&url).to_owned();
        debug!(%method, endpoint = %endpoint, "sending request");

        let response = self
            .inner
            .transport
            .send(TransportRequest {
                url,
                method,
                headers,
                body: body.encode(),
            })
            .await?;

        debug!(endpoint = %endpoint, status = response.status, "received response");

        let parsed = parse_response_body(&response.body);
        if let Some(err) = AuthError::classify(&parsed) {
            warn!(
                endpoint = %endpoint,
                status = response.status,
                error = err.error().unwrap_or_default(),
                "authorization server returned an OAuth error"
            );
            return Err(Error::Auth(err));
        }

        if !(200..399).contains(&response.status) {
            warn!(endpoint = %endpoint, status = response.status, "unexpected HTTP status");
            return Err(Error::Status {
                status: response.status,
                body: response.body,
            });
        }

        Ok(parsed)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// JSON object if the body is one, otherwise the form-decoded body.
fn parse_response_body(body: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Params::decode(body).into_map(),
    }
}

/// The URL without query or fragment, safe to log.
fn without_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
