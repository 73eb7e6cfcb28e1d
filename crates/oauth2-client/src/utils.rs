//! Helpers shared by the flows and the token: client authentication,
//! presence checks, authorization URI construction, and request merging.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::warn;
use url::Url;

use crate::config::{ClientConfig, Scopes};
use crate::constants::{ACCEPT_TOKEN_RESPONSE, DEFAULT_URL_BASE, FORM_CONTENT_TYPE};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::request::RequestSpec;

/// `Basic <base64(username:password)>` per RFC 7617.
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Fail with [`Error::Configuration`] naming `field` when `value` is absent.
///
/// Only absence fails; an empty string counts as present.
pub fn require<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    value.ok_or(Error::Configuration(field))
}

/// The `scope` parameter value, or `None` when the parameter must be
/// omitted.
pub fn scope_param(config: &ClientConfig) -> Option<String> {
    config.scopes.as_ref().map(Scopes::to_param)
}

/// Client authentication for the password, JWT bearer and refresh grants:
/// basic auth whenever a client id is configured, with an empty password if
/// no secret is.
pub fn client_authorization(config: &ClientConfig) -> Option<String> {
    config
        .client_id
        .as_deref()
        .map(|id| basic_auth(id, config.secret().unwrap_or_default()))
}

/// Build the authorization endpoint redirect for `response_type`.
///
/// Parameter order is `client_id, redirect_uri, response_type, state` then
/// `scope` when scopes are configured; extra query parameters from the
/// configuration are laid over these. An existing query string on the
/// authorization URI is kept.
pub fn create_uri(config: &ClientConfig, response_type: &str) -> Result<String> {
    let client_id = require(config.client_id.as_deref(), "client_id")?;
    let authorization_uri = require(config.authorization_uri.as_deref(), "authorization_uri")?;

    let mut query = Params::new()
        .with("client_id", client_id)
        .with("redirect_uri", config.redirect_uri.as_deref().unwrap_or_default())
        .with("response_type", response_type)
        .with("state", config.state.as_deref().unwrap_or_default());
    if let Some(scope) = scope_param(config) {
        query.set("scope", scope);
    }
    query.extend(config.query.clone());

    let sep = if authorization_uri.contains('?') { '&' } else { '?' };
    Ok(format!("{authorization_uri}{sep}{}", query.encode()))
}

/// Headers sent with every token endpoint request.
pub fn token_request_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_TOKEN_RESPONSE));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    headers
}

/// Set the `Authorization` header, marked sensitive.
pub fn set_authorization(headers: &mut HeaderMap, value: &str) -> Result<()> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidHeader(format!("authorization: {e}")))?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(())
}

/// Merge the configuration's extra body, query and headers into `spec`.
///
/// Configured values win on collision. Header entries with an invalid name
/// or value are skipped with a warning. An empty `Authorization` value
/// after merging means "send no Authorization header" and is removed.
pub fn request_options(mut spec: RequestSpec, config: &ClientConfig) -> RequestSpec {
    spec.body.extend(config.body.clone());
    spec.query.extend(config.query.clone());

    for (name, value) in &config.headers {
        let header_name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(n) => n,
            Err(e) => {
                warn!(header = %name, error = %e, "skipping invalid header name");
                continue;
            }
        };
        let mut header_value = match HeaderValue::from_str(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(header = %name, error = %e, "skipping invalid header value");
                continue;
            }
        };
        if header_name == AUTHORIZATION {
            header_value.set_sensitive(true);
        }
        spec.headers.insert(header_name, header_value);
    }

    if spec
        .headers
        .get(AUTHORIZATION)
        .is_some_and(|v| v.is_empty())
    {
        spec.headers.remove(AUTHORIZATION);
    }

    spec
}

/// Parse a redirect URI, resolving relative forms against
/// [`DEFAULT_URL_BASE`].
pub fn resolve_uri(uri: &str) -> Result<Url> {
    let base = Url::parse(DEFAULT_URL_BASE).map_err(|e| Error::InvalidUri(e.to_string()))?;
    base.join(uri)
        .map_err(|e| Error::InvalidUri(format!("{uri}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github() -> ClientConfig {
        ClientConfig::new("abc")
            .with_client_secret("123")
            .with_authorization_uri("https://github.com/login/oauth/authorize")
            .with_access_token_uri("https://github.com/login/oauth/access_token")
            .with_redirect_uri("http://example.com/auth/callback")
    }

    #[test]
    fn basic_auth_encodes_credentials() {
        // base64("abc:123")
        assert_eq!(basic_auth("abc", "123"), "Basic YWJjOjEyMw==");
        // base64("abc:")
        assert_eq!(basic_auth("abc", ""), "Basic YWJjOg==");
    }

    #[test]
    fn require_reports_missing_field() {
        assert_eq!(require(Some(""), "client_id").unwrap(), "");
        let err = require(None, "client_id").unwrap_err();
        assert!(matches!(err, Error::Configuration("client_id")));
    }

    #[test]
    fn create_uri_without_scopes_omits_scope() {
        let uri = create_uri(&github(), "code").unwrap();
        assert_eq!(
            uri,
            "https://github.com/login/oauth/authorize?client_id=abc&\
             redirect_uri=http%3A%2F%2Fexample.com%2Fauth%2Fcallback&\
             response_type=code&state="
        );
    }

    #[test]
    fn create_uri_with_empty_scopes_sends_empty_scope() {
        let list = create_uri(&github().with_scopes(Vec::<String>::new()), "token").unwrap();
        assert!(list.ends_with("response_type=token&state=&scope="), "{list}");

        let single = create_uri(&github().with_scopes(""), "token").unwrap();
        assert!(single.ends_with("&state=&scope="), "{single}");
    }

    #[test]
    fn create_uri_preserves_existing_query() {
        let config = github()
            .with_authorization_uri("https://github.com/login/oauth/authorize?bar=qux")
            .with_scopes(["notifications"]);
        let uri = create_uri(&config, "code").unwrap();
        assert_eq!(
            uri,
            "https://github.com/login/oauth/authorize?bar=qux&client_id=abc&\
             redirect_uri=http%3A%2F%2Fexample.com%2Fauth%2Fcallback&\
             response_type=code&state=&scope=notifications"
        );
    }

    #[test]
    fn create_uri_extra_query_overrides_computed() {
        let config = github()
            .with_state("s1")
            .with_query("state", "override")
            .with_query("prompt", "consent");
        let uri = create_uri(&config, "code").unwrap();
        assert!(uri.contains("&state=override"), "{uri}");
        assert!(uri.ends_with("&prompt=consent"), "{uri}");
        assert!(!uri.contains("s1"));
    }

    #[test]
    fn create_uri_requires_client_id_and_authorization_uri() {
        let mut config = github();
        config.authorization_uri = None;
        assert!(matches!(
            create_uri(&config, "code"),
            Err(Error::Configuration("authorization_uri"))
        ));

        config = github();
        config.client_id = None;
        assert!(matches!(
            create_uri(&config, "code"),
            Err(Error::Configuration("client_id"))
        ));
    }

    #[test]
    fn request_options_merges_configured_extras() {
        let config = github()
            .with_body("audience", "api")
            .with_query("tenant", "t1")
            .with_header("x-trace", "on");
        let mut spec = RequestSpec::post("https://example.com/token");
        spec.body.set("grant_type", "client_credentials");
        spec.headers = token_request_headers();

        let merged = request_options(spec, &config);
        assert_eq!(merged.body.encode(), "grant_type=client_credentials&audience=api");
        assert_eq!(merged.query.get("tenant"), Some("t1"));
        assert_eq!(merged.header("x-trace"), Some("on"));
        assert_eq!(merged.header("content-type"), Some(FORM_CONTENT_TYPE));
    }

    #[test]
    fn request_options_strips_empty_authorization() {
        let config = github().with_header("Authorization", "");
        let mut spec = RequestSpec::post("https://example.com/token");
        set_authorization(&mut spec.headers, &basic_auth("abc", "123")).unwrap();

        let merged = request_options(spec, &config);
        assert!(merged.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn request_options_skips_invalid_headers() {
        let config = github().with_header("bad header", "x").with_header("x-ok", "1");
        let merged = request_options(RequestSpec::get("https://example.com"), &config);
        assert_eq!(merged.headers.len(), 1);
        assert_eq!(merged.header("x-ok"), Some("1"));
    }

    #[test]
    fn client_authorization_keys_on_client_id() {
        assert_eq!(
            client_authorization(&github()).as_deref(),
            Some("Basic YWJjOjEyMw==")
        );
        assert_eq!(
            client_authorization(&ClientConfig::new("abc")).as_deref(),
            Some("Basic YWJjOg==")
        );
        assert_eq!(client_authorization(&ClientConfig::default()), None);
    }

    #[test]
    fn resolve_uri_handles_relative_and_absolute() {
        let relative = resolve_uri("/auth/callback?code=x").unwrap();
        assert_eq!(relative.path(), "/auth/callback");
        assert_eq!(relative.query(), Some("code=x"));

        let absolute = resolve_uri("http://example.com/auth/callback#access_token=a").unwrap();
        assert_eq!(absolute.host_str(), Some("example.com"));
        assert_eq!(absolute.fragment(), Some("access_token=a"));
    }
}
