//! Error types for OAuth 2.0 client operations
//!
//! Every failure is returned as a value; nothing is retried internally.
//! Protocol errors found in a response body (`error` / `error_description`)
//! take precedence over HTTP status errors, so a 200 carrying `error` is an
//! [`Error::Auth`] and a 400 without one is an [`Error::Status`].

use serde_json::{Map, Value};

use crate::constants::error_message;

/// Errors from OAuth 2.0 client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field the operation needs is missing from the merged configuration.
    /// Raised before any I/O.
    #[error("expected \"{0}\" to exist")]
    Configuration(&'static str),

    #[error("redirected path should match configured path, but got: {path}")]
    RedirectMismatch { path: String },

    #[error("{0}")]
    MissingData(String),

    #[error("invalid state: {}", state.as_deref().unwrap_or("<none>"))]
    StateMismatch { state: Option<String> },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("HTTP status {status}")]
    Status { status: u16, body: String },

    #[error("unknown duration: {0}")]
    InvalidExpiry(String),

    #[error("unable to sign without access token")]
    MissingAccessToken,

    #[error("no refresh token")]
    MissingRefreshToken,

    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl Error {
    /// Stable discriminator for matching without inspecting messages.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "ECONFIG",
            Error::RedirectMismatch { .. } => "EREDIRECT",
            Error::MissingData(_) => "EMISSING",
            Error::StateMismatch { .. } => "ESTATE",
            Error::Auth(err) => err.code(),
            Error::Status { .. } => "ESTATUS",
            Error::InvalidExpiry(_) => "ETYPE",
            Error::MissingAccessToken | Error::MissingRefreshToken => "ETOKEN",
            Error::InvalidUri(_) | Error::InvalidHeader(_) => "EINVALID",
            Error::Http(_) => "EHTTP",
        }
    }

    /// The protocol error, if this is one.
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Error::Auth(err) => Some(err),
            _ => None,
        }
    }
}

/// Result alias for OAuth 2.0 client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An OAuth protocol error reported by the authorization server, either in a
/// token endpoint response or in the query/fragment of a redirect.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct AuthError {
    message: String,
    body: Map<String, Value>,
}

impl AuthError {
    /// Inspect a parsed response body for OAuth error fields.
    ///
    /// The message is the stable text for a known `error` code, else
    /// `error_description`, else the raw `error` value. A body with neither
    /// field is not an error.
    pub fn classify(body: &Map<String, Value>) -> Option<AuthError> {
        let error = body.get("error").and_then(field_text);
        let message = error
            .as_deref()
            .and_then(error_message)
            .map(str::to_owned)
            .or_else(|| body.get("error_description").and_then(field_text))
            .or(error)?;

        Some(AuthError {
            message,
            body: body.clone(),
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The full response body the error was extracted from.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// The raw `error` code, when the server sent one as a string.
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    pub fn code(&self) -> &'static str {
        "EAUTH"
    }
}

/// Render a body field as text, treating null, `false` and `""` as absent.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn known_code_uses_stable_message() {
        let err = AuthError::classify(&body(json!({
            "error": "invalid_grant",
            "error_description": "code expired"
        })))
        .unwrap();
        assert!(err.message().starts_with("The provided authorization grant"));
        assert_eq!(err.error(), Some("invalid_grant"));
        assert_eq!(err.code(), "EAUTH");
        assert_eq!(err.body()["error_description"], "code expired");
    }

    #[test]
    fn unknown_code_falls_back_to_description() {
        let err = AuthError::classify(&body(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })))
        .unwrap();
        assert_eq!(err.message(), "The code passed is incorrect or expired.");
    }

    #[test]
    fn unknown_code_without_description_uses_raw_code() {
        let err = AuthError::classify(&body(json!({"error": "slow_down"}))).unwrap();
        assert_eq!(err.message(), "slow_down");
    }

    #[test]
    fn description_alone_is_an_error() {
        let err = AuthError::classify(&body(json!({"error_description": "nope"}))).unwrap();
        assert_eq!(err.message(), "nope");
        assert_eq!(err.error(), None);
    }

    #[test]
    fn success_body_is_not_an_error() {
        assert!(
            AuthError::classify(&body(json!({"access_token": "at", "token_type": "bearer"})))
                .is_none()
        );
        assert!(AuthError::classify(&body(json!({"error": ""}))).is_none());
        assert!(AuthError::classify(&body(json!({"error": null}))).is_none());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(Error::Configuration("clientId").code(), "ECONFIG");
        assert_eq!(
            Error::Status {
                status: 500,
                body: String::new()
            }
            .code(),
            "ESTATUS"
        );
        let auth = AuthError::classify(&body(json!({"error": "invalid_request"}))).unwrap();
        assert_eq!(Error::from(auth).code(), "EAUTH");
    }

    #[test]
    fn display_messages_are_descriptive() {
        assert_eq!(
            Error::Configuration("accessTokenUri").to_string(),
            "expected \"accessTokenUri\" to exist"
        );
        assert_eq!(
            Error::StateMismatch {
                state: Some("xyz".into())
            }
            .to_string(),
            "invalid state: xyz"
        );
        assert_eq!(
            Error::Status {
                status: 502,
                body: "bad gateway".into()
            }
            .to_string(),
            "HTTP status 502"
        );
    }
}
