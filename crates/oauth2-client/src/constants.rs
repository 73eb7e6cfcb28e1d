//! Protocol constants
//!
//! Fixed wire values from RFC 6749 and RFC 7523. None of these are secrets.

/// `Accept` sent with every token endpoint request. Servers answer in either
/// JSON or form encoding; both are parsed.
pub const ACCEPT_TOKEN_RESPONSE: &str = "application/json, application/x-www-form-urlencoded";

/// `Content-Type` of every token endpoint request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Base used to resolve relative redirect URIs (e.g. `/auth/callback?code=…`)
/// before comparing paths. Only the path and query of the result are read.
pub const DEFAULT_URL_BASE: &str = "https://example.org/";

/// `grant_type` for the JWT bearer assertion grant (RFC 7523 §2.1)
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Stable messages for the error codes defined in RFC 6749 §4.1.2.1 and §5.2.
///
/// Returns `None` for codes outside the RFC; callers fall back to the
/// server's `error_description` or the raw code.
pub fn error_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "invalid_request" => {
            "The request is missing a required parameter, includes an invalid parameter value, \
             includes a parameter more than once, or is otherwise malformed."
        }
        "invalid_client" => {
            "Client authentication failed (e.g., unknown client, no client authentication \
             included, or unsupported authentication method)."
        }
        "invalid_grant" => {
            "The provided authorization grant (e.g., authorization code, resource owner \
             credentials) or refresh token is invalid, expired, revoked, does not match the \
             redirection URI used in the authorization request, or was issued to another client."
        }
        "unauthorized_client" => {
            "The client is not authorized to request an authorization code using this method."
        }
        "unsupported_grant_type" => {
            "The authorization grant type is not supported by the authorization server."
        }
        "access_denied" => "The resource owner or authorization server denied the request.",
        "unsupported_response_type" => {
            "The authorization server does not support obtaining an authorization code using \
             this method."
        }
        "invalid_scope" => "The requested scope is invalid, unknown, or malformed.",
        "server_error" => {
            "The authorization server encountered an unexpected condition that prevented it \
             from fulfilling the request."
        }
        "temporarily_unavailable" => {
            "The authorization server is currently unable to handle the request due to a \
             temporary overloading or maintenance of the server."
        }
        _ => return None,
    };
    Some(message)
}
