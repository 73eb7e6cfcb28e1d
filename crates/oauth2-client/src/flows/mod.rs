//! The five grant flows
//!
//! Each flow borrows the [`Client`](crate::Client), merges per-call
//! [`Overrides`](crate::Overrides) over the stored configuration, and yields
//! a [`Token`](crate::Token). The code and implicit flows also build the
//! authorization redirect URI.

mod code;
mod credentials;
mod implicit;
mod jwt_bearer;
mod owner;

pub use code::CodeFlow;
pub use credentials::CredentialsFlow;
pub use implicit::TokenFlow;
pub use jwt_bearer::JwtBearerFlow;
pub use owner::OwnerFlow;

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use reqwest::header::HeaderMap;

use crate::config::ClientConfig;
use crate::error::{AuthError, Error, Result};
use crate::params::Params;
use crate::request::RequestSpec;
use crate::utils::request_options;

/// OAuth 2.0 grant types this client can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantType {
    AuthorizationCode,
    Implicit,
    ClientCredentials,
    Password,
    JwtBearer,
    RefreshToken,
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantType::AuthorizationCode => write!(f, "authorization_code"),
            GrantType::Implicit => write!(f, "implicit"),
            GrantType::ClientCredentials => write!(f, "client_credentials"),
            GrantType::Password => write!(f, "password"),
            GrantType::JwtBearer => write!(f, "jwt_bearer"),
            GrantType::RefreshToken => write!(f, "refresh_token"),
        }
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "authorization_code" | "code" => Ok(GrantType::AuthorizationCode),
            "implicit" | "token" => Ok(GrantType::Implicit),
            "client_credentials" | "credentials" => Ok(GrantType::ClientCredentials),
            "password" | "owner" => Ok(GrantType::Password),
            "jwt_bearer" | "jwt" => Ok(GrantType::JwtBearer),
            "refresh_token" | "refresh" => Ok(GrantType::RefreshToken),
            other => Err(format!("unknown grant type: {other}")),
        }
    }
}

/// A POST to the token endpoint with the configuration's extras merged in.
fn token_request(
    url: &str,
    headers: HeaderMap,
    body: Params,
    config: &ClientConfig,
) -> RequestSpec {
    request_options(
        RequestSpec {
            url: url.to_owned(),
            method: Method::POST,
            body,
            query: Params::new(),
            headers,
        },
        config,
    )
}

/// Checks shared by the code and implicit redirects: an OAuth error in the
/// returned data wins, then the configured `state` must match exactly.
fn check_redirect(data: &Params, state: Option<&str>) -> Result<()> {
    if let Some(err) = AuthError::classify(&data.clone().into_map()) {
        return Err(Error::Auth(err));
    }

    if state.is_some_and(|expected| data.get("state") != Some(expected)) {
        return Err(Error::StateMismatch {
            state: data.get("state").map(str::to_owned),
        });
    }

    Ok(())
}
