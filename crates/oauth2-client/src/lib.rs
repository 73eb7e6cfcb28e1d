//! OAuth 2.0 client library
//!
//! Builds authorization redirect URIs, performs the token endpoint
//! exchanges for the RFC 6749 grants plus the RFC 7523 JWT bearer grant,
//! signs outgoing requests with the resulting token, and refreshes it. HTTP
//! goes through the [`Transport`] trait so the library never owns sockets
//! or TLS policy.
//!
//! Authorization code flow:
//! 1. Build a [`Client`] from a [`ClientConfig`]
//! 2. Send the user to `client.code().get_uri()`
//! 3. Pass the redirect URI to `client.code().get_token(uri)`
//! 4. Sign API requests with [`Token::sign`]
//! 5. Call [`Token::refresh`] once [`Token::expired`] reports true

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod flows;
pub mod params;
pub mod request;
pub mod token;
pub mod transport;
pub mod utils;

pub use client::Client;
pub use config::{ClientConfig, Overrides, Scopes};
pub use error::{AuthError, Error, Result};
pub use flows::{CodeFlow, CredentialsFlow, GrantType, JwtBearerFlow, OwnerFlow, TokenFlow};
pub use params::Params;
pub use request::RequestSpec;
pub use token::{Expiry, Token};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
