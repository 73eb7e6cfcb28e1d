//! HTTP transport boundary
//!
//! The client never touches sockets, TLS or redirects itself. It hands a
//! fully serialized [`TransportRequest`] to a [`Transport`] and reads back
//! the status and body text. [`ReqwestTransport`] is the default; tests and
//! embedders inject their own.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn Transport>`).

use std::future::Future;
use std::pin::Pin;

use reqwest::Method;
use reqwest::header::HeaderMap;

use crate::error::{Error, Result};

/// One serialized HTTP request: query already on the URL, body already
/// form-encoded.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: String,
}

/// Status and body text of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<TransportResponse>> + Send + 'a>>;

/// Performs a single HTTP exchange.
///
/// Implementations must not retry. Timeouts and cancellation belong here,
/// not in the client.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method, &request.url)
                .headers(request.headers);
            if !request.body.is_empty() {
                builder = builder.body(request.body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Error::Http(format!("request failed: {e}")))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| Error::Http(format!("reading response body failed: {e}")))?;

            Ok(TransportResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tokio::net::TcpListener;

    /// Start a server that echoes the request method, content type and body.
    async fn start_echo_server() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            let app = axum::Router::new().fallback(
                |method: axum::http::Method, headers: axum::http::HeaderMap, body: String| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    (
                        StatusCode::CREATED,
                        format!("{method}|{content_type}|{body}"),
                    )
                },
            );
            axum::serve(listener, app).await.unwrap();
        });

        (url, handle)
    }

    #[tokio::test]
    async fn sends_body_and_headers() {
        let (url, handle) = start_echo_server().await;
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            "application/x-www-form-urlencoded".parse().unwrap(),
        );

        let response = ReqwestTransport::new()
            .send(TransportRequest {
                url: format!("{url}/token"),
                method: Method::POST,
                headers,
                body: "grant_type=client_credentials".into(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(
            response.body,
            "POST|application/x-www-form-urlencoded|grant_type=client_credentials"
        );
        handle.abort();
    }

    #[tokio::test]
    async fn connection_failure_is_http_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = ReqwestTransport::new()
            .send(TransportRequest {
                url: format!("http://{addr}/token"),
                method: Method::POST,
                headers: HeaderMap::new(),
                body: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "EHTTP");
    }
}
