//! Outbound HTTP execution.
//!
//! Transports describe what to send with [`OutboundRequest`]; the
//! [`HttpDispatch`] trait hides the wire so tests can count calls with a
//! fake. The production dispatcher rides a process-wide `reqwest` client,
//! lazily constructed once and shared by every concurrent execution.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::Client;
use thiserror::Error;

use super::HttpMethod;

/// Fully built outbound request, ready for the wire.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: OutboundBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Empty,
    /// Serialized JSON document.
    Json(String),
    /// Form-encoded key/value pairs (login only).
    Form(Vec<(String, String)>),
}

/// Raw upstream response: status code plus body text.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: String,
}

/// Transport-level failure: IO, TLS, or protocol errors below the HTTP
/// status layer.
#[derive(Debug, Error)]
#[error("upstream request failed: {0}")]
pub struct DispatchError(pub String);

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError(err.to_string())
    }
}

/// Executes one outbound request. Implementations must be safe for
/// concurrent use.
#[async_trait]
pub trait HttpDispatch: Send + Sync {
    async fn dispatch(&self, request: OutboundRequest) -> Result<OutboundResponse, DispatchError>;
}

static SHARED_CLIENT: OnceCell<Client> = OnceCell::new();

/// Process-wide HTTP client, built on first use and reused by all
/// dispatchers. The first caller's TLS-verification flag wins; with
/// verification disabled the client accepts any certificate, an explicitly
/// insecure mode for self-signed upstream deployments.
fn shared_client(verify_tls: bool) -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let mut builder = Client::builder();
        if !verify_tls {
            tracing::warn!("TLS verification disabled for upstream connections");
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build().expect("failed to construct upstream HTTP client")
    })
}

/// Production dispatcher backed by the shared `reqwest` client.
pub struct ReqwestDispatcher {
    verify_tls: bool,
}

impl ReqwestDispatcher {
    pub fn new(verify_tls: bool) -> Self {
        Self { verify_tls }
    }
}

#[async_trait]
impl HttpDispatch for ReqwestDispatcher {
    async fn dispatch(&self, request: OutboundRequest) -> Result<OutboundResponse, DispatchError> {
        let client = shared_client(self.verify_tls);
        let mut builder = client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        builder = match request.body {
            OutboundBody::Empty => builder,
            OutboundBody::Json(json) => builder.body(json),
            OutboundBody::Form(pairs) => builder.form(&pairs),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(OutboundResponse { status, body })
    }
}
