//! Client configuration: where the proxy lives and which credentials to
//! present to its login operation.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Proxy endpoint, e.g. `https://gateway.internal:50051`.
    pub endpoint: String,
    /// PEM file pinning the proxy's CA; plaintext channel when absent.
    pub ca_cert_path: Option<String>,
    pub client_id: String,
    pub client_secret: String,
}

impl ClientSettings {
    /// Load settings from environment variables (and `.env` in development).
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        Ok(Self {
            endpoint: env::var("GATEWAY_ENDPOINT").context("GATEWAY_ENDPOINT must be set")?,
            ca_cert_path: env::var("GATEWAY_CA_CERT_PATH").ok(),
            client_id: env::var("GATEWAY_CLIENT_ID").context("GATEWAY_CLIENT_ID must be set")?,
            client_secret: env::var("GATEWAY_CLIENT_SECRET")
                .context("GATEWAY_CLIENT_SECRET must be set")?,
        })
    }

    /// Settings for a known endpoint with no TLS pinning; used by tests and
    /// local tooling.
    pub fn plaintext(
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            ca_cert_path: None,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}
