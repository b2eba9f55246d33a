//! Configuration management for the gateway.
//!
//! Settings are resolved from environment variables (with a `.env` file
//! loaded in development) before any transport or interceptor is
//! constructed. The core never reads the environment after startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub tls: TlsSettings,
}

impl Settings {
    /// Load settings from environment variables (and `.env` in development).
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        Ok(Settings {
            server: ServerSettings::from_env()?,
            upstream: UpstreamSettings::from_env()?,
            tls: TlsSettings::from_env(),
        })
    }
}

/// gRPC server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "50051".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}

/// Upstream REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL without the `/api/{version}` suffix.
    pub base_url: String,
    pub api_version: String,
    /// When false the shared HTTP client accepts any upstream certificate.
    pub verify_tls: bool,
}

impl UpstreamSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env::var("UPSTREAM_BASE_URL")
                .context("UPSTREAM_BASE_URL must be set")?
                .trim_end_matches('/')
                .to_string(),
            api_version: env::var("UPSTREAM_API_VERSION").unwrap_or_else(|_| "4.0".to_string()),
            verify_tls: env::var("UPSTREAM_VERIFY_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid UPSTREAM_VERIFY_TLS")?,
        })
    }
}

/// Server-side TLS material for the gRPC listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsSettings {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

impl TlsSettings {
    fn from_env() -> Self {
        Self {
            cert_path: env::var("TLS_CERT_PATH").ok(),
            key_path: env::var("TLS_KEY_PATH").ok(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.cert_path.is_some() && self.key_path.is_some()
    }
}
