/// Gateway Main Entry Point
///
/// Starts the gRPC server with:
/// - bearer-auth middleware in front of every service
/// - the transport registry shared by all handlers
/// - optional server TLS (PEM cert/key from configuration)
/// - grpc.health.v1 liveness service
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use gateway_service::{
    auth::BearerAuthLayer,
    config::Settings,
    grpc::prism::gateway::gateway_service_server::GatewayServiceServer,
    grpc::prism::gateway::gateway_streaming_service_server::GatewayStreamingServiceServer,
    grpc::prism::gateway::ping_service_server::PingServiceServer,
    grpc::{GatewayProxyServer, PingProxyServer, StreamingProxyServer},
    transport::TransportRegistry,
};
use tokio::signal;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "gateway_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Prism Gateway");

    let settings = Settings::load().context("Failed to load configuration")?;
    info!(
        upstream = %settings.upstream.base_url,
        api_version = %settings.upstream.api_version,
        "Configuration loaded"
    );
    if !settings.upstream.verify_tls {
        warn!("Upstream TLS verification is DISABLED");
    }

    let registry = Arc::new(TransportRegistry::new(&settings.upstream));
    let api_version = settings.upstream.api_version.clone();

    let addr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Starting gRPC server on {}", addr);

    let tls_required = matches!(
        std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str(),
        "production" | "staging"
    );

    let mut builder = Server::builder();
    if settings.tls.is_configured() {
        let cert_path = settings.tls.cert_path.as_deref().unwrap_or_default();
        let key_path = settings.tls.key_path.as_deref().unwrap_or_default();
        let cert = std::fs::read(cert_path)
            .with_context(|| format!("Failed to read TLS certificate {cert_path}"))?;
        let key = std::fs::read(key_path)
            .with_context(|| format!("Failed to read TLS key {key_path}"))?;
        builder = builder
            .tls_config(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
            .context("Failed to configure server TLS")?;
        info!("Server TLS enabled");
    } else if tls_required {
        return Err(anyhow!("TLS is required in production/staging but not configured"));
    } else {
        warn!("TLS not configured - starting in plaintext (development only)");
    }

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<GatewayServiceServer<GatewayProxyServer>>()
        .await;

    builder
        .layer(BearerAuthLayer::new())
        .add_service(health_service)
        .add_service(PingServiceServer::new(PingProxyServer))
        .add_service(GatewayServiceServer::new(GatewayProxyServer::new(
            registry.clone(),
            api_version.clone(),
        )))
        .add_service(GatewayStreamingServiceServer::new(StreamingProxyServer::new(
            registry,
            api_version,
        )))
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .context("gRPC server error")?;

    info!("Gateway shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
