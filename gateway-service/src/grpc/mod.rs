//! Inbound gRPC surface.

pub mod server;

// Generated protobuf types.
pub mod prism {
    pub mod gateway {
        tonic::include_proto!("prism.gateway");
    }
}

pub use server::{GatewayProxyServer, PingProxyServer, StreamingProxyServer};
