//! Prism Gateway: an authenticated gRPC→REST translation proxy.
//!
//! Each inbound RPC is authenticated by the bearer-auth layer, translated
//! into exactly one upstream HTTP/JSON request, and the upstream outcome is
//! mapped back onto the RPC status space.

pub mod auth;
pub mod config;
pub mod error;
pub mod grpc;
pub mod transport;
