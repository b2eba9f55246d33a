//! Caller-side SDK for the Prism Gateway.
//!
//! [`TokenManager`] owns the access-token lifecycle against the proxy:
//! login, logout, local credential reset, and the cached stubs that carry
//! the credential on every call.

pub mod config;
pub mod error;
pub mod interceptor;
pub mod session;

// Generated protobuf types.
pub mod prism {
    pub mod gateway {
        tonic::include_proto!("prism.gateway");
    }
}

pub use config::ClientSettings;
pub use error::ClientError;
pub use interceptor::BearerInterceptor;
pub use session::TokenManager;
