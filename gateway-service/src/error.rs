use thiserror::Error;
use tonic::{Code, Status};

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid upstream payload: {0}")]
    InvalidPayload(String),

    #[error("Upstream returned no payload")]
    EmptyPayload,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Convert to gRPC Status for the wire protocol.
    pub fn to_status(&self) -> Status {
        match self {
            GatewayError::InvalidPayload(msg) => {
                Status::new(Code::Internal, format!("Invalid upstream payload: {msg}"))
            }
            GatewayError::EmptyPayload => {
                Status::new(Code::Internal, "Upstream returned no payload")
            }
            // Configuration problems never reach the wire in normal
            // operation; don't leak details if one does.
            GatewayError::Config(_) | GatewayError::Internal(_) => {
                Status::new(Code::Internal, "Internal server error")
            }
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::InvalidPayload(err.to_string())
    }
}

impl From<GatewayError> for Status {
    fn from(err: GatewayError) -> Self {
        err.to_status()
    }
}
