use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("RPC failed: {0}")]
    Rpc(#[from] tonic::Status),

    #[error("Login response carried no access token")]
    MissingToken,

    #[error("Access token cannot be carried as request metadata: {0}")]
    InvalidToken(String),
}
