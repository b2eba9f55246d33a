//! Client-side bearer injection.
//!
//! A single interceptor type covers both stub flavors: anonymous (before
//! login) and credentialed (after). That keeps the cached stub type uniform
//! while the manager swaps interceptors across the login boundary.

use tonic::metadata::AsciiMetadataValue;
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::error::ClientError;

#[derive(Clone, Debug)]
pub struct BearerInterceptor {
    /// Pre-formatted `Bearer {token}` value; `None` sends no header.
    auth_header: Option<AsciiMetadataValue>,
}

impl BearerInterceptor {
    /// Interceptor that injects no credential.
    pub fn anonymous() -> Self {
        Self { auth_header: None }
    }

    /// Interceptor injecting `authorization: Bearer {token}`.
    ///
    /// Access tokens are opaque ASCII strings; a token that cannot be
    /// carried as metadata is rejected here so it is never cached or sent.
    pub fn bearer(token: &str) -> Result<Self, ClientError> {
        let value = AsciiMetadataValue::try_from(format!("Bearer {token}"))
            .map_err(|err| ClientError::InvalidToken(err.to_string()))?;
        Ok(Self {
            auth_header: Some(value),
        })
    }
}

impl Interceptor for BearerInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(header) = &self.auth_header {
            request.metadata_mut().insert("authorization", header.clone());
        }
        Ok(request)
    }
}
