//! Tower middleware enforcing bearer authentication on the gRPC surface.
//!
//! Wraps the whole tonic server. The method name is taken from the last
//! segment of the request URI; methods in [`UNSECURED_METHODS`] pass without
//! a credential, everything else is rejected before any handler runs.

use std::collections::HashSet;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{HeaderMap, HeaderValue};
use tonic::body::{empty_body, BoxBody};
use tonic::Status;
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::CallContext;

/// Method names exempt from inbound authentication. `Check`/`Watch` are the
/// grpc.health.v1 probes.
pub const UNSECURED_METHODS: &[&str] = &["Ping", "Login", "Check", "Watch"];

/// Validate the `authorization` header for one inbound call.
///
/// Returns the call context to bind, or the `UNAUTHENTICATED` status to
/// reject with. Pure over (method name, headers) so it is unit-testable
/// without a server.
fn authorize(
    method: &str,
    headers: &HeaderMap,
    unsecured: &HashSet<&'static str>,
) -> Result<CallContext, Status> {
    let header = match headers.get(http::header::AUTHORIZATION) {
        None => {
            if unsecured.contains(method) {
                debug!(method, "unsecured method, proceeding without token");
                return Ok(CallContext::anonymous());
            }
            warn!(method, "missing authorization header");
            return Err(Status::unauthenticated("Authorization token is missing"));
        }
        Some(header) => header,
    };

    let value = header.to_str().map_err(|err| {
        warn!(method, error = %err, "unreadable authorization header");
        Status::unauthenticated(format!("Invalid authorization header: {err}"))
    })?;

    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        warn!(method, "authorization header with unknown scheme");
        Status::unauthenticated("Unknown authorization type")
    })?;

    debug!(method, has_token = true, "bearer token bound to call");
    Ok(CallContext::authenticated(token.trim()))
}

/// Trailers-only gRPC rejection response.
fn rejection(status: Status) -> http::Response<BoxBody> {
    let mut response = http::Response::new(empty_body());
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/grpc"),
    );
    response
        .headers_mut()
        .insert("grpc-status", HeaderValue::from(status.code() as i32));
    if let Ok(message) = HeaderValue::from_str(status.message()) {
        response.headers_mut().insert("grpc-message", message);
    }
    response
}

#[derive(Clone)]
pub struct BearerAuthLayer {
    unsecured: HashSet<&'static str>,
}

impl BearerAuthLayer {
    pub fn new() -> Self {
        Self {
            unsecured: UNSECURED_METHODS.iter().copied().collect(),
        }
    }
}

impl Default for BearerAuthLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            unsecured: self.unsecured.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    unsecured: HashSet<&'static str>,
}

type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

impl<S> Service<http::Request<BoxBody>> for BearerAuthService<S>
where
    S: Service<http::Request<BoxBody>, Response = http::Response<BoxBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: http::Request<BoxBody>) -> Self::Future {
        // Take the service that was driven to readiness; leave a fresh clone
        // behind for the next call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let method = request
            .uri()
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        match authorize(&method, request.headers(), &self.unsecured) {
            Ok(ctx) => {
                request.extensions_mut().insert(ctx);
                Box::pin(async move { inner.call(request).await })
            }
            Err(status) => Box::pin(async move { Ok(rejection(status)) }),
        }
    }
}
