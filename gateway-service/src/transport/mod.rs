//! Outbound transport layer: translates one inbound RPC into one upstream
//! HTTP request and classifies the outcome.
//!
//! The layer is split into three variants sharing a single HTTP client:
//!
//! - [`DefaultTransport`] — authenticated JSON calls for every ordinary path
//! - [`LoginTransport`] — unauthenticated, form-encoded credential exchange
//! - [`LogoutTransport`] — authenticated DELETE whose upstream failures are
//!   masked as success so local cleanup is never blocked
//!
//! Routing between them is done by an explicit [`TransportRegistry`] built
//! once at startup and shared by reference; there is no global factory.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::CallContext;
use crate::config::UpstreamSettings;

mod default;
pub mod http;
mod login;
mod logout;
pub mod path;
pub mod status;

pub use default::DefaultTransport;
pub use login::LoginTransport;
pub use logout::LogoutTransport;
pub use status::{map_status, ResultStatus};

use self::http::{HttpDispatch, ReqwestDispatcher};

/// Header naming the calling application on every outbound request.
pub const APP_ID_HEADER: &str = "x-prism-appid";
pub const APP_ID: &str = "Prism gRPC Gateway";

/// Parameter key reserved for the request body; never templated or
/// query-encoded.
pub const BODY_KEY: &str = "body";

/// HTTP verb selected for an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Verbs that carry a JSON request body.
    pub fn has_body(self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single input parameter value.
///
/// Scalars are eligible for path templating and query encoding; `Body` is an
/// opaque structured payload reserved for the request body. Distinguishing
/// the two statically means the templater never has to inspect runtime
/// types.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Body(Value),
}

impl ParamValue {
    /// Stringified form of a scalar value; `None` for structured bodies.
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            ParamValue::Str(s) => Some(s.clone()),
            ParamValue::Int(i) => Some(i.to_string()),
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::Body(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::Body(value)
    }
}

/// Ordered parameter list for one outbound call.
///
/// Insertion order is preserved so query-string construction is
/// deterministic and mirrors the order the caller supplied the parameters.
#[derive(Debug, Clone, Default)]
pub struct Params(Vec<(String, ParamValue)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.push((key.into(), value.into()));
    }

    /// Builder-style variant of [`Params::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.push(key, value);
        self
    }

    /// The structured body payload, if one was supplied under the reserved
    /// `body` key.
    pub fn body(&self) -> Option<&Value> {
        self.0.iter().find_map(|(key, value)| match value {
            ParamValue::Body(body) if key == BODY_KEY => Some(body),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One outbound request, built once per inbound call.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub api_version: String,
    pub method: HttpMethod,
    /// Path template, e.g. `/connections/{connection_name}`.
    pub path: String,
    pub params: Params,
}

impl TransportRequest {
    pub fn new(
        api_version: impl Into<String>,
        method: HttpMethod,
        path: impl Into<String>,
        params: Params,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            method,
            path: path.into(),
            params,
        }
    }
}

/// Terminal artifact of a transport execution.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedResult {
    pub status: ResultStatus,
    pub payload: Option<String>,
}

impl UnifiedResult {
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Ok,
            payload: Some(payload.into()),
        }
    }

    pub fn status(status: ResultStatus) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Ok
    }
}

/// A transport builds and executes exactly one upstream HTTP request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short variant name, used in logs.
    fn kind(&self) -> &'static str;

    async fn execute(&self, ctx: &CallContext, request: TransportRequest) -> UnifiedResult;
}

/// Explicit transport registry: constructed once at startup and passed by
/// reference to every handler that needs routing.
pub struct TransportRegistry {
    default: DefaultTransport,
    login: LoginTransport,
    logout: LogoutTransport,
}

impl TransportRegistry {
    pub fn new(settings: &UpstreamSettings) -> Self {
        let dispatcher: Arc<dyn HttpDispatch> =
            Arc::new(ReqwestDispatcher::new(settings.verify_tls));
        Self::with_dispatcher(settings, dispatcher)
    }

    /// Construct with a caller-supplied dispatcher. Tests use this to count
    /// and fake outbound calls.
    pub fn with_dispatcher(settings: &UpstreamSettings, dispatcher: Arc<dyn HttpDispatch>) -> Self {
        Self {
            default: DefaultTransport::new(settings.base_url.clone(), dispatcher.clone()),
            login: LoginTransport::new(settings.base_url.clone(), dispatcher.clone()),
            logout: LogoutTransport::new(settings.base_url.clone(), dispatcher),
        }
    }

    /// Select the transport for an outbound path. `/login` and `/logout`
    /// are reserved prefixes; everything else takes the default transport.
    pub fn route(&self, path: &str) -> &dyn Transport {
        if path.starts_with("/login") {
            &self.login
        } else if path.starts_with("/logout") {
            &self.logout
        } else {
            &self.default
        }
    }
}
