//! Session-teardown transport for the reserved `/logout` path.
//!
//! Logout must never block the caller's local cleanup: an upstream non-2xx
//! is deliberately masked and reported as success. Only a hard transport
//! failure surfaces as INTERNAL. Callers relying on this soft-success policy
//! clear their cached credentials regardless of what the upstream said.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use super::http::{HttpDispatch, OutboundBody, OutboundRequest};
use super::{
    map_status, HttpMethod, ResultStatus, Transport, TransportRequest, UnifiedResult, APP_ID,
    APP_ID_HEADER,
};
use crate::auth::CallContext;

pub struct LogoutTransport {
    base_url: String,
    dispatcher: Arc<dyn HttpDispatch>,
}

impl LogoutTransport {
    pub fn new(base_url: String, dispatcher: Arc<dyn HttpDispatch>) -> Self {
        Self {
            base_url,
            dispatcher,
        }
    }
}

#[async_trait]
impl Transport for LogoutTransport {
    fn kind(&self) -> &'static str {
        "logout"
    }

    async fn execute(&self, ctx: &CallContext, request: TransportRequest) -> UnifiedResult {
        // Nothing to log out of; succeed without touching the wire.
        if !ctx.has_token() {
            debug!("no access token bound, logout is a local no-op");
            return UnifiedResult::status(ResultStatus::Ok);
        }
        let token = ctx.token().unwrap_or_default();

        let url = format!("{}/api/{}{}", self.base_url, request.api_version, request.path);
        let outbound = OutboundRequest {
            method: HttpMethod::Delete,
            url,
            headers: vec![
                ("authorization", format!("Bearer {token}")),
                (APP_ID_HEADER, APP_ID.to_string()),
            ],
            body: OutboundBody::Empty,
        };

        let response = match self.dispatcher.dispatch(outbound).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "upstream logout dispatch failed");
                return UnifiedResult::status(ResultStatus::Internal);
            }
        };

        if map_status(response.status) != ResultStatus::Ok {
            debug!(
                status = response.status,
                "upstream logout failure masked as success"
            );
            return UnifiedResult::status(ResultStatus::Ok);
        }

        if response.body.is_empty() {
            UnifiedResult::status(ResultStatus::Ok)
        } else {
            // Logout bodies are short status strings; always string-quoted,
            // never parsed as JSON.
            UnifiedResult::ok(format!(
                "{{\"result\":{}}}",
                serde_json::Value::String(response.body)
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::http::testing::FakeDispatcher;
    use super::super::Params;
    use super::*;

    fn logout_request() -> TransportRequest {
        TransportRequest::new("4.0", HttpMethod::Delete, "/logout", Params::new())
    }

    fn transport(dispatcher: Arc<FakeDispatcher>) -> LogoutTransport {
        LogoutTransport::new("https://upstream.example.com".to_string(), dispatcher)
    }

    #[tokio::test]
    async fn no_token_is_ok_without_outbound_call() {
        let dispatcher = Arc::new(FakeDispatcher::ok(200, ""));
        let transport = transport(dispatcher.clone());

        let result = transport
            .execute(&CallContext::anonymous(), logout_request())
            .await;

        assert_eq!(result.status, ResultStatus::Ok);
        assert_eq!(dispatcher.calls(), 0);
    }

    #[tokio::test]
    async fn issues_authenticated_delete() {
        let dispatcher = Arc::new(FakeDispatcher::ok(204, ""));
        let transport = transport(dispatcher.clone());

        let result = transport
            .execute(&CallContext::authenticated("tok"), logout_request())
            .await;

        assert_eq!(result.status, ResultStatus::Ok);
        let sent = dispatcher.last_request().unwrap();
        assert_eq!(sent.method, HttpMethod::Delete);
        assert_eq!(sent.url, "https://upstream.example.com/api/4.0/logout");
        assert!(sent
            .headers
            .contains(&("authorization", "Bearer tok".to_string())));
    }

    #[tokio::test]
    async fn upstream_failure_is_masked_as_success() {
        let dispatcher = Arc::new(FakeDispatcher::ok(500, "boom"));
        let transport = transport(dispatcher.clone());

        let result = transport
            .execute(&CallContext::authenticated("tok"), logout_request())
            .await;

        assert_eq!(result.status, ResultStatus::Ok);
        assert!(result.payload.is_none());
        assert_eq!(dispatcher.calls(), 1);
    }

    #[tokio::test]
    async fn response_body_is_string_quoted() {
        let dispatcher = Arc::new(FakeDispatcher::ok(200, "Logged out"));
        let transport = transport(dispatcher);

        let result = transport
            .execute(&CallContext::authenticated("tok"), logout_request())
            .await;

        assert_eq!(result.payload.as_deref(), Some("{\"result\":\"Logged out\"}"));
    }

    #[tokio::test]
    async fn hard_transport_failure_is_internal() {
        let dispatcher = Arc::new(FakeDispatcher::failing("connection reset"));
        let transport = transport(dispatcher);

        let result = transport
            .execute(&CallContext::authenticated("tok"), logout_request())
            .await;

        assert_eq!(result.status, ResultStatus::Internal);
    }
}
