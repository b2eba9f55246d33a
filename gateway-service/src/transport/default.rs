//! Authenticated JSON transport used for every non-reserved path.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use super::http::{HttpDispatch, OutboundBody, OutboundRequest};
use super::{
    map_status, path, ResultStatus, Transport, TransportRequest, UnifiedResult, APP_ID,
    APP_ID_HEADER,
};
use crate::auth::CallContext;

/// Wrap an upstream 2xx body as `{"result": ...}`.
///
/// Bodies that are not already a JSON object or array are string-quoted
/// first, so a bare `5` becomes `{"result":"5"}`.
pub(super) fn wrap_payload(body: &str) -> String {
    if body.starts_with('{') || body.starts_with('[') {
        format!("{{\"result\":{}}}", body)
    } else {
        format!("{{\"result\":{}}}", serde_json::Value::String(body.to_string()))
    }
}

pub struct DefaultTransport {
    base_url: String,
    dispatcher: Arc<dyn HttpDispatch>,
}

impl DefaultTransport {
    pub fn new(base_url: String, dispatcher: Arc<dyn HttpDispatch>) -> Self {
        Self {
            base_url,
            dispatcher,
        }
    }

    fn build_request(&self, token: &str, request: &TransportRequest) -> OutboundRequest {
        let resolved = path::resolve(&request.path, &request.params);
        let url = format!("{}/api/{}{}", self.base_url, request.api_version, resolved);

        let body = if request.method.has_body() {
            let json = request
                .params
                .body()
                .map(|body| body.to_string())
                .unwrap_or_else(|| "{}".to_string());
            OutboundBody::Json(json)
        } else {
            OutboundBody::Empty
        };

        OutboundRequest {
            method: request.method,
            url,
            headers: vec![
                ("content-type", "application/json".to_string()),
                ("authorization", format!("Bearer {token}")),
                (APP_ID_HEADER, APP_ID.to_string()),
            ],
            body,
        }
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    fn kind(&self) -> &'static str {
        "default"
    }

    async fn execute(&self, ctx: &CallContext, request: TransportRequest) -> UnifiedResult {
        // Fail fast before the wire: a call that requires a token but has
        // none must not leak unauthenticated traffic upstream.
        if !ctx.has_token() {
            debug!(path = %request.path, "request ignored because no access token");
            return UnifiedResult::status(ResultStatus::NotFound);
        }
        let token = ctx.token().unwrap_or_default();

        let outbound = self.build_request(token, &request);
        debug!(url = %outbound.url, method = ?request.method, "dispatching upstream request");

        let response = match self.dispatcher.dispatch(outbound).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, path = %request.path, "upstream dispatch failed");
                return UnifiedResult::status(ResultStatus::Internal);
            }
        };

        match map_status(response.status) {
            ResultStatus::Ok => UnifiedResult::ok(wrap_payload(&response.body)),
            other => {
                debug!(status = response.status, path = %request.path, "upstream request failed");
                UnifiedResult::status(other)
            }
        }
    }
}
