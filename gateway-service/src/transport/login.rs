//! Credential-exchange transport for the reserved `/login` path.
//!
//! Login is the one call that needs no token and the one call that is
//! form-encoded instead of JSON: the upstream login endpoint takes flat
//! `client_id`/`client_secret` form fields.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use super::http::{HttpDispatch, OutboundBody, OutboundRequest};
use super::{
    map_status, HttpMethod, ResultStatus, Transport, TransportRequest, UnifiedResult, APP_ID,
    APP_ID_HEADER,
};
use crate::auth::CallContext;

pub struct LoginTransport {
    base_url: String,
    dispatcher: Arc<dyn HttpDispatch>,
}

impl LoginTransport {
    pub fn new(base_url: String, dispatcher: Arc<dyn HttpDispatch>) -> Self {
        Self {
            base_url,
            dispatcher,
        }
    }
}

#[async_trait]
impl Transport for LoginTransport {
    fn kind(&self) -> &'static str {
        "login"
    }

    async fn execute(&self, _ctx: &CallContext, request: TransportRequest) -> UnifiedResult {
        // Every login parameter goes on the wire as a flat form field; a
        // structured value here is a caller bug, failed locally.
        let mut form = Vec::with_capacity(request.params.iter().count());
        for (key, value) in request.params.iter() {
            match value.as_scalar() {
                Some(scalar) => form.push((key.to_string(), scalar)),
                None => {
                    error!(key, "login parameter must be a plain string");
                    return UnifiedResult::status(ResultStatus::Internal);
                }
            }
        }

        // No path templating on the reserved login path.
        let url = format!("{}/api/{}{}", self.base_url, request.api_version, request.path);
        let outbound = OutboundRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![(APP_ID_HEADER, APP_ID.to_string())],
            body: OutboundBody::Form(form),
        };

        let response = match self.dispatcher.dispatch(outbound).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "upstream login dispatch failed");
                return UnifiedResult::status(ResultStatus::Internal);
            }
        };

        match map_status(response.status) {
            ResultStatus::Ok => {
                debug!("upstream login succeeded");
                UnifiedResult::ok(format!("{{\"result\":{}}}", response.body))
            }
            other => {
                debug!(status = response.status, "upstream login failed");
                UnifiedResult::status(other)
            }
        }
    }
}
