//! gRPC handlers for the proxy surface.
//!
//! Every handler follows the same shape: read the call-scoped context, build
//! one [`TransportRequest`], route it through the registry, and translate
//! the unified result back into a response or a `Status`. The handlers hold
//! no per-call state of their own.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::auth::{CallContext, CallContextExt};
use crate::error::GatewayError;
use crate::transport::{
    HttpMethod, Params, ResultStatus, TransportRegistry, TransportRequest, UnifiedResult, BODY_KEY,
};

use super::prism::gateway::gateway_service_server::GatewayService;
use super::prism::gateway::gateway_streaming_service_server::GatewayStreamingService;
use super::prism::gateway::ping_service_server::PingService;
use super::prism::gateway::*;

/// Translate a unified result into the handler's payload, or the
/// corresponding RPC error.
fn into_payload(result: UnifiedResult) -> Result<String, Status> {
    match result.status {
        ResultStatus::Ok => Ok(result.payload.unwrap_or_else(|| "{}".to_string())),
        ResultStatus::Unauthenticated => Err(Status::unauthenticated("Access token rejected")),
        ResultStatus::NotFound => Err(Status::not_found(
            "Upstream resource not found or access token rejected",
        )),
        ResultStatus::Internal => Err(Status::internal("Upstream request failed")),
    }
}

/// Liveness service; exempt from authentication.
#[derive(Clone, Default)]
pub struct PingProxyServer;

#[tonic::async_trait]
impl PingService for PingProxyServer {
    async fn ping(&self, _request: Request<PingRequest>) -> Result<Response<PingResponse>, Status> {
        debug!("ping");
        Ok(Response::new(PingResponse { healthy: true }))
    }
}

/// Unary proxy surface: session management plus connection CRUD.
#[derive(Clone)]
pub struct GatewayProxyServer {
    registry: Arc<TransportRegistry>,
    api_version: String,
}

impl GatewayProxyServer {
    pub fn new(registry: Arc<TransportRegistry>, api_version: impl Into<String>) -> Self {
        Self {
            registry,
            api_version: api_version.into(),
        }
    }

    /// Build, route, and execute one outbound call.
    async fn proxy(
        &self,
        ctx: &CallContext,
        method: HttpMethod,
        path: &str,
        params: Params,
    ) -> Result<String, Status> {
        let request = TransportRequest::new(&self.api_version, method, path, params);
        let result = self.registry.route(path).execute(ctx, request).await;
        into_payload(result)
    }
}

#[derive(Deserialize)]
struct LoginPayload {
    result: TokenPayload,
}

#[derive(Deserialize)]
struct TokenPayload {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
}

#[tonic::async_trait]
impl GatewayService for GatewayProxyServer {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let ctx = request.call_context();
        let req = request.into_inner();

        let params = Params::new()
            .with("client_id", req.client_id)
            .with("client_secret", req.client_secret);
        let payload = self
            .proxy(&ctx, HttpMethod::Post, "/login", params)
            .await?;

        let parsed: LoginPayload = serde_json::from_str(&payload)
            .map_err(|err| GatewayError::from(err).to_status())?;
        Ok(Response::new(LoginResponse {
            result: Some(AccessToken {
                access_token: parsed.result.access_token,
                token_type: parsed.result.token_type,
                expires_in: parsed.result.expires_in,
            }),
        }))
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        let ctx = request.call_context();
        let payload = self
            .proxy(&ctx, HttpMethod::Delete, "/logout", Params::new())
            .await?;
        Ok(Response::new(LogoutResponse { result: payload }))
    }

    async fn get_connection(
        &self,
        request: Request<GetConnectionRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        let ctx = request.call_context();
        let req = request.into_inner();

        let mut params = Params::new().with("connection_name", req.connection_name);
        if !req.fields.is_empty() {
            params.push("fields", req.fields);
        }
        let payload = self
            .proxy(
                &ctx,
                HttpMethod::Get,
                "/connections/{connection_name}",
                params,
            )
            .await?;
        Ok(Response::new(ConnectionResponse { result: payload }))
    }

    async fn all_connections(
        &self,
        request: Request<AllConnectionsRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        let ctx = request.call_context();
        let req = request.into_inner();

        let mut params = Params::new();
        if !req.fields.is_empty() {
            params.push("fields", req.fields);
        }
        let payload = self
            .proxy(&ctx, HttpMethod::Get, "/connections", params)
            .await?;
        Ok(Response::new(ConnectionResponse { result: payload }))
    }

    async fn create_connection(
        &self,
        request: Request<CreateConnectionRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        let ctx = request.call_context();
        let req = request.into_inner();

        let body: serde_json::Value = serde_json::from_str(&req.connection_json)
            .map_err(|err| Status::invalid_argument(format!("connection_json: {err}")))?;
        let params = Params::new().with(BODY_KEY, body);
        let payload = self
            .proxy(&ctx, HttpMethod::Post, "/connections", params)
            .await?;
        Ok(Response::new(ConnectionResponse { result: payload }))
    }

    async fn update_connection(
        &self,
        request: Request<UpdateConnectionRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        let ctx = request.call_context();
        let req = request.into_inner();

        let body: serde_json::Value = serde_json::from_str(&req.connection_json)
            .map_err(|err| Status::invalid_argument(format!("connection_json: {err}")))?;
        let params = Params::new()
            .with("connection_name", req.connection_name)
            .with(BODY_KEY, body);
        let payload = self
            .proxy(
                &ctx,
                HttpMethod::Patch,
                "/connections/{connection_name}",
                params,
            )
            .await?;
        Ok(Response::new(ConnectionResponse { result: payload }))
    }

    async fn delete_connection(
        &self,
        request: Request<DeleteConnectionRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        let ctx = request.call_context();
        let req = request.into_inner();

        let params = Params::new().with("connection_name", req.connection_name);
        let payload = self
            .proxy(
                &ctx,
                HttpMethod::Delete,
                "/connections/{connection_name}",
                params,
            )
            .await?;
        Ok(Response::new(ConnectionResponse { result: payload }))
    }
}

/// Streaming proxy surface: one upstream call fanned out as a record stream.
#[derive(Clone)]
pub struct StreamingProxyServer {
    registry: Arc<TransportRegistry>,
    api_version: String,
}

impl StreamingProxyServer {
    pub fn new(registry: Arc<TransportRegistry>, api_version: impl Into<String>) -> Self {
        Self {
            registry,
            api_version: api_version.into(),
        }
    }
}

/// Pull the records out of a `{"result": ...}` payload. A non-array result
/// streams as a single record.
fn result_records(payload: &str) -> Result<Vec<serde_json::Value>, Status> {
    #[derive(Deserialize)]
    struct ResultPayload {
        result: serde_json::Value,
    }

    let parsed: ResultPayload =
        serde_json::from_str(payload).map_err(|err| GatewayError::from(err).to_status())?;
    Ok(match parsed.result {
        serde_json::Value::Array(records) => records,
        other => vec![other],
    })
}

#[tonic::async_trait]
impl GatewayStreamingService for StreamingProxyServer {
    type AllDashboardsStream = ReceiverStream<Result<DashboardEvent, Status>>;

    async fn all_dashboards(
        &self,
        request: Request<AllDashboardsRequest>,
    ) -> Result<Response<Self::AllDashboardsStream>, Status> {
        let ctx = request.call_context();
        let req = request.into_inner();

        let mut params = Params::new();
        if !req.fields.is_empty() {
            params.push("fields", req.fields);
        }
        let transport_request =
            TransportRequest::new(&self.api_version, HttpMethod::Get, "/dashboards", params);
        let result = self
            .registry
            .route("/dashboards")
            .execute(&ctx, transport_request)
            .await;
        let payload = into_payload(result)?;
        let records = result_records(&payload)?;
        debug!(count = records.len(), "streaming dashboards");

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for record in records {
                let event = DashboardEvent {
                    dashboard_json: record.to_string(),
                };
                if tx.send(Ok(event)).await.is_err() {
                    // Receiver dropped; the inbound call is gone.
                    break;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
