//! Token lifecycle tests against an in-process gateway stub.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use gateway_client::prism::gateway::gateway_service_server::{
    GatewayService, GatewayServiceServer,
};
use gateway_client::prism::gateway::ping_service_server::{PingService, PingServiceServer};
use gateway_client::prism::gateway::{
    AccessToken, AllConnectionsRequest, ConnectionResponse, CreateConnectionRequest,
    DeleteConnectionRequest, GetConnectionRequest, LoginRequest, LoginResponse, LogoutRequest,
    LogoutResponse, PingRequest, PingResponse, UpdateConnectionRequest,
};
use gateway_client::{ClientSettings, TokenManager};

#[derive(Default)]
struct StubGateway {
    fail_logout: AtomicBool,
    non_ascii_token: AtomicBool,
    logout_calls: AtomicUsize,
    logout_auth: Mutex<Option<String>>,
}

#[tonic::async_trait]
impl GatewayService for StubGateway {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let creds = request.into_inner();
        if creds.client_id != "valid-id" || creds.client_secret != "valid-secret" {
            return Err(Status::not_found("Not found"));
        }
        let access_token = if self.non_ascii_token.load(Ordering::SeqCst) {
            "tok-\u{00e9}".to_string()
        } else {
            "stub-token".to_string()
        };
        Ok(Response::new(LoginResponse {
            result: Some(AccessToken {
                access_token,
                token_type: "Bearer".to_string(),
                expires_in: 3600,
            }),
        }))
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let auth = request
            .metadata()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        *self.logout_auth.lock().unwrap() = auth;

        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(Status::internal("upstream revocation failed"));
        }
        Ok(Response::new(LogoutResponse {
            result: "Logged out".to_string(),
        }))
    }

    async fn get_connection(
        &self,
        _request: Request<GetConnectionRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        Err(Status::unimplemented("not under test"))
    }

    async fn all_connections(
        &self,
        _request: Request<AllConnectionsRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        Err(Status::unimplemented("not under test"))
    }

    async fn create_connection(
        &self,
        _request: Request<CreateConnectionRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        Err(Status::unimplemented("not under test"))
    }

    async fn update_connection(
        &self,
        _request: Request<UpdateConnectionRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        Err(Status::unimplemented("not under test"))
    }

    async fn delete_connection(
        &self,
        _request: Request<DeleteConnectionRequest>,
    ) -> Result<Response<ConnectionResponse>, Status> {
        Err(Status::unimplemented("not under test"))
    }
}

struct StubPing;

#[tonic::async_trait]
impl PingService for StubPing {
    async fn ping(
        &self,
        _request: Request<PingRequest>,
    ) -> Result<Response<PingResponse>, Status> {
        Ok(Response::new(PingResponse { healthy: true }))
    }
}

async fn spawn_gateway(stub: Arc<StubGateway>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        Server::builder()
            .add_service(GatewayServiceServer::from_arc(stub))
            .add_service(PingServiceServer::new(StubPing))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    addr
}

fn manager_for(addr: SocketAddr, client_id: &str, client_secret: &str) -> TokenManager {
    let settings = ClientSettings::plaintext(format!("http://{addr}"), client_id, client_secret);
    TokenManager::new(&settings).unwrap()
}

#[tokio::test]
async fn login_caches_token_and_reports_expiry() {
    let stub = Arc::new(StubGateway::default());
    let addr = spawn_gateway(stub).await;
    let mut manager = manager_for(addr, "valid-id", "valid-secret");

    assert!(!manager.is_authenticated());
    manager.login().await.unwrap();

    assert!(manager.is_authenticated());
    assert_eq!(manager.access_token(), Some("stub-token"));
    let remaining = manager.access_token_expires_in();
    assert!(remaining > 3590 && remaining <= 3600);
}

#[tokio::test]
async fn failed_login_leaves_manager_unauthenticated() {
    let stub = Arc::new(StubGateway::default());
    let addr = spawn_gateway(stub).await;
    let mut manager = manager_for(addr, "wrong-id", "wrong-secret");

    let err = manager.login().await.unwrap_err();
    assert!(err.to_string().contains("Not found"));
    assert!(!manager.is_authenticated());
    assert_eq!(manager.access_token_expires_in(), -1);
}

#[tokio::test]
async fn login_with_uncarriable_token_stays_unauthenticated() {
    let stub = Arc::new(StubGateway::default());
    stub.non_ascii_token.store(true, Ordering::SeqCst);
    let addr = spawn_gateway(stub).await;
    let mut manager = manager_for(addr, "valid-id", "valid-secret");

    let err = manager.login().await.unwrap_err();
    assert!(matches!(err, gateway_client::ClientError::InvalidToken(_)));
    assert!(!manager.is_authenticated());
    assert!(manager.access_token().is_none());
}

#[tokio::test]
async fn logout_sends_bearer_and_clears_state() {
    let stub = Arc::new(StubGateway::default());
    let addr = spawn_gateway(Arc::clone(&stub)).await;
    let mut manager = manager_for(addr, "valid-id", "valid-secret");

    manager.login().await.unwrap();
    manager.logout().await.unwrap();

    assert!(!manager.is_authenticated());
    assert_eq!(stub.logout_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        stub.logout_auth.lock().unwrap().as_deref(),
        Some("Bearer stub-token")
    );
}

#[tokio::test]
async fn failed_logout_still_clears_local_state() {
    let stub = Arc::new(StubGateway::default());
    let addr = spawn_gateway(Arc::clone(&stub)).await;
    let mut manager = manager_for(addr, "valid-id", "valid-secret");

    manager.login().await.unwrap();
    stub.fail_logout.store(true, Ordering::SeqCst);

    assert!(manager.logout().await.is_err());
    assert!(!manager.is_authenticated());
    assert!(manager.access_token().is_none());
}

#[tokio::test]
async fn logout_without_token_skips_the_gateway() {
    let stub = Arc::new(StubGateway::default());
    let addr = spawn_gateway(Arc::clone(&stub)).await;
    let mut manager = manager_for(addr, "valid-id", "valid-secret");

    manager.logout().await.unwrap();
    assert_eq!(stub.logout_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ping_needs_no_credentials() {
    let stub = Arc::new(StubGateway::default());
    let addr = spawn_gateway(stub).await;
    let mut manager = manager_for(addr, "valid-id", "valid-secret");

    assert!(manager.ping().await.unwrap());
}
