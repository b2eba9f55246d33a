//! Access-token lifecycle against the gateway.
//!
//! [`TokenManager`] wraps a lazy channel to the proxy and hands out stubs
//! that carry the current credential. Stubs are cached and rebuilt whenever
//! the credential changes, so a caller holding the manager always speaks
//! with the freshest token.

use std::time::Instant;

use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

use crate::config::ClientSettings;
use crate::error::ClientError;
use crate::interceptor::BearerInterceptor;
use crate::prism::gateway::gateway_service_client::GatewayServiceClient;
use crate::prism::gateway::gateway_streaming_service_client::GatewayStreamingServiceClient;
use crate::prism::gateway::ping_service_client::PingServiceClient;
use crate::prism::gateway::{AccessToken, LoginRequest, LogoutRequest, PingRequest};

/// Channel with the bearer interceptor applied.
pub type AuthChannel = InterceptedService<Channel, BearerInterceptor>;

type ServiceStub = GatewayServiceClient<AuthChannel>;
type StreamingStub = GatewayStreamingServiceClient<AuthChannel>;

struct CachedToken {
    token: AccessToken,
    obtained_at: Instant,
    /// Built once at login so a token the metadata layer cannot carry is
    /// rejected before it is ever cached.
    interceptor: BearerInterceptor,
}

pub struct TokenManager {
    channel: Channel,
    client_id: String,
    client_secret: String,
    token: Option<CachedToken>,
    service: Option<ServiceStub>,
    streaming: Option<StreamingStub>,
}

impl TokenManager {
    /// Build a manager over a lazy channel. The connection is established on
    /// the first RPC, so this never blocks; endpoint and TLS material are
    /// still validated here.
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let mut endpoint = Endpoint::from_shared(settings.endpoint.clone())?;

        if let Some(ca_path) = &settings.ca_cert_path {
            let pem = std::fs::read(ca_path)
                .map_err(|err| ClientError::Tls(format!("failed to read {ca_path}: {err}")))?;
            let tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
            endpoint = endpoint.tls_config(tls)?;
        }

        Ok(Self {
            channel: endpoint.connect_lazy(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            token: None,
            service: None,
            streaming: None,
        })
    }

    fn interceptor(&self) -> BearerInterceptor {
        match &self.token {
            Some(cached) => cached.interceptor.clone(),
            None => BearerInterceptor::anonymous(),
        }
    }

    /// Unary stub carrying the current credential.
    pub fn service(&mut self) -> &mut ServiceStub {
        let interceptor = self.interceptor();
        let channel = self.channel.clone();
        self.service
            .get_or_insert_with(|| GatewayServiceClient::with_interceptor(channel, interceptor))
    }

    /// Streaming stub carrying the current credential.
    pub fn streaming(&mut self) -> &mut StreamingStub {
        let interceptor = self.interceptor();
        let channel = self.channel.clone();
        self.streaming.get_or_insert_with(|| {
            GatewayStreamingServiceClient::with_interceptor(channel, interceptor)
        })
    }

    /// Drop the cached stubs so the next accessor rebuilds them with the
    /// current credential.
    fn invalidate_stubs(&mut self) {
        self.service = None;
        self.streaming = None;
    }

    /// Forget the cached token without contacting the gateway.
    pub fn clear_access_token(&mut self) {
        self.token = None;
        self.invalidate_stubs();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The raw access token, when one is cached.
    pub fn access_token(&self) -> Option<&str> {
        self.token
            .as_ref()
            .map(|cached| cached.token.access_token.as_str())
    }

    /// Seconds until the cached token expires; `-1` when no token is cached.
    /// The value can go negative past expiry, which callers treat the same
    /// as absent.
    pub fn access_token_expires_in(&self) -> i64 {
        match &self.token {
            Some(cached) => cached.token.expires_in - cached.obtained_at.elapsed().as_secs() as i64,
            None => -1,
        }
    }

    /// Authenticate against the gateway and cache the returned token.
    ///
    /// Any previously cached credential is discarded before the call, so a
    /// failed login leaves the manager unauthenticated rather than holding a
    /// stale token.
    pub async fn login(&mut self) -> Result<(), ClientError> {
        self.clear_access_token();

        let request = LoginRequest {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        };
        let response = self.service().login(request).await?.into_inner();
        let token = response.result.ok_or(ClientError::MissingToken)?;
        let interceptor = BearerInterceptor::bearer(&token.access_token)?;

        debug!(expires_in = token.expires_in, "login succeeded");
        self.token = Some(CachedToken {
            token,
            obtained_at: Instant::now(),
            interceptor,
        });
        self.invalidate_stubs();
        Ok(())
    }

    /// Revoke the current session.
    ///
    /// The cached token is cleared before the RPC result is known: once
    /// revocation has been requested the local credential must not be
    /// reused, even if the gateway reports a failure.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        if self.token.is_none() {
            return Ok(());
        }

        // Bind the credentialed stub before clearing state so the revocation
        // call still carries the token being revoked.
        let mut stub = GatewayServiceClient::with_interceptor(
            self.channel.clone(),
            self.interceptor(),
        );
        self.clear_access_token();

        stub.logout(LogoutRequest {}).await?;
        debug!("logout succeeded");
        Ok(())
    }

    /// Liveness probe; needs no credential.
    pub async fn ping(&mut self) -> Result<bool, ClientError> {
        let mut stub = PingServiceClient::new(self.channel.clone());
        let response = stub.ping(PingRequest {}).await?.into_inner();
        Ok(response.healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientSettings;

    fn manager() -> TokenManager {
        let settings = ClientSettings::plaintext("http://127.0.0.1:1", "id", "secret");
        TokenManager::new(&settings).unwrap()
    }

    #[test]
    fn new_rejects_invalid_endpoint() {
        let settings = ClientSettings::plaintext("not a uri", "id", "secret");
        assert!(TokenManager::new(&settings).is_err());
    }

    #[tokio::test]
    async fn starts_unauthenticated() {
        let manager = manager();
        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());
        assert_eq!(manager.access_token_expires_in(), -1);
    }

    #[tokio::test]
    async fn clear_access_token_resets_state() {
        let mut manager = manager();
        manager.token = Some(CachedToken {
            token: AccessToken {
                access_token: "tok".into(),
                token_type: "Bearer".into(),
                expires_in: 3600,
            },
            obtained_at: Instant::now(),
            interceptor: BearerInterceptor::bearer("tok").unwrap(),
        });
        assert!(manager.is_authenticated());
        assert!(manager.access_token_expires_in() > 3590);

        manager.clear_access_token();
        assert!(!manager.is_authenticated());
        assert_eq!(manager.access_token_expires_in(), -1);
    }
}
