// ConsulClient - entry point holding the shared transport
//
// Resource clients are cheap handles over the same `Requester`; cloning the
// facade or any handle shares one connection pool.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::error;

use crate::api::{
    AclClient, AgentClient, CatalogClient, CoordinateClient, EventClient, HealthClient, KvClient,
    PreparedQueryClient, SessionClient, StatusClient, TxnClient,
};
use crate::blocking::{Indexed, QueryMeta};
use crate::config::ConsulClientConfig;
use crate::error::{ConsulError, Result};
use crate::retry::{OperationKind, RetryPolicy, with_retry};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Transport};

/// Typed request execution shared by all resource clients
pub(crate) struct Requester {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl Requester {
    pub(crate) fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    pub(crate) async fn send(
        &self,
        kind: OperationKind,
        request: HttpRequest,
    ) -> Result<HttpResponse> {
        let what = request.to_string();
        with_retry(&self.retry, kind, &what, || {
            self.transport.execute(request.clone())
        })
        .await
    }

    /// GET-style read decoded from JSON
    pub(crate) async fn read<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<Indexed<T>> {
        let response = self.send(OperationKind::Read, request).await?;
        let meta = QueryMeta::from_headers(&response.headers);
        Ok(Indexed::new(decode(&response)?, meta))
    }

    /// Like `read`, but a 404 yields `None` with the index the agent reported
    pub(crate) async fn read_optional<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<Indexed<Option<T>>> {
        match self.send(OperationKind::Read, request).await {
            Ok(response) => {
                let meta = QueryMeta::from_headers(&response.headers);
                Ok(Indexed::new(Some(decode(&response)?), meta))
            }
            Err(ConsulError::Api {
                status: 404, index, ..
            }) => Ok(Indexed::new(None, QueryMeta::with_index(index))),
            Err(e) => Err(e),
        }
    }

    /// Mutation decoded from JSON
    pub(crate) async fn write<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let response = self.send(OperationKind::Write, request).await?;
        decode(&response)
    }

    /// Like `write`, but a 404 yields `None`
    pub(crate) async fn write_optional<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<Option<T>> {
        match self.send(OperationKind::Write, request).await {
            Ok(response) => Ok(Some(decode(&response)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Mutation whose response body is ignored
    pub(crate) async fn write_empty(&self, request: HttpRequest) -> Result<()> {
        self.send(OperationKind::Write, request).await?;
        Ok(())
    }

    /// Mutation answering a bare `true` or `false`
    pub(crate) async fn write_bool(&self, request: HttpRequest) -> Result<bool> {
        let response = self.send(OperationKind::Write, request).await?;
        match response.text().trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ConsulError::InvalidRequest(format!(
                "expected true or false, got '{}'",
                other
            ))),
        }
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| {
        error!(
            "Failed to decode response: {}, body={}",
            e,
            response.text()
        );
        ConsulError::Decode(e)
    })
}

/// Consul HTTP API client
///
/// # Example
///
/// ```no_run
/// use consul_client::{ConsulClient, ConsulClientConfig};
///
/// # async fn demo() -> consul_client::Result<()> {
/// let client = ConsulClient::new(ConsulClientConfig::new("127.0.0.1", 8500))?;
/// client.kv().put_value("app/mode", "active", None).await?;
/// let entry = client.kv().get_value("app/mode", &Default::default()).await?;
/// assert_eq!(entry.value.and_then(|kv| kv.value), Some(b"active".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConsulClient {
    requester: Arc<Requester>,
    config: Arc<ConsulClientConfig>,
}

impl ConsulClient {
    /// Create a client talking HTTP to the configured agent
    pub fn new(config: ConsulClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: ConsulClientConfig, transport: Arc<dyn Transport>) -> Self {
        let requester = Requester::new(transport, config.retry.clone());
        Self {
            requester: Arc::new(requester),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ConsulClientConfig {
        &self.config
    }

    pub fn kv(&self) -> KvClient {
        KvClient::new(self.requester.clone())
    }

    pub fn txn(&self) -> TxnClient {
        TxnClient::new(self.requester.clone())
    }

    pub fn catalog(&self) -> CatalogClient {
        CatalogClient::new(self.requester.clone())
    }

    pub fn health(&self) -> HealthClient {
        HealthClient::new(self.requester.clone())
    }

    pub fn agent(&self) -> AgentClient {
        AgentClient::new(self.requester.clone())
    }

    pub fn session(&self) -> SessionClient {
        SessionClient::new(self.requester.clone())
    }

    pub fn event(&self) -> EventClient {
        EventClient::new(self.requester.clone())
    }

    pub fn acl(&self) -> AclClient {
        AclClient::new(self.requester.clone())
    }

    pub fn status(&self) -> StatusClient {
        StatusClient::new(self.requester.clone())
    }

    pub fn coordinate(&self) -> CoordinateClient {
        CoordinateClient::new(self.requester.clone())
    }

    pub fn query(&self) -> PreparedQueryClient {
        PreparedQueryClient::new(self.requester.clone())
    }
}
