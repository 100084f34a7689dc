//! Consul Client - async client for the Consul v1 HTTP API
//!
//! This crate provides:
//! - Typed clients for KV, transactions, catalog, health, agent, sessions,
//!   events, ACL, status, coordinates and prepared queries
//! - Blocking queries (`index`/`wait` long polling) with [`poll`], [`Poller`]
//!   and [`watch`] streams
//! - Session and lock coordination honouring lock delay
//! - Retry with exponential backoff for idempotent reads
//!
//! # Example
//!
//! ```no_run
//! use consul_client::{ConsulClient, ConsulClientConfig, KeyResource, Poller};
//!
//! # async fn demo() -> consul_client::Result<()> {
//! let client = ConsulClient::new(ConsulClientConfig::default())?;
//!
//! let mut poller = Poller::new(KeyResource::new(&client, "service/config"))
//!     .with_wait(std::time::Duration::from_secs(60));
//! loop {
//!     let update = poller.next().await?;
//!     println!("config now {:?}", update.value.and_then(|kv| kv.value));
//! }
//! # }
//! ```

pub mod api;
pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod lock;
pub mod resource;
pub mod retry;
pub mod transport;
pub mod watch;

pub use api::{
    AclClient, AgentClient, CatalogClient, CheckQueryOptions, CoordinateClient, EventClient,
    EventListOptions, HealthClient, HealthServiceOptions, KeyValueOptions, KvClient,
    NodeQueryOptions, PreparedQueryClient, PreparedQueryExecuteOptions, ServiceQueryOptions,
    SessionClient, StatusClient, TxnClient,
};
pub use blocking::{
    BlockingQueryOptions, BlockingResource, ConsistencyIndex, DEFAULT_BLOCKING_WAIT, Indexed,
    Poller, QueryMeta, poll,
};
pub use client::ConsulClient;
pub use config::{ConsulClientConfig, TokenPlacement};
pub use error::{ConsulError, Result};
pub use lock::{LockCoordinator, SessionState};
pub use resource::{
    EventsResource, KeyPrefixResource, KeyResource, NodesResource, ServiceHealthResource,
    ServicesResource, SessionsResource,
};
pub use retry::{OperationKind, RetryPolicy};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
pub use watch::{DEFAULT_WATCH_WAIT, WatchOptions, WatchUpdate, watch, watch_with};

// Wire models
pub use consul_api as model;
