// Watchable resources for `poll`, `Poller` and `watch`

use async_trait::async_trait;
use consul_api::{KeyValue, Node, ServiceEntry, ServiceTags, Session, UserEvent};

use crate::api::{
    CatalogClient, EventClient, EventListOptions, HealthClient, HealthServiceOptions, KvClient,
    NodeQueryOptions, SessionClient,
};
use crate::blocking::{BlockingQueryOptions, BlockingResource, Indexed};
use crate::client::ConsulClient;
use crate::error::Result;

/// A single KV key
pub struct KeyResource {
    kv: KvClient,
    key: String,
}

impl KeyResource {
    pub fn new(client: &ConsulClient, key: &str) -> Self {
        Self {
            kv: client.kv(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl BlockingResource for KeyResource {
    type Output = Option<KeyValue>;

    async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<Option<KeyValue>>> {
        self.kv.get_value(&self.key, options).await
    }

    fn describe(&self) -> String {
        format!("key {}", self.key)
    }
}

/// Every key under a prefix
pub struct KeyPrefixResource {
    kv: KvClient,
    prefix: String,
}

impl KeyPrefixResource {
    pub fn new(client: &ConsulClient, prefix: &str) -> Self {
        Self {
            kv: client.kv(),
            prefix: prefix.to_string(),
        }
    }
}

#[async_trait]
impl BlockingResource for KeyPrefixResource {
    type Output = Vec<KeyValue>;

    async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<Vec<KeyValue>>> {
        self.kv.get_values(&self.prefix, options).await
    }

    fn describe(&self) -> String {
        format!("prefix {}", self.prefix)
    }
}

/// The catalog's service list
pub struct ServicesResource {
    catalog: CatalogClient,
}

impl ServicesResource {
    pub fn new(client: &ConsulClient) -> Self {
        Self {
            catalog: client.catalog(),
        }
    }
}

#[async_trait]
impl BlockingResource for ServicesResource {
    type Output = Vec<ServiceTags>;

    async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<Vec<ServiceTags>>> {
        self.catalog.services(options).await
    }

    fn describe(&self) -> String {
        "catalog services".to_string()
    }
}

/// The catalog's node list
pub struct NodesResource {
    catalog: CatalogClient,
}

impl NodesResource {
    pub fn new(client: &ConsulClient) -> Self {
        Self {
            catalog: client.catalog(),
        }
    }
}

#[async_trait]
impl BlockingResource for NodesResource {
    type Output = Vec<Node>;

    async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<Vec<Node>>> {
        let options = NodeQueryOptions::new().with_blocking(options.clone());
        self.catalog.nodes(&options).await
    }

    fn describe(&self) -> String {
        "catalog nodes".to_string()
    }
}

/// Health entries of one service
pub struct ServiceHealthResource {
    health: HealthClient,
    service: String,
    passing: bool,
}

impl ServiceHealthResource {
    /// All instances, whatever their check status
    pub fn new(client: &ConsulClient, service: &str) -> Self {
        Self {
            health: client.health(),
            service: service.to_string(),
            passing: false,
        }
    }

    /// Only instances whose checks all pass
    pub fn passing(client: &ConsulClient, service: &str) -> Self {
        Self {
            passing: true,
            ..Self::new(client, service)
        }
    }
}

#[async_trait]
impl BlockingResource for ServiceHealthResource {
    type Output = Vec<ServiceEntry>;

    async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<Vec<ServiceEntry>>> {
        let options = HealthServiceOptions {
            passing: self.passing,
            blocking: options.clone(),
            ..Default::default()
        };
        self.health.service_nodes(&self.service, &options).await
    }

    fn describe(&self) -> String {
        format!("health of {}", self.service)
    }
}

/// User events, optionally filtered by name
pub struct EventsResource {
    event: EventClient,
    name: Option<String>,
}

impl EventsResource {
    pub fn new(client: &ConsulClient, name: Option<&str>) -> Self {
        Self {
            event: client.event(),
            name: name.map(|n| n.to_string()),
        }
    }
}

#[async_trait]
impl BlockingResource for EventsResource {
    type Output = Vec<UserEvent>;

    async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<Vec<UserEvent>>> {
        let options = EventListOptions {
            name: self.name.clone(),
            blocking: options.clone(),
        };
        self.event.list_events(&options).await
    }

    fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("events {}", name),
            None => "events".to_string(),
        }
    }
}

/// All sessions in the datacenter
pub struct SessionsResource {
    session: SessionClient,
}

impl SessionsResource {
    pub fn new(client: &ConsulClient) -> Self {
        Self {
            session: client.session(),
        }
    }
}

#[async_trait]
impl BlockingResource for SessionsResource {
    type Output = Vec<Session>;

    async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<Vec<Session>>> {
        self.session.list_sessions(options).await
    }

    fn describe(&self) -> String {
        "sessions".to_string()
    }
}
