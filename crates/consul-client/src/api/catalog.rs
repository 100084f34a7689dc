// Catalog client

use std::sync::Arc;

use consul_api::catalog::ServiceTagsList;
use consul_api::constants::{api_path, param};
use consul_api::{
    CatalogDeregistration, CatalogRegistration, CatalogService, Node, NodeServices, ServiceTags,
};

use crate::blocking::{BlockingQueryOptions, Indexed};
use crate::client::Requester;
use crate::error::Result;
use crate::transport::HttpRequest;

/// Parameters of node listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeQueryOptions {
    /// Sort by round-trip time from this node (`_agent` for the local agent)
    pub near: Option<String>,
    pub blocking: BlockingQueryOptions,
}

impl NodeQueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_near(mut self, near: &str) -> Self {
        self.near = Some(near.to_string());
        self
    }

    pub fn with_blocking(mut self, blocking: BlockingQueryOptions) -> Self {
        self.blocking = blocking;
        self
    }
}

/// Parameters of service instance listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceQueryOptions {
    /// Only instances carrying this tag
    pub tag: Option<String>,
    pub near: Option<String>,
    pub blocking: BlockingQueryOptions,
}

impl ServiceQueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_near(mut self, near: &str) -> Self {
        self.near = Some(near.to_string());
        self
    }

    pub fn with_blocking(mut self, blocking: BlockingQueryOptions) -> Self {
        self.blocking = blocking;
        self
    }
}

#[derive(Clone)]
pub struct CatalogClient {
    requester: Arc<Requester>,
}

impl CatalogClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Known datacenters, nearest first
    pub async fn datacenters(&self) -> Result<Vec<String>> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::CATALOG_DATACENTERS))
            .await?;
        Ok(result.value)
    }

    pub async fn nodes(&self, options: &NodeQueryOptions) -> Result<Indexed<Vec<Node>>> {
        let request = options.blocking.apply(
            HttpRequest::get(api_path::CATALOG_NODES)
                .query_opt(param::NEAR, options.near.as_deref()),
        );
        self.requester.read(request).await
    }

    /// Registered services with their tags, in the order Consul returns them
    pub async fn services(
        &self,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Vec<ServiceTags>>> {
        let request = options.apply(HttpRequest::get(api_path::CATALOG_SERVICES));
        let result = self.requester.read::<ServiceTagsList>(request).await?;
        Ok(result.map(|list| list.0))
    }

    /// Instances of `service` across all nodes
    pub async fn service_nodes(
        &self,
        service: &str,
        options: &ServiceQueryOptions,
    ) -> Result<Indexed<Vec<CatalogService>>> {
        let request = options.blocking.apply(
            HttpRequest::get(api_path::CATALOG_SERVICE)
                .segment(service)
                .query_opt(param::TAG, options.tag.as_deref())
                .query_opt(param::NEAR, options.near.as_deref()),
        );
        self.requester.read(request).await
    }

    /// Services registered on `node`; `None` if the node is unknown
    pub async fn node_services(
        &self,
        node: &str,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Option<NodeServices>>> {
        let request = options.apply(HttpRequest::get(api_path::CATALOG_NODE).segment(node));
        self.requester.read(request).await
    }

    pub async fn register(&self, registration: &CatalogRegistration) -> Result<()> {
        let request = HttpRequest::put(api_path::CATALOG_REGISTER).json(registration)?;
        self.requester.write_empty(request).await
    }

    pub async fn deregister(&self, deregistration: &CatalogDeregistration) -> Result<()> {
        let request = HttpRequest::put(api_path::CATALOG_DEREGISTER).json(deregistration)?;
        self.requester.write_empty(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{ScriptedTransport, client_with};
    use crate::transport::HttpResponse;

    #[tokio::test]
    async fn test_services_keep_order() {
        let body = r#"{"zeta":["a"],"alpha":null,"mid":["x","y"]}"#;
        let transport = ScriptedTransport::new(vec![Ok(
            HttpResponse::new(200, body).with_header("X-Consul-Index", "31")
        )]);
        let client = client_with(transport);

        let services = client
            .catalog()
            .services(&BlockingQueryOptions::new())
            .await
            .unwrap();
        let names: Vec<_> = services.value.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert!(services.value[1].tags.is_empty());
        assert_eq!(services.index().map(|i| i.value()), Some(31));
    }

    #[tokio::test]
    async fn test_unknown_node_is_none() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, "null"))]);
        let client = client_with(transport);

        let result = client
            .catalog()
            .node_services("ghost", &BlockingQueryOptions::new())
            .await
            .unwrap();
        assert!(result.value.is_none());
    }

    #[tokio::test]
    async fn test_service_nodes_filters_are_query_params() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, "[]"))]);
        let client = client_with(transport.clone());

        let opts = ServiceQueryOptions::new().with_tag("v2").with_near("_agent");
        client.catalog().service_nodes("web", &opts).await.unwrap();

        let requests = transport.requests.lock();
        assert_eq!(requests[0].display_path(), "/v1/catalog/service/web");
        assert_eq!(
            requests[0].query,
            vec![
                ("tag".to_string(), "v2".to_string()),
                ("near".to_string(), "_agent".to_string())
            ]
        );
    }
}
