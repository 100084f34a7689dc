// Health client

use std::sync::Arc;

use consul_api::constants::{api_path, param};
use consul_api::{HealthCheck, HealthState, ServiceEntry};

use crate::blocking::{BlockingQueryOptions, Indexed};
use crate::client::Requester;
use crate::error::Result;
use crate::transport::HttpRequest;

/// Parameters of check listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckQueryOptions {
    pub near: Option<String>,
    pub blocking: BlockingQueryOptions,
}

impl CheckQueryOptions {
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

/// Parameters of `/v1/health/service/:service`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthServiceOptions {
    pub tag: Option<String>,
    pub near: Option<String>,
    /// Ask the server to drop instances with any non-passing check
    pub passing: bool,
    pub blocking: BlockingQueryOptions,
}

impl HealthServiceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passing_only() -> Self {
        Self {
            passing: true,
            ..Default::default()
        }
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
pub struct HealthClient {
    requester: Arc<Requester>,
}

impl HealthClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Checks associated with `service`
    pub async fn checks(
        &self,
        service: &str,
        options: &CheckQueryOptions,
    ) -> Result<Indexed<Vec<HealthCheck>>> {
        let request = options.blocking.apply(
            HttpRequest::get(api_path::HEALTH_CHECKS)
                .segment(service)
                .query_opt(param::NEAR, options.near.as_deref()),
        );
        self.requester.read(request).await
    }

    /// Checks registered on `node`
    pub async fn node_checks(
        &self,
        node: &str,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Vec<HealthCheck>>> {
        let request = options.apply(HttpRequest::get(api_path::HEALTH_NODE).segment(node));
        self.requester.read(request).await
    }

    /// Checks currently in `state`
    pub async fn state(
        &self,
        state: HealthState,
        options: &CheckQueryOptions,
    ) -> Result<Indexed<Vec<HealthCheck>>> {
        let request = options.blocking.apply(
            HttpRequest::get(api_path::HEALTH_STATE)
                .segment(state.as_str())
                .query_opt(param::NEAR, options.near.as_deref()),
        );
        self.requester.read(request).await
    }

    /// Instances of `service` with their node and checks
    pub async fn service_nodes(
        &self,
        service: &str,
        options: &HealthServiceOptions,
    ) -> Result<Indexed<Vec<ServiceEntry>>> {
        let request = options.blocking.apply(
            HttpRequest::get(api_path::HEALTH_SERVICE)
                .segment(service)
                .query_opt(param::TAG, options.tag.as_deref())
                .query_opt(param::NEAR, options.near.as_deref())
                .flag(param::PASSING, options.passing),
        );
        self.requester.read(request).await
    }
}

#[cfg(test)]
mod tests {
    use consul_api::CheckStatus;

    use super::*;
    use crate::client::tests::{ScriptedTransport, client_with};
    use crate::transport::HttpResponse;

    #[tokio::test]
    async fn test_service_nodes_passing_param() {
        let body = r#"[{
            "Node": {"ID": "n1", "Node": "node-1", "Address": "10.0.0.1", "Datacenter": "dc1"},
            "Service": {"ID": "web-1", "Service": "web", "Tags": ["v1"], "Port": 80},
            "Checks": [
                {"Node": "node-1", "CheckID": "serfHealth", "Name": "Serf", "Status": "passing"},
                {"Node": "node-1", "CheckID": "service:web-1", "Name": "web", "Status": "warning"}
            ]
        }]"#;
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, body))]);
        let client = client_with(transport.clone());

        let entries = client
            .health()
            .service_nodes("web", &HealthServiceOptions::passing_only())
            .await
            .unwrap();
        assert_eq!(entries.value.len(), 1);
        assert_eq!(entries.value[0].aggregated_status(), CheckStatus::Warning);

        let requests = transport.requests.lock();
        assert_eq!(requests[0].display_path(), "/v1/health/service/web");
        assert!(requests[0].has_query("passing"));
    }

    #[tokio::test]
    async fn test_state_path() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, "[]"))]);
        let client = client_with(transport.clone());

        client
            .health()
            .state(HealthState::Critical, &CheckQueryOptions::new())
            .await
            .unwrap();
        assert_eq!(
            transport.requests.lock()[0].display_path(),
            "/v1/health/state/critical"
        );
    }
}
