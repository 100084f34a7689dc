// Local agent client: services, checks and maintenance mode

use std::collections::HashMap;
use std::sync::Arc;

use consul_api::constants::{api_path, param};
use consul_api::{
    AgentService, CheckOptions, CheckStatus, CheckUpdate, HealthCheck, ServiceRegistration,
};
use serde_json::Value;
use tracing::debug;

use crate::client::Requester;
use crate::error::{ConsulError, Result};
use crate::transport::HttpRequest;

#[derive(Clone)]
pub struct AgentClient {
    requester: Arc<Requester>,
}

impl AgentClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Raw `/v1/agent/self` document (`Config`, `Member`, `Stats`, ...)
    pub async fn info(&self) -> Result<Value> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::AGENT_SELF))
            .await?;
        Ok(result.value)
    }

    /// Services registered with this agent, keyed by service ID
    pub async fn services(&self) -> Result<HashMap<String, AgentService>> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::AGENT_SERVICES))
            .await?;
        Ok(result.value)
    }

    /// One locally registered service; `None` if the ID is unknown
    pub async fn service(&self, service_id: &str) -> Result<Option<AgentService>> {
        let result = self
            .requester
            .read_optional(HttpRequest::get(api_path::AGENT_SERVICE).segment(service_id))
            .await?;
        Ok(result.value)
    }

    /// Checks registered with this agent, keyed by check ID
    pub async fn checks(&self) -> Result<HashMap<String, HealthCheck>> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::AGENT_CHECKS))
            .await?;
        Ok(result.value)
    }

    pub async fn register_service(&self, registration: &ServiceRegistration) -> Result<()> {
        if registration.name.is_empty() {
            return Err(ConsulError::InvalidRequest(
                "service name must not be empty".into(),
            ));
        }
        let request = HttpRequest::put(api_path::AGENT_SERVICE_REGISTER).json(registration)?;
        self.requester.write_empty(request).await
    }

    /// Remove a service; removing an unknown service is not an error
    pub async fn deregister_service(&self, service_id: &str) -> Result<()> {
        let request = HttpRequest::put(api_path::AGENT_SERVICE_DEREGISTER).segment(service_id);
        match self.requester.write_empty(request).await {
            Err(e) if e.is_not_found() => {
                debug!("service {} was not registered", service_id);
                Ok(())
            }
            other => other,
        }
    }

    /// Toggle maintenance mode for a service
    pub async fn maintenance_service(
        &self,
        service_id: &str,
        enable: bool,
        reason: Option<&str>,
    ) -> Result<()> {
        let request = HttpRequest::put(api_path::AGENT_SERVICE_MAINTENANCE)
            .segment(service_id)
            .query(param::ENABLE, enable)
            .query_opt(param::REASON, reason);
        self.requester.write_empty(request).await
    }

    /// Register a standalone check
    pub async fn register_check(&self, check: &CheckOptions) -> Result<()> {
        if check.name.is_empty() {
            return Err(ConsulError::InvalidRequest("check name must not be empty".into()));
        }
        // the standalone endpoint names the identifier `ID`
        let mut body = serde_json::to_value(check)?;
        if let Some(obj) = body.as_object_mut()
            && let Some(id) = obj.remove("CheckID")
        {
            obj.insert("ID".to_string(), id);
        }
        let request = HttpRequest::put(api_path::AGENT_CHECK_REGISTER).json(&body)?;
        self.requester.write_empty(request).await
    }

    pub async fn deregister_check(&self, check_id: &str) -> Result<()> {
        let request = HttpRequest::put(api_path::AGENT_CHECK_DEREGISTER).segment(check_id);
        self.requester.write_empty(request).await
    }

    /// Mark a TTL check passing
    pub async fn pass_check(&self, check_id: &str, note: Option<&str>) -> Result<()> {
        self.push_status(api_path::AGENT_CHECK_PASS, check_id, note).await
    }

    /// Mark a TTL check warning
    pub async fn warn_check(&self, check_id: &str, note: Option<&str>) -> Result<()> {
        self.push_status(api_path::AGENT_CHECK_WARN, check_id, note).await
    }

    /// Mark a TTL check critical
    pub async fn fail_check(&self, check_id: &str, note: Option<&str>) -> Result<()> {
        self.push_status(api_path::AGENT_CHECK_FAIL, check_id, note).await
    }

    /// Set a TTL check's status and output in one call
    pub async fn update_check(
        &self,
        check_id: &str,
        status: CheckStatus,
        output: Option<&str>,
    ) -> Result<()> {
        let body = CheckUpdate {
            status,
            output: output.map(|o| o.to_string()),
        };
        let request = HttpRequest::put(api_path::AGENT_CHECK_UPDATE)
            .segment(check_id)
            .json(&body)?;
        self.requester.write_empty(request).await
    }

    async fn push_status(&self, path: &str, check_id: &str, note: Option<&str>) -> Result<()> {
        let request = HttpRequest::put(path)
            .segment(check_id)
            .query_opt(param::NOTE, note);
        self.requester.write_empty(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::tests::{ScriptedTransport, client_with};
    use crate::transport::HttpResponse;

    #[tokio::test]
    async fn test_register_check_uses_id_key() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, ""))]);
        let client = client_with(transport.clone());

        let check = CheckOptions::ttl("mem", Duration::from_secs(15)).with_id("mem-ttl");
        client.agent().register_check(&check).await.unwrap();

        let requests = transport.requests.lock();
        let sent: Value = serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["ID"], "mem-ttl");
        assert!(sent.get("CheckID").is_none());
        assert_eq!(sent["TTL"], "15s");
    }

    #[tokio::test]
    async fn test_status_push_carries_note() {
        let transport = ScriptedTransport::new(vec![
            Ok(HttpResponse::new(200, "")),
            Ok(HttpResponse::new(200, "")),
        ]);
        let client = client_with(transport.clone());

        client.agent().warn_check("mem-ttl", Some("75% used")).await.unwrap();
        client.agent().pass_check("mem-ttl", None).await.unwrap();

        let requests = transport.requests.lock();
        assert_eq!(requests[0].display_path(), "/v1/agent/check/warn/mem-ttl");
        assert_eq!(requests[0].query, vec![("note".to_string(), "75% used".to_string())]);
        assert!(requests[1].query.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_service_is_none() {
        let transport =
            ScriptedTransport::new(vec![Err(ConsulError::api(404, "unknown service ID"))]);
        let client = client_with(transport);

        assert!(client.agent().service("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_maintenance_params() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, ""))]);
        let client = client_with(transport.clone());

        client
            .agent()
            .maintenance_service("web-1", true, Some("deploy"))
            .await
            .unwrap();
        let requests = transport.requests.lock();
        assert_eq!(
            requests[0].query,
            vec![
                ("enable".to_string(), "true".to_string()),
                ("reason".to_string(), "deploy".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_register_service_requires_name() {
        let transport = ScriptedTransport::new(vec![]);
        let client = client_with(transport.clone());

        let result = client
            .agent()
            .register_service(&ServiceRegistration::new(""))
            .await;
        assert!(matches!(result, Err(ConsulError::InvalidRequest(_))));
        assert_eq!(transport.request_count(), 0);
    }
}
