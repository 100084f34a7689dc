// Prepared query client

use std::sync::Arc;

use consul_api::constants::{api_path, param};
use consul_api::prepared_query::PreparedQueryCreated;
use consul_api::{PreparedQueryDefinition, PreparedQueryExecuteResponse};

use crate::client::Requester;
use crate::error::{ConsulError, Result};
use crate::transport::HttpRequest;

/// Parameters of a query execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedQueryExecuteOptions {
    /// Sort results by distance from this node
    pub near: Option<String>,
    /// Upper bound on returned nodes
    pub limit: Option<u32>,
}

#[derive(Clone)]
pub struct PreparedQueryClient {
    requester: Arc<Requester>,
}

impl PreparedQueryClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Store a query and return its ID
    pub async fn create(&self, definition: &PreparedQueryDefinition) -> Result<String> {
        if definition.service.service.is_empty() {
            return Err(ConsulError::InvalidRequest(
                "prepared query needs a service".into(),
            ));
        }
        let request = HttpRequest::post(api_path::QUERY).json(definition)?;
        let created: PreparedQueryCreated = self.requester.write(request).await?;
        Ok(created.id)
    }

    pub async fn get(&self, id: &str) -> Result<Option<PreparedQueryDefinition>> {
        let result = self
            .requester
            .read_optional::<Vec<PreparedQueryDefinition>>(
                HttpRequest::get(api_path::QUERY).segment(id),
            )
            .await?;
        Ok(result.value.and_then(|list| list.into_iter().next()))
    }

    pub async fn list(&self) -> Result<Vec<PreparedQueryDefinition>> {
        let result = self.requester.read(HttpRequest::get(api_path::QUERY)).await?;
        Ok(result.value)
    }

    pub async fn update(&self, id: &str, definition: &PreparedQueryDefinition) -> Result<()> {
        let request = HttpRequest::put(api_path::QUERY)
            .segment(id)
            .json(definition)?;
        self.requester.write_empty(request).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let request = HttpRequest::delete(api_path::QUERY).segment(id);
        self.requester.write_empty(request).await
    }

    /// Run a query by ID or name
    pub async fn execute(
        &self,
        id_or_name: &str,
        options: &PreparedQueryExecuteOptions,
    ) -> Result<PreparedQueryExecuteResponse> {
        let request = HttpRequest::get(api_path::QUERY)
            .segment(id_or_name)
            .segment("execute")
            .query_opt(param::NEAR, options.near.as_deref())
            .query_opt(param::LIMIT, options.limit);
        let result = self.requester.read(request).await?;
        Ok(result.value)
    }
}
