// User event client

use std::sync::Arc;

use consul_api::constants::{api_path, param};
use consul_api::{EventOptions, UserEvent};

use crate::blocking::{BlockingQueryOptions, Indexed};
use crate::client::Requester;
use crate::error::{ConsulError, Result};
use crate::transport::HttpRequest;

/// Filters of `/v1/event/list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventListOptions {
    /// Only events with this name
    pub name: Option<String>,
    pub blocking: BlockingQueryOptions,
}

impl EventListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_blocking(mut self, blocking: BlockingQueryOptions) -> Self {
        self.blocking = blocking;
        self
    }
}

#[derive(Clone)]
pub struct EventClient {
    requester: Arc<Requester>,
}

impl EventClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Fire a user event through the gossip layer
    pub async fn fire_event(&self, name: &str, options: &EventOptions) -> Result<UserEvent> {
        if name.is_empty() {
            return Err(ConsulError::InvalidRequest("event name must not be empty".into()));
        }
        let mut request = HttpRequest::put(api_path::EVENT_FIRE)
            .segment(name)
            .query_opt(param::NODE, options.node.as_deref())
            .query_opt(param::SERVICE, options.service.as_deref())
            .query_opt(param::TAG, options.tag.as_deref());
        if let Some(payload) = &options.payload {
            request = request.body(payload.clone());
        }
        self.requester.write(request).await
    }

    /// Most recent events known to the agent, oldest first
    pub async fn list_events(&self, options: &EventListOptions) -> Result<Indexed<Vec<UserEvent>>> {
        let request = options.blocking.apply(
            HttpRequest::get(api_path::EVENT_LIST).query_opt(param::NAME, options.name.as_deref()),
        );
        self.requester.read(request).await
    }
}
