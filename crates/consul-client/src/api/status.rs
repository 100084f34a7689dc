// Raft status client

use std::sync::Arc;

use consul_api::constants::api_path;

use crate::client::Requester;
use crate::error::Result;
use crate::transport::HttpRequest;

#[derive(Clone)]
pub struct StatusClient {
    requester: Arc<Requester>,
}

impl StatusClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Raft address of the current leader; `None` while there is no leader
    pub async fn leader(&self) -> Result<Option<String>> {
        let result = self
            .requester
            .read::<String>(HttpRequest::get(api_path::STATUS_LEADER))
            .await?;
        Ok(Some(result.value).filter(|leader| !leader.is_empty()))
    }

    /// Raft addresses of the voting peers
    pub async fn peers(&self) -> Result<Vec<String>> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::STATUS_PEERS))
            .await?;
        Ok(result.value)
    }
}
