// Transaction client (`/v1/txn`)

use std::sync::Arc;

use consul_api::constants::api_path;
use consul_api::{TxnRequest, TxnResponse};
use tracing::debug;

use crate::client::Requester;
use crate::error::{ConsulError, Result};
use crate::transport::HttpRequest;

#[derive(Clone)]
pub struct TxnClient {
    requester: Arc<Requester>,
}

impl TxnClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Apply `txn` atomically. A rolled back transaction (409) is not an
    /// error: the response carries the failing operations in `errors`.
    pub async fn transaction(&self, txn: &TxnRequest) -> Result<TxnResponse> {
        if txn.operations.is_empty() {
            return Err(ConsulError::InvalidRequest(
                "transaction must contain at least one operation".into(),
            ));
        }

        let request = HttpRequest::put(api_path::TXN).json(txn)?;
        match self.requester.write::<TxnResponse>(request).await {
            Err(ConsulError::Api {
                status: 409,
                message,
                ..
            }) => {
                let response: TxnResponse = serde_json::from_str(&message)?;
                debug!("transaction rolled back: {:?}", response.errors);
                Ok(response)
            }
            other => other,
        }
    }
}
