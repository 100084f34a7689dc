// Network coordinate client

use std::sync::Arc;

use consul_api::constants::api_path;
use consul_api::{Coordinate, DcCoordinates};

use crate::blocking::{BlockingQueryOptions, Indexed};
use crate::client::Requester;
use crate::error::Result;
use crate::transport::HttpRequest;

#[derive(Clone)]
pub struct CoordinateClient {
    requester: Arc<Requester>,
}

impl CoordinateClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// WAN coordinates of every known datacenter's servers
    pub async fn datacenters(&self) -> Result<Vec<DcCoordinates>> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::COORDINATE_DATACENTERS))
            .await?;
        Ok(result.value)
    }

    /// LAN coordinates of the nodes in the local datacenter
    pub async fn nodes(&self, options: &BlockingQueryOptions) -> Result<Indexed<Vec<Coordinate>>> {
        let request = options.apply(HttpRequest::get(api_path::COORDINATE_NODES));
        self.requester.read(request).await
    }
}
