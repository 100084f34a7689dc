// Consul catalog models

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::agent::AgentService;
use crate::encoding::null_as_default;

/// Catalog node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "ID", default)]
    pub id: String,

    #[serde(rename = "Node")]
    pub node: String,

    #[serde(rename = "Address", default)]
    pub address: String,

    #[serde(rename = "Datacenter", default)]
    pub datacenter: String,

    #[serde(rename = "TaggedAddresses", default, skip_serializing_if = "Option::is_none")]
    pub tagged_addresses: Option<HashMap<String, String>>,

    #[serde(rename = "Meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, String>>,

    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

/// Entry of `/v1/catalog/service/:service`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogService {
    #[serde(rename = "ID", default)]
    pub id: String,

    #[serde(rename = "Node")]
    pub node: String,

    #[serde(rename = "Address", default)]
    pub address: String,

    #[serde(rename = "Datacenter", default)]
    pub datacenter: String,

    #[serde(rename = "ServiceID")]
    pub service_id: String,

    #[serde(rename = "ServiceName")]
    pub service_name: String,

    #[serde(rename = "ServiceTags", default, deserialize_with = "null_as_default")]
    pub service_tags: Vec<String>,

    #[serde(rename = "ServiceAddress", default)]
    pub service_address: String,

    #[serde(rename = "ServicePort", default)]
    pub service_port: u16,

    #[serde(rename = "ServiceMeta", default, deserialize_with = "null_as_default")]
    pub service_meta: HashMap<String, String>,

    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

/// One entry of `/v1/catalog/services`: a service name and the union of its tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTags {
    pub name: String,
    pub tags: Vec<String>,
}

/// `/v1/catalog/services` body, kept in the order the agent returned it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTagsList(pub Vec<ServiceTags>);

impl<'de> Deserialize<'de> for ServiceTagsList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = ServiceTagsList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of service name to tag list")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, tags)) = map.next_entry::<String, Option<Vec<String>>>()? {
                    entries.push(ServiceTags {
                        name,
                        tags: tags.unwrap_or_default(),
                    });
                }
                Ok(ServiceTagsList(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Body of `/v1/catalog/node/:node`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeServices {
    #[serde(rename = "Node")]
    pub node: Option<Node>,

    #[serde(rename = "Services", default)]
    pub services: HashMap<String, AgentService>,
}

/// Service part of a catalog registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogServiceRegistration {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Service")]
    pub service: String,

    #[serde(rename = "Tags", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(rename = "Address", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(rename = "Port", skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(rename = "Meta", skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
}

/// Body of `PUT /v1/catalog/register`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogRegistration {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Node")]
    pub node: String,

    #[serde(rename = "Address")]
    pub address: String,

    #[serde(rename = "Datacenter", skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,

    #[serde(rename = "TaggedAddresses", skip_serializing_if = "HashMap::is_empty")]
    pub tagged_addresses: HashMap<String, String>,

    #[serde(rename = "NodeMeta", skip_serializing_if = "HashMap::is_empty")]
    pub node_meta: HashMap<String, String>,

    #[serde(rename = "Service", skip_serializing_if = "Option::is_none")]
    pub service: Option<CatalogServiceRegistration>,
}

/// Body of `PUT /v1/catalog/deregister`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogDeregistration {
    #[serde(rename = "Node")]
    pub node: String,

    #[serde(rename = "Datacenter", skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,

    #[serde(rename = "ServiceID", skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,

    #[serde(rename = "CheckID", skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
}
