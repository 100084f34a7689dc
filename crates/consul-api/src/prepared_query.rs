// Consul prepared query models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::encoding::null_as_default;
use crate::health::ServiceEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailover {
    #[serde(rename = "NearestN", default)]
    pub nearest_n: u32,

    #[serde(
        rename = "Datacenters",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub datacenters: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryService {
    #[serde(rename = "Service")]
    pub service: String,

    #[serde(rename = "Failover", default)]
    pub failover: QueryFailover,

    #[serde(rename = "OnlyPassing", default)]
    pub only_passing: bool,

    #[serde(rename = "Near", default, skip_serializing_if = "String::is_empty")]
    pub near: String,

    #[serde(
        rename = "Tags",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,

    #[serde(
        rename = "NodeMeta",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub node_meta: HashMap<String, String>,

    #[serde(
        rename = "ServiceMeta",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub service_meta: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDns {
    #[serde(rename = "TTL", default, skip_serializing_if = "String::is_empty")]
    pub ttl: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTemplate {
    #[serde(rename = "Type", default)]
    pub template_type: String,

    #[serde(rename = "Regexp", default, skip_serializing_if = "String::is_empty")]
    pub regexp: String,
}

/// Prepared query definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedQueryDefinition {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Session", default, skip_serializing_if = "String::is_empty")]
    pub session: String,

    #[serde(rename = "Token", default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    #[serde(rename = "Service")]
    pub service: QueryService,

    #[serde(rename = "DNS", default)]
    pub dns: QueryDns,

    #[serde(rename = "Template", default, skip_serializing_if = "Option::is_none")]
    pub template: Option<QueryTemplate>,
}

impl PreparedQueryDefinition {
    pub fn for_service(name: &str, service: &str) -> Self {
        Self {
            name: name.to_string(),
            service: QueryService {
                service: service.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Response of `POST /v1/query`
#[derive(Debug, Clone, Deserialize)]
pub struct PreparedQueryCreated {
    #[serde(rename = "ID")]
    pub id: String,
}

/// Response of `GET /v1/query/:id/execute`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PreparedQueryExecuteResponse {
    #[serde(rename = "Service", default)]
    pub service: String,

    #[serde(rename = "Nodes", default, deserialize_with = "null_as_default")]
    pub nodes: Vec<ServiceEntry>,

    #[serde(rename = "DNS", default)]
    pub dns: QueryDns,

    #[serde(rename = "Datacenter", default)]
    pub datacenter: String,

    #[serde(rename = "Failovers", default)]
    pub failovers: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_serialization() {
        let mut def = PreparedQueryDefinition::for_service("my-query", "redis");
        def.service.only_passing = true;
        def.service.failover.nearest_n = 3;

        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["Name"], "my-query");
        assert_eq!(json["Service"]["Service"], "redis");
        assert_eq!(json["Service"]["OnlyPassing"], true);
        assert_eq!(json["Service"]["Failover"]["NearestN"], 3);
        assert!(json.get("ID").is_none());
        assert!(json.get("Template").is_none());
    }

    #[test]
    fn test_execute_response_deserialization() {
        let json = r#"{
            "Service": "redis",
            "Nodes": [{
                "Node": {"ID": "n1", "Node": "foobar", "Address": "10.1.10.12", "Datacenter": "dc1"},
                "Service": {"ID": "redis", "Service": "redis", "Tags": null, "Port": 8000},
                "Checks": []
            }],
            "DNS": {"TTL": "10s"},
            "Datacenter": "dc3",
            "Failovers": 2
        }"#;

        let resp: PreparedQueryExecuteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.nodes.len(), 1);
        assert_eq!(resp.dns.ttl, "10s");
        assert_eq!(resp.failovers, 2);
    }
}
