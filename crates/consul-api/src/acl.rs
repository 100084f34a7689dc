// Consul ACL models (tokens and policies, Consul 1.4+ API)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::encoding::null_as_default;

/// Reference from a token to a policy, by ID or by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLink {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl PolicyLink {
    pub fn by_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn by_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Service identity attached to a token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    #[serde(rename = "ServiceName")]
    pub service_name: String,

    #[serde(rename = "Datacenters", default, skip_serializing_if = "Vec::is_empty")]
    pub datacenters: Vec<String>,
}

/// Node identity attached to a token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    #[serde(rename = "NodeName")]
    pub node_name: String,

    #[serde(rename = "Datacenter")]
    pub datacenter: String,
}

/// ACL token. Fields set by the server (`AccessorID`, `SecretID`, indexes,
/// timestamps) are left empty when creating a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclToken {
    #[serde(rename = "AccessorID", default, skip_serializing_if = "String::is_empty")]
    pub accessor_id: String,

    #[serde(rename = "SecretID", default, skip_serializing_if = "String::is_empty")]
    pub secret_id: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(
        rename = "Policies",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub policies: Vec<PolicyLink>,

    #[serde(
        rename = "ServiceIdentities",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub service_identities: Vec<ServiceIdentity>,

    #[serde(
        rename = "NodeIdentities",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub node_identities: Vec<NodeIdentity>,

    #[serde(rename = "Local", default)]
    pub local: bool,

    #[serde(rename = "ExpirationTime", default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,

    #[serde(rename = "CreateTime", default, skip_serializing)]
    pub create_time: Option<DateTime<Utc>>,

    #[serde(rename = "Hash", default, skip_serializing)]
    pub hash: Option<String>,

    #[serde(rename = "CreateIndex", default, skip_serializing)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default, skip_serializing)]
    pub modify_index: u64,
}

impl AclToken {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn with_policy(mut self, link: PolicyLink) -> Self {
        self.policies.push(link);
        self
    }

    pub fn with_service_identity(mut self, service_name: &str) -> Self {
        self.service_identities.push(ServiceIdentity {
            service_name: service_name.to_string(),
            datacenters: Vec::new(),
        });
        self
    }

    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }
}

/// Body of `PUT /v1/acl/token/:accessor_id/clone`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloneAclTokenOptions {
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// ACL policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclPolicy {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    /// HCL rules; omitted by `/v1/acl/policies` list responses
    #[serde(rename = "Rules", default)]
    pub rules: String,

    #[serde(
        rename = "Datacenters",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub datacenters: Vec<String>,

    #[serde(rename = "CreateIndex", default, skip_serializing)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default, skip_serializing)]
    pub modify_index: u64,
}

impl AclPolicy {
    pub fn new(name: &str, rules: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: rules.to_string(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_datacenters(mut self, datacenters: &[&str]) -> Self {
        self.datacenters = datacenters.iter().map(|dc| dc.to_string()).collect();
        self
    }
}
