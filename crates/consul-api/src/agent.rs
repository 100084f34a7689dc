// Consul agent models: service and check registration

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::opt_duration_str;
use crate::encoding::null_as_default;
use crate::health::CheckStatus;

/// Service as known by an agent (also embedded in health and catalog responses)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentService {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Service")]
    pub service: String,

    #[serde(rename = "Tags", default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    #[serde(rename = "Address", default)]
    pub address: String,

    #[serde(rename = "Port", default)]
    pub port: u16,

    #[serde(rename = "Meta", default, deserialize_with = "null_as_default")]
    pub meta: HashMap<String, String>,

    #[serde(rename = "EnableTagOverride", default)]
    pub enable_tag_override: bool,

    #[serde(rename = "Datacenter", default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,

    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

/// Health check definition used for `PUT /v1/agent/check/register` and
/// embedded in service registrations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Check ID; serialized as `CheckID` so it is accepted both standalone
    /// and inside a service registration
    #[serde(rename = "CheckID", alias = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Notes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(rename = "ServiceID", skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,

    #[serde(rename = "ScriptArgs", skip_serializing_if = "Option::is_none")]
    pub script_args: Option<Vec<String>>,

    #[serde(rename = "HTTP", skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,

    #[serde(rename = "Header", skip_serializing_if = "HashMap::is_empty", default)]
    pub headers: HashMap<String, Vec<String>>,

    #[serde(rename = "TLSSkipVerify", skip_serializing_if = "std::ops::Not::not", default)]
    pub tls_skip_verify: bool,

    #[serde(rename = "TCP", skip_serializing_if = "Option::is_none")]
    pub tcp: Option<String>,

    #[serde(rename = "GRPC", skip_serializing_if = "Option::is_none")]
    pub grpc: Option<String>,

    #[serde(rename = "GRPCUseTLS", skip_serializing_if = "std::ops::Not::not", default)]
    pub grpc_tls: bool,

    #[serde(
        rename = "Interval",
        with = "opt_duration_str",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub interval: Option<Duration>,

    #[serde(
        rename = "TTL",
        with = "opt_duration_str",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub ttl: Option<Duration>,

    #[serde(
        rename = "DeregisterCriticalServiceAfter",
        with = "opt_duration_str",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub deregister_after: Option<Duration>,

    /// Initial status
    #[serde(rename = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<CheckStatus>,
}

impl CheckOptions {
    /// A TTL check that must be pushed to before `ttl` elapses
    pub fn ttl(name: &str, ttl: Duration) -> Self {
        Self {
            name: name.to_string(),
            ttl: Some(ttl),
            ..Default::default()
        }
    }

    /// An HTTP check polled every `interval`
    pub fn http(name: &str, url: &str, interval: Duration) -> Self {
        Self {
            name: name.to_string(),
            http: Some(url.to_string()),
            interval: Some(interval),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_service_id(mut self, service_id: &str) -> Self {
        self.service_id = Some(service_id.to_string());
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn with_status(mut self, status: CheckStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Body of `PUT /v1/agent/service/register`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Tags", skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,

    #[serde(rename = "Address", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(rename = "Port", skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(rename = "Meta", skip_serializing_if = "HashMap::is_empty", default)]
    pub meta: HashMap<String, String>,

    #[serde(rename = "Check", skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckOptions>,

    #[serde(rename = "Checks", skip_serializing_if = "Vec::is_empty", default)]
    pub checks: Vec<CheckOptions>,
}

impl ServiceRegistration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_check(mut self, check: CheckOptions) -> Self {
        self.check = Some(check);
        self
    }
}

/// Body of `PUT /v1/agent/check/update/:check_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckUpdate {
    #[serde(rename = "Status")]
    pub status: CheckStatus,

    #[serde(rename = "Output", skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}
