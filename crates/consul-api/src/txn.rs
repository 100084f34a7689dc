// Consul transaction models (`PUT /v1/txn`, KV and service operations)

use serde::{Deserialize, Serialize};

use crate::agent::AgentService;
use crate::encoding::{null_as_default, opt_base64};
use crate::kv::KeyValue;

/// KV verbs accepted inside a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnKvVerb {
    #[serde(rename = "set")]
    Set,
    #[serde(rename = "cas")]
    Cas,
    #[serde(rename = "lock")]
    Lock,
    #[serde(rename = "unlock")]
    Unlock,
    #[serde(rename = "get")]
    Get,
    #[serde(rename = "get-tree")]
    GetTree,
    #[serde(rename = "check-session")]
    CheckSession,
    #[serde(rename = "check-index")]
    CheckIndex,
    #[serde(rename = "check-not-exists")]
    CheckNotExists,
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "delete-tree")]
    DeleteTree,
    #[serde(rename = "delete-cas")]
    DeleteCas,
}

/// A single KV operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxnKvOperation {
    #[serde(rename = "Verb")]
    pub verb: TxnKvVerb,

    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "Value", with = "opt_base64", skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<u8>>,

    #[serde(rename = "Flags", skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,

    #[serde(rename = "Index", skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,

    #[serde(rename = "Session", skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl TxnKvOperation {
    pub fn new(verb: TxnKvVerb, key: &str) -> Self {
        Self {
            verb,
            key: key.to_string(),
            value: None,
            flags: None,
            index: None,
            session: None,
        }
    }

    pub fn set(key: &str, value: impl Into<Vec<u8>>) -> Self {
        Self::new(TxnKvVerb::Set, key).with_value(value)
    }

    pub fn get(key: &str) -> Self {
        Self::new(TxnKvVerb::Get, key)
    }

    pub fn delete(key: &str) -> Self {
        Self::new(TxnKvVerb::Delete, key)
    }

    pub fn cas(key: &str, value: impl Into<Vec<u8>>, index: u64) -> Self {
        Self::new(TxnKvVerb::Cas, key)
            .with_value(value)
            .with_index(index)
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string());
        self
    }
}

/// Service verbs accepted inside a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnServiceVerb {
    #[serde(rename = "set")]
    Set,
    #[serde(rename = "cas")]
    Cas,
    #[serde(rename = "get")]
    Get,
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "delete-cas")]
    DeleteCas,
}

/// A single catalog service operation on `node`. `cas` and `delete-cas`
/// compare against `service.modify_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxnServiceOperation {
    #[serde(rename = "Verb")]
    pub verb: TxnServiceVerb,

    #[serde(rename = "Node")]
    pub node: String,

    #[serde(rename = "Service")]
    pub service: AgentService,
}

impl TxnServiceOperation {
    pub fn new(verb: TxnServiceVerb, node: &str, service: AgentService) -> Self {
        Self {
            verb,
            node: node.to_string(),
            service,
        }
    }

    pub fn set(node: &str, service: AgentService) -> Self {
        Self::new(TxnServiceVerb::Set, node, service)
    }

    /// Look up `service_id` on `node`
    pub fn get(node: &str, service_id: &str) -> Self {
        Self::new(TxnServiceVerb::Get, node, service_ref(service_id))
    }

    pub fn delete(node: &str, service_id: &str) -> Self {
        Self::new(TxnServiceVerb::Delete, node, service_ref(service_id))
    }

    pub fn cas(node: &str, mut service: AgentService, index: u64) -> Self {
        service.modify_index = index;
        Self::new(TxnServiceVerb::Cas, node, service)
    }

    pub fn delete_cas(node: &str, service_id: &str, index: u64) -> Self {
        let mut service = service_ref(service_id);
        service.modify_index = index;
        Self::new(TxnServiceVerb::DeleteCas, node, service)
    }
}

fn service_ref(service_id: &str) -> AgentService {
    AgentService {
        id: service_id.to_string(),
        ..Default::default()
    }
}

/// One transaction operation, serialized as `{"KV": {...}}` or
/// `{"Service": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TxnOperation {
    #[serde(rename = "KV")]
    Kv(TxnKvOperation),
    #[serde(rename = "Service")]
    Service(TxnServiceOperation),
}

impl From<TxnKvOperation> for TxnOperation {
    fn from(op: TxnKvOperation) -> Self {
        TxnOperation::Kv(op)
    }
}

impl From<TxnServiceOperation> for TxnOperation {
    fn from(op: TxnServiceOperation) -> Self {
        TxnOperation::Service(op)
    }
}

/// Ordered list of operations applied atomically
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TxnRequest {
    pub operations: Vec<TxnOperation>,
}

impl TxnRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, op: impl Into<TxnOperation>) -> Self {
        self.operations.push(op.into());
        self
    }
}

/// Result slot for a single operation; exactly one field is set
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxnResult {
    #[serde(rename = "KV", default)]
    pub kv: Option<KeyValue>,

    #[serde(rename = "Service", default)]
    pub service: Option<AgentService>,
}

/// Error reported for the operation at `op_index`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TxnError {
    #[serde(rename = "OpIndex")]
    pub op_index: usize,

    #[serde(rename = "What")]
    pub what: String,
}

/// Body of a `/v1/txn` response; 200 carries results, 409 carries errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxnResponse {
    #[serde(rename = "Results", default, deserialize_with = "null_as_default")]
    pub results: Vec<TxnResult>,

    #[serde(rename = "Errors", default, deserialize_with = "null_as_default")]
    pub errors: Vec<TxnError>,
}

impl TxnResponse {
    pub fn is_committed(&self) -> bool {
        self.errors.is_empty()
    }
}
