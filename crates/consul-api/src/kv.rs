// Consul KV store models

use serde::{Deserialize, Serialize};

use crate::encoding::opt_base64;

/// A single KV entry as returned by `GET /v1/kv/:key`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(rename = "Key")]
    pub key: String,

    /// Raw value bytes (base64 on the wire)
    #[serde(rename = "Value", with = "opt_base64", default)]
    pub value: Option<Vec<u8>>,

    #[serde(rename = "Flags", default)]
    pub flags: u64,

    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,

    #[serde(rename = "LockIndex", default)]
    pub lock_index: u64,

    /// Session currently holding the lock on this key, if any
    #[serde(rename = "Session", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl KeyValue {
    /// Value decoded as UTF-8, if present and valid
    pub fn value_str(&self) -> Option<&str> {
        self.value
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Whether a session currently holds this key
    pub fn is_locked(&self) -> bool {
        self.session.is_some()
    }
}
