// Consul session models

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::{duration_nanos, opt_duration_str};

/// Consul's default lock delay for new sessions
pub const DEFAULT_LOCK_DELAY: Duration = Duration::from_secs(15);

/// What happens to locks held by a session when it is invalidated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBehavior {
    /// Held locks are released, the keys stay
    #[default]
    Release,
    /// Held keys are deleted
    Delete,
}

impl SessionBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionBehavior::Release => "release",
            SessionBehavior::Delete => "delete",
        }
    }
}

/// Service check reference attached to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCheckRef {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Session as returned by `/v1/session/info`, `/v1/session/list` and friends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Node", default)]
    pub node: String,

    #[serde(rename = "LockDelay", with = "duration_nanos", default)]
    pub lock_delay: Duration,

    #[serde(rename = "Behavior", default)]
    pub behavior: SessionBehavior,

    #[serde(rename = "TTL", with = "opt_duration_str", default)]
    pub ttl: Option<Duration>,

    /// Legacy check list (pre-1.7 agents)
    #[serde(rename = "Checks", default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<String>>,

    #[serde(rename = "NodeChecks", default, skip_serializing_if = "Option::is_none")]
    pub node_checks: Option<Vec<String>>,

    #[serde(rename = "ServiceChecks", default, skip_serializing_if = "Option::is_none")]
    pub service_checks: Option<Vec<ServiceCheckRef>>,

    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

/// Body of `PUT /v1/session/create`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Node", skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    #[serde(
        rename = "LockDelay",
        with = "opt_duration_str",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub lock_delay: Option<Duration>,

    #[serde(rename = "Behavior", skip_serializing_if = "Option::is_none")]
    pub behavior: Option<SessionBehavior>,

    #[serde(
        rename = "TTL",
        with = "opt_duration_str",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub ttl: Option<Duration>,

    #[serde(rename = "NodeChecks", skip_serializing_if = "Option::is_none")]
    pub node_checks: Option<Vec<String>>,

    #[serde(rename = "ServiceChecks", skip_serializing_if = "Option::is_none")]
    pub service_checks: Option<Vec<ServiceCheckRef>>,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_node(mut self, node: &str) -> Self {
        self.node = Some(node.to_string());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_lock_delay(mut self, lock_delay: Duration) -> Self {
        self.lock_delay = Some(lock_delay);
        self
    }

    pub fn with_behavior(mut self, behavior: SessionBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn with_node_checks(mut self, checks: Vec<String>) -> Self {
        self.node_checks = Some(checks);
        self
    }
}

/// Response of `PUT /v1/session/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    #[serde(rename = "ID")]
    pub id: String,
}
