// Consul health models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agent::AgentService;
use crate::catalog::Node;
use crate::encoding::null_as_default;

/// Status of a single health check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    #[default]
    Passing,
    Warning,
    Critical,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Passing => "passing",
            CheckStatus::Warning => "warning",
            CheckStatus::Critical => "critical",
        }
    }

    /// Severity order: passing < warning < critical
    fn severity(&self) -> u8 {
        match self {
            CheckStatus::Passing => 0,
            CheckStatus::Warning => 1,
            CheckStatus::Critical => 2,
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passing" => Ok(CheckStatus::Passing),
            "warning" => Ok(CheckStatus::Warning),
            "critical" => Ok(CheckStatus::Critical),
            other => Err(format!("unknown check status '{}'", other)),
        }
    }
}

/// Worst status across a set of checks. An empty set is passing.
pub fn aggregate_status<'a, I>(statuses: I) -> CheckStatus
where
    I: IntoIterator<Item = &'a CheckStatus>,
{
    statuses
        .into_iter()
        .copied()
        .max_by_key(CheckStatus::severity)
        .unwrap_or(CheckStatus::Passing)
}

/// Filter for `/v1/health/state/:state`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Any,
    Passing,
    Warning,
    Critical,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Any => "any",
            HealthState::Passing => "passing",
            HealthState::Warning => "warning",
            HealthState::Critical => "critical",
        }
    }
}

/// Health check as returned by the health and agent endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "Node", default)]
    pub node: String,

    #[serde(rename = "CheckID")]
    pub check_id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Status")]
    pub status: CheckStatus,

    #[serde(rename = "Notes", default)]
    pub notes: String,

    #[serde(rename = "Output", default)]
    pub output: String,

    #[serde(rename = "ServiceID", default)]
    pub service_id: String,

    #[serde(rename = "ServiceName", default)]
    pub service_name: String,

    #[serde(rename = "ServiceTags", default)]
    pub service_tags: Option<Vec<String>>,

    #[serde(rename = "Type", default)]
    pub check_type: String,

    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
}

/// Entry of `/v1/health/service/:service`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    #[serde(rename = "Node")]
    pub node: Node,

    #[serde(rename = "Service")]
    pub service: AgentService,

    #[serde(rename = "Checks", default, deserialize_with = "null_as_default")]
    pub checks: Vec<HealthCheck>,
}

impl ServiceEntry {
    /// Worst status across the node and service checks of this entry
    pub fn aggregated_status(&self) -> CheckStatus {
        aggregate_status(self.checks.iter().map(|c| &c.status))
    }
}
