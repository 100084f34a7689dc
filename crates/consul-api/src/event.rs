// Consul user event models

use serde::{Deserialize, Serialize};

use crate::encoding::opt_base64;

/// User event as returned by `/v1/event/fire/:name` and `/v1/event/list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEvent {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Payload", with = "opt_base64", default)]
    pub payload: Option<Vec<u8>>,

    #[serde(rename = "NodeFilter", default)]
    pub node_filter: String,

    #[serde(rename = "ServiceFilter", default)]
    pub service_filter: String,

    #[serde(rename = "TagFilter", default)]
    pub tag_filter: String,

    #[serde(rename = "Version", default)]
    pub version: u32,

    #[serde(rename = "LTime", default)]
    pub ltime: u64,
}

impl UserEvent {
    pub fn payload_str(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

/// Filters and payload for firing an event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOptions {
    /// Node name regex filter
    pub node: Option<String>,
    /// Service name regex filter
    pub service: Option<String>,
    /// Tag regex filter, only honoured together with `service`
    pub tag: Option<String>,
    pub payload: Option<Vec<u8>>,
}

impl EventOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node: &str) -> Self {
        self.node = Some(node.to_string());
        self
    }

    pub fn with_service(mut self, service: &str) -> Self {
        self.service = Some(service.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_event_deserialization() {
        let json = r#"{
            "ID": "b54fe110-7af5-cafc-d1fb-afc8ba432b1c",
            "Name": "deploy",
            "Payload": "MTYwOTAzMA==",
            "NodeFilter": "",
            "ServiceFilter": "web",
            "TagFilter": "",
            "Version": 1,
            "LTime": 19
        }"#;

        let ev: UserEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.name, "deploy");
        assert_eq!(ev.payload_str(), Some("1609030"));
        assert_eq!(ev.service_filter, "web");
        assert_eq!(ev.ltime, 19);
    }

    #[test]
    fn test_user_event_null_payload() {
        let json = r#"{"ID":"1","Name":"ping","Payload":null,"Version":1,"LTime":2}"#;
        let ev: UserEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.payload, None);
    }
}
