//! Shared helpers for HTTP-level tests against a wiremock agent

use std::time::Duration;

use consul_client::model::encoding;
use consul_client::{ConsulClient, ConsulClientConfig, RetryPolicy};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

/// Install a test subscriber once; `RUST_LOG` controls verbosity
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config pointing at the mock agent, without retries
#[allow(dead_code)]
pub fn config_for(server: &MockServer) -> ConsulClientConfig {
    let addr = server.address();
    ConsulClientConfig::new(&addr.ip().to_string(), addr.port()).with_retry(RetryPolicy::none())
}

#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> ConsulClient {
    init_tracing();
    ConsulClient::new(config_for(server)).unwrap()
}

/// Retrying config with millisecond backoff
#[allow(dead_code)]
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::default()
        .with_initial_backoff(Duration::from_millis(5))
        .with_max_backoff(Duration::from_millis(20))
        .with_jitter(false)
}

/// `/v1/kv/:key` response body holding one entry
#[allow(dead_code)]
pub fn kv_body(key: &str, value: &str, modify_index: u64, session: Option<&str>) -> Value {
    let mut entry = json!({
        "Key": key,
        "Value": encoding::encode(value.as_bytes()),
        "Flags": 0,
        "CreateIndex": 1,
        "ModifyIndex": modify_index,
        "LockIndex": 0
    });
    if let Some(s) = session {
        entry["Session"] = json!(s);
        entry["LockIndex"] = json!(1);
    }
    json!([entry])
}

/// `/v1/session/info/:id` response body
#[allow(dead_code)]
pub fn session_body(id: &str, lock_delay: Duration, behavior: &str) -> Value {
    json!([{
        "ID": id,
        "Name": "",
        "Node": "node-1",
        "LockDelay": lock_delay.as_nanos() as u64,
        "Behavior": behavior,
        "TTL": "",
        "NodeChecks": ["serfHealth"],
        "CreateIndex": 10,
        "ModifyIndex": 10
    }])
}

/// Unique suffix to keep names apart across tests
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}
