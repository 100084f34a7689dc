//! Helpers for tests against a live agent

use consul_client::{ConsulClient, ConsulClientConfig};

/// Client built from `CONSUL_*` environment variables
pub fn live_client() -> ConsulClient {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let config = ConsulClientConfig::from_env().expect("invalid CONSUL_* environment");
    ConsulClient::new(config).expect("failed to build client")
}

/// Key or name unique to one test run
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
