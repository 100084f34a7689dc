//! KV client against a mock agent

mod common;

use consul_client::model::{TxnKvOperation, TxnRequest};
use consul_client::{BlockingQueryOptions, ConsulClient, KeyValueOptions, TokenPlacement};
use serde_json::json;
use wiremock::matchers::{
    body_partial_json, body_string, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client_for, config_for, kv_body};

#[tokio::test]
async fn test_missing_key_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/never/written"))
        .respond_with(ResponseTemplate::new(404).insert_header("X-Consul-Index", "12"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .kv()
        .get_value("never/written", &BlockingQueryOptions::new())
        .await
        .unwrap();

    assert!(result.value.is_none());
    assert_eq!(result.index().map(|i| i.value()), Some(12));
}

#[tokio::test]
async fn test_put_get_delete_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/foo"))
        .and(body_string("bar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/foo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv_body("foo", "bar", 42, None))
                .insert_header("X-Consul-Index", "42"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/kv/foo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/foo"))
        .respond_with(ResponseTemplate::new(404).insert_header("X-Consul-Index", "43"))
        .mount(&server)
        .await;

    let kv = client_for(&server).kv();

    assert!(kv.put_value("foo", "bar", None).await.unwrap());

    let entry = kv
        .get_value("foo", &BlockingQueryOptions::new())
        .await
        .unwrap()
        .value
        .unwrap();
    assert_eq!(entry.key, "foo");
    assert_eq!(entry.value_str(), Some("bar"));
    assert_eq!(entry.modify_index, 42);

    kv.delete_value("foo").await.unwrap();

    let after = kv
        .get_value("foo", &BlockingQueryOptions::new())
        .await
        .unwrap();
    assert!(after.value.is_none());
}

#[tokio::test]
async fn test_cas_conflict_returns_false() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/config/limit"))
        .and(query_param("cas", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/kv/config/limit"))
        .and(query_param("cas", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let kv = client_for(&server).kv();
    let opts = KeyValueOptions::new().with_cas(7);
    assert!(!kv.put_value("config/limit", "10", Some(&opts)).await.unwrap());
    assert!(kv.cas_delete("config/limit", 9).await.unwrap());
}

#[tokio::test]
async fn test_get_values_preserves_server_order() {
    let server = MockServer::start().await;
    let body = json!([
        {"Key": "app/z", "Value": "MQ==", "Flags": 0, "CreateIndex": 3, "ModifyIndex": 3, "LockIndex": 0},
        {"Key": "app/a", "Value": null, "Flags": 0, "CreateIndex": 4, "ModifyIndex": 4, "LockIndex": 0},
        {"Key": "app/m", "Value": "Mg==", "Flags": 5, "CreateIndex": 5, "ModifyIndex": 5, "LockIndex": 0}
    ]);
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/"))
        .and(query_param("recurse", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .insert_header("X-Consul-Index", "5"),
        )
        .mount(&server)
        .await;

    let entries = client_for(&server)
        .kv()
        .get_values("app/", &BlockingQueryOptions::new())
        .await
        .unwrap();

    let keys: Vec<_> = entries.value.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["app/z", "app/a", "app/m"]);
    assert_eq!(entries.value[1].value, None);
    assert_eq!(entries.value[2].flags, 5);
}

#[tokio::test]
async fn test_delete_values_recurse() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/kv/tmp/"))
        .and(query_param("recurse", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).kv().delete_values("tmp/").await.unwrap();
}

#[tokio::test]
async fn test_forbidden_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/secret"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Permission denied"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .kv()
        .get_value("secret", &BlockingQueryOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("Permission denied"));
}

#[tokio::test]
async fn test_key_segments_are_percent_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/my%20app/feature%3Fflag"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let stored = client_for(&server)
        .kv()
        .put_value("my app/feature?flag", "on", None)
        .await
        .unwrap();
    assert!(stored);
}

#[tokio::test]
async fn test_token_and_datacenter_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/foo"))
        .and(query_param("token", "secret-token"))
        .and(query_param("dc", "dc2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv_body("foo", "x", 3, None)))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server)
        .with_acl_token("secret-token")
        .with_datacenter("dc2");
    let client = ConsulClient::new(config).unwrap();
    let entry = client
        .kv()
        .get_value("foo", &BlockingQueryOptions::new())
        .await
        .unwrap();
    assert_eq!(entry.value.unwrap().value_str(), Some("x"));
}

#[tokio::test]
async fn test_token_in_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/foo"))
        .and(header("X-Consul-Token", "secret-token"))
        .and(query_param_is_missing("token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv_body("foo", "x", 3, None)))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server)
        .with_acl_token("secret-token")
        .with_token_placement(TokenPlacement::Header);
    let client = ConsulClient::new(config).unwrap();
    let entry = client
        .kv()
        .get_value("foo", &BlockingQueryOptions::new())
        .await
        .unwrap();
    assert!(entry.value.is_some());
}

#[tokio::test]
async fn test_transaction_rollback_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/txn"))
        .and(body_partial_json(json!([
            {"KV": {"Verb": "cas", "Key": "app/limit", "Index": 4}},
            {"KV": {"Verb": "set", "Key": "app/owner"}}
        ])))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "Results": null,
            "Errors": [{"OpIndex": 0, "What": "failed to set key \"app/limit\", index is stale"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let txn = TxnRequest::new()
        .add(TxnKvOperation::cas("app/limit", "20", 4))
        .add(TxnKvOperation::set("app/owner", "team-a"));
    let response = client_for(&server).txn().transaction(&txn).await.unwrap();

    assert!(!response.is_committed());
    assert_eq!(response.errors[0].op_index, 0);
    assert!(response.results.is_empty());
}
