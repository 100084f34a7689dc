//! KV round trips against a live agent

mod common;

use consul_client::{BlockingQueryOptions, KeyValueOptions};

use common::{live_client, unique};

#[tokio::test]
#[ignore = "requires running Consul agent"]
async fn test_put_get_delete() {
    let kv = live_client().kv();
    let key = format!("consul-client-tests/{}", unique("kv"));

    assert!(kv.put_value(&key, "hello", None).await.unwrap());

    let entry = kv
        .get_value(&key, &BlockingQueryOptions::new())
        .await
        .unwrap();
    assert_eq!(entry.value.as_ref().and_then(|e| e.value_str()), Some("hello"));
    assert!(entry.index().is_some());

    kv.delete_value(&key).await.unwrap();
    let gone = kv
        .get_value(&key, &BlockingQueryOptions::new())
        .await
        .unwrap();
    assert!(gone.value.is_none());
}

#[tokio::test]
#[ignore = "requires running Consul agent"]
async fn test_cas_update() {
    let kv = live_client().kv();
    let key = format!("consul-client-tests/{}", unique("cas"));

    kv.put_value(&key, "1", None).await.unwrap();
    let entry = kv
        .get_value(&key, &BlockingQueryOptions::new())
        .await
        .unwrap()
        .value
        .unwrap();

    let stale = KeyValueOptions::new().with_cas(entry.modify_index + 1000);
    assert!(!kv.put_value(&key, "2", Some(&stale)).await.unwrap());

    let fresh = KeyValueOptions::new().with_cas(entry.modify_index);
    assert!(kv.put_value(&key, "2", Some(&fresh)).await.unwrap());

    kv.delete_value(&key).await.unwrap();
}

#[tokio::test]
#[ignore = "requires running Consul agent"]
async fn test_keys_under_prefix() {
    let kv = live_client().kv();
    let prefix = format!("consul-client-tests/{}/", unique("tree"));
    for name in ["a", "b", "sub/c"] {
        kv.put_value(&format!("{}{}", prefix, name), name, None)
            .await
            .unwrap();
    }

    let keys = kv
        .get_keys(&prefix, Some("/"), &BlockingQueryOptions::new())
        .await
        .unwrap();
    assert_eq!(
        keys.value,
        vec![
            format!("{}a", prefix),
            format!("{}b", prefix),
            format!("{}sub/", prefix)
        ]
    );

    kv.delete_values(&prefix).await.unwrap();
    let empty = kv
        .get_values(&prefix, &BlockingQueryOptions::new())
        .await
        .unwrap();
    assert!(empty.value.is_empty());
}
