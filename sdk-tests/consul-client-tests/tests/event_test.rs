//! User events against a live agent

mod common;

use consul_client::EventListOptions;
use consul_client::model::EventOptions;

use common::{live_client, unique};

#[tokio::test]
#[ignore = "requires running Consul agent"]
async fn test_fire_and_list() {
    let events = live_client().event();
    let name = unique("deploy");

    let fired = events
        .fire_event(&name, &EventOptions::new().with_payload("v42"))
        .await
        .unwrap();

    let listed = events
        .list_events(&EventListOptions::new().with_name(&name))
        .await
        .unwrap();
    let found = listed
        .value
        .iter()
        .find(|e| e.id == fired.id)
        .expect("fired event not listed");
    assert_eq!(found.payload_str(), Some("v42"));
}
