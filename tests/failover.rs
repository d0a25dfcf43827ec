//! Failover scenarios and the client facade

mod common;

use common::{get_request, three_member_harness, MockTransport, Step};
use rxline::{Client, ClientConfig, Error};
use tokio_test::assert_ok;

fn config() -> ClientConfig {
    ClientConfig::new(vec!["http://a:2379".into(), "http://b:2379".into()])
}

#[tokio::test]
async fn leader_failover_lands_on_new_leader() {
    // Registry {1, 2, 3} with leader 1. Member 1 fails twice, then member 2
    // reports "leader is 3": the request must land on 3 having consumed at
    // most 2 retries.
    let transport = MockTransport::new();
    transport.script(1, vec![Step::Unavailable, Step::Unavailable]);
    transport.script(2, vec![Step::Redirect("3".into())]);

    let h = three_member_harness(&ClientConfig::default(), transport);
    h.registry.set_leader(1);

    assert_ok!(h.dispatcher.dispatch(get_request("k")).await);

    // leader first, then round-robin rotation, then the redirect target
    assert_eq!(h.transport.sends(), vec![1, 1, 2, 3]);
    assert_eq!(h.registry.leader().unwrap().id, 3);
}

#[tokio::test]
async fn failing_member_keeps_channel_until_threshold() {
    let transport = MockTransport::new();
    transport.script(1, vec![Step::Unavailable, Step::Unavailable]);
    transport.script(2, vec![Step::Redirect("3".into())]);

    let h = three_member_harness(&ClientConfig::default(), transport);
    h.registry.set_leader(1);
    h.dispatcher.dispatch(get_request("k")).await.unwrap();

    // member 1 took two failures, below the default threshold of three:
    // its channel must not have been rebuilt
    assert_eq!(h.transport.connect_count(1), 1);
}

#[tokio::test]
async fn eviction_rebuilds_channel_on_next_use() {
    let mut cfg = ClientConfig::default();
    cfg.channel_failure_threshold = 2;

    let transport = MockTransport::new();
    transport.script(1, vec![Step::Unavailable, Step::Unavailable, Step::Unavailable]);

    let h = three_member_harness(&cfg, transport);
    h.registry.set_leader(1);

    // two failures against member 1 cross the threshold and evict
    let _ = h.dispatcher.dispatch(get_request("k")).await;
    assert_eq!(h.transport.connect_count(1), 1);

    // next dispatch targeting member 1 establishes a fresh channel
    h.registry.set_leader(1);
    let _ = h.dispatcher.dispatch(get_request("k")).await;
    assert_eq!(h.transport.connect_count(1), 2);
}

#[tokio::test]
async fn facade_kv_roundtrip() {
    let client = Client::with_transport(config(), MockTransport::new()).unwrap();

    client.put("k", "v").await.unwrap();

    let resp = client.get("k").await.unwrap();
    assert_eq!(resp.kvs.len(), 1);
    assert_eq!(resp.kvs[0].key, b"k".to_vec());

    let resp = client.delete("k").await.unwrap();
    assert_eq!(resp.deleted, 1);
}

#[tokio::test]
async fn sync_membership_replaces_seed_endpoints() {
    let transport = MockTransport::new();
    transport.set_member_list(vec![(7, "http://x:2379"), (8, "http://y:2379")]);

    let client = Client::with_transport(config(), transport).unwrap();
    assert_eq!(client.members().len(), 2); // seeds

    client.sync_membership().await.unwrap();

    let ids: Vec<u64> = client.members().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![7, 8]);
    assert_eq!(client.members()[0].addr, "http://x:2379");
}

#[tokio::test]
async fn empty_member_list_keeps_previous_membership() {
    let transport = MockTransport::new();
    transport.set_member_list(vec![]);

    let client = Client::with_transport(config(), transport).unwrap();
    let before = client.members();

    client.sync_membership().await.unwrap();
    assert_eq!(client.members(), before);
}

#[tokio::test]
async fn facade_surfaces_typed_errors() {
    let mut cfg = config();
    cfg.max_retries = 1;

    let transport = MockTransport::new();
    let client = Client::with_transport(cfg, transport.clone()).unwrap();

    // both seed members unavailable
    for member in client.members() {
        transport.script(member.id, vec![Step::Unavailable; 3]);
    }

    let err = client.get("k").await.unwrap_err();
    assert!(matches!(err, Error::Unreachable { .. }), "got {err}");
}
