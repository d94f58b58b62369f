//! Relay distribution tests.

use serde_json::json;
use vertex::{deliver, get_downstream_addresses, Anchor, DataFlow, Mailbox, Transform, TransformRef, Vertex};

use crate::fixtures::{addresses, collect, double, TestVertex, WAIT};

#[tokio::test]
async fn test_round_robin_double_scenario() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    let mut workers = v.attach_workers(2);
    for n in [3, 4, 5] {
        deliver(&v.data, n);
    }

    assert_eq!(collect(&mut workers[0]).await, vec![json!(6), json!(10)]);
    assert_eq!(collect(&mut workers[1]).await, vec![json!(8)]);
}

#[tokio::test]
async fn test_query_reply_follows_earlier_payloads() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    let mut workers = v.attach_workers(2);
    for n in [3, 4, 5] {
        deliver(&v.data, n);
    }
    tokio_test::assert_ok!(get_downstream_addresses(&v.data).await);

    assert_eq!(workers[0].drain_data(), vec![json!(6), json!(10)]);
    assert_eq!(workers[1].drain_data(), vec![json!(8)]);
}

#[tokio::test]
async fn test_broadcast_double_scenario() {
    let v = TestVertex::new(DataFlow::Broadcast);
    let mut workers = v.attach_workers(2);
    deliver(&v.data, 7);

    assert_eq!(collect(&mut workers[0]).await, vec![json!(14)]);
    assert_eq!(collect(&mut workers[1]).await, vec![json!(14)]);
}

#[tokio::test]
async fn test_round_robin_fairness() {
    for (payloads, k) in [(1usize, 1usize), (7, 3), (12, 4), (5, 8)] {
        let identity = Transform::new(TransformRef::new("core", "identity").unwrap(), Ok);
        let v = TestVertex::with_transform(identity, DataFlow::RoundRobin);
        let mut workers = v.attach_workers(k);
        for i in 0..payloads {
            deliver(&v.data, i);
        }

        for (j, worker) in workers.iter_mut().enumerate() {
            let got = collect(worker).await;
            let expected: Vec<_> = (0..payloads).filter(|i| i % k == j).map(|i| json!(i)).collect();
            assert_eq!(got, expected, "worker {} of {} after {} payloads", j, k, payloads);
            assert!(got.len() == payloads / k || got.len() == payloads.div_ceil(k));
        }
    }
}

#[tokio::test]
async fn test_round_robin_rotation_preserves_membership() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    let workers = v.attach_workers(3);
    for n in 0..4 {
        deliver(&v.data, n);
    }

    // Four payloads over three workers: the first worker has rotated to the tail.
    let set = get_downstream_addresses(&v.data).await.unwrap();
    let original = addresses(&workers);
    assert_eq!(set, vec![original[1].clone(), original[2].clone(), original[0].clone()]);
}

#[tokio::test]
async fn test_broadcast_leaves_set_unchanged() {
    let v = TestVertex::new(DataFlow::Broadcast);
    let mut workers = v.attach_workers(3);
    let before = get_downstream_addresses(&v.data).await.unwrap();
    deliver(&v.data, 1);
    deliver(&v.data, 2);

    for worker in workers.iter_mut() {
        assert_eq!(collect(worker).await, vec![json!(2), json!(4)]);
    }
    assert_eq!(get_downstream_addresses(&v.data).await.unwrap(), before);
}

#[tokio::test]
async fn test_workers_added_between_payloads() {
    let v = TestVertex::new(DataFlow::Broadcast);
    let mut first = v.attach_workers(1);
    deliver(&v.data, 1);
    let mut second = v.attach_workers(1);
    deliver(&v.data, 2);

    assert_eq!(collect(&mut first[0]).await, vec![json!(2), json!(4)]);
    assert_eq!(collect(&mut second[0]).await, vec![json!(4)]);
}

#[tokio::test]
async fn test_chained_vertices_share_an_anchor() {
    let anchor = Anchor::spawn();
    let (_c1, head) = Vertex::new(&anchor, double()).spawn().unwrap();
    let (_c2, tail) = Vertex::new(&anchor, double()).spawn().unwrap();
    let mut sink = Mailbox::new();

    vertex::add_downstream_addresses(&head, vec![tail.clone()]);
    vertex::add_downstream_addresses(&tail, vec![sink.address().clone()]);
    deliver(&head, 5);

    assert_eq!(sink.recv_data(WAIT).await, Some(json!(20)));
}
