//! Downstream membership tests.

use tokio_test::assert_ok;
use vertex::{add_downstream_addresses, get_downstream_addresses, DataFlow, Mailbox};

use crate::fixtures::{addresses, TestVertex};

#[tokio::test]
async fn test_new_vertex_has_no_downstream() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    let set = assert_ok!(get_downstream_addresses(&v.data).await);
    assert!(set.is_empty());
}

#[tokio::test]
async fn test_add_appends_in_order() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    let existing = v.attach_workers(2);
    let (a, b) = (Mailbox::new(), Mailbox::new());
    add_downstream_addresses(&v.data, vec![a.address().clone(), b.address().clone()]);

    let mut expected = addresses(&existing);
    expected.push(a.address().clone());
    expected.push(b.address().clone());
    assert_eq!(assert_ok!(get_downstream_addresses(&v.data).await), expected);
}

#[tokio::test]
async fn test_add_does_not_deduplicate() {
    let v = TestVertex::new(DataFlow::Broadcast);
    let existing = v.attach_workers(1);
    let a = existing[0].address().clone();
    add_downstream_addresses(&v.data, vec![a.clone(), a.clone()]);

    assert_eq!(
        assert_ok!(get_downstream_addresses(&v.data).await),
        vec![a.clone(), a.clone(), a]
    );
}

#[tokio::test]
async fn test_duplicate_worker_gets_one_copy_per_entry() {
    let v = TestVertex::new(DataFlow::Broadcast);
    let mut worker = Mailbox::new();
    add_downstream_addresses(&v.data, vec![worker.address().clone(), worker.address().clone()]);
    vertex::deliver(&v.data, 1);

    assert_eq!(crate::fixtures::collect(&mut worker).await.len(), 2);
}

#[tokio::test]
async fn test_empty_add_is_a_no_op() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    let workers = v.attach_workers(2);
    add_downstream_addresses(&v.data, Vec::new());
    assert_eq!(
        assert_ok!(get_downstream_addresses(&v.data).await),
        addresses(&workers)
    );
}
