//! Synchronous query tests.

use std::time::Duration;

use tokio_test::assert_err;
use vertex::{
    get_downstream_addresses, get_downstream_addresses_within, Command, CorrelationToken,
    DataFlow, Error, Message, DEFAULT_QUERY_TIMEOUT,
};

use crate::fixtures::{addresses, TestVertex};

#[tokio::test]
async fn test_concurrent_queries_get_their_own_replies() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    let workers = v.attach_workers(3);
    let expected = addresses(&workers);

    let (a, b, c) = tokio::join!(
        get_downstream_addresses(&v.data),
        get_downstream_addresses(&v.data),
        get_downstream_addresses(&v.data),
    );
    for result in [a, b, c] {
        assert_eq!(result.unwrap(), expected);
    }
}

#[tokio::test]
async fn test_query_does_not_disturb_relay_state() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    let workers = v.attach_workers(2);
    for _ in 0..3 {
        get_downstream_addresses(&v.data).await.unwrap();
    }
    assert_eq!(
        get_downstream_addresses(&v.data).await.unwrap(),
        addresses(&workers)
    );
}

#[tokio::test(start_paused = true)]
async fn test_query_against_stopped_vertex_times_out() {
    let v = TestVertex::new(DataFlow::RoundRobin);
    vertex::control_stop(&v.control);
    v.data.wait_exit().await;

    let start = tokio::time::Instant::now();
    let err = assert_err!(get_downstream_addresses(&v.data).await);
    assert!(matches!(err, Error::Timeout(d) if d == DEFAULT_QUERY_TIMEOUT));
    assert!(start.elapsed() >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_reply_with_foreign_token_is_ignored() {
    // A mailbox standing in for a data task that answers with the wrong token.
    let mut impostor = vertex::Mailbox::new();
    let target = impostor.address().clone();

    let answer = tokio::spawn(async move {
        if let Some(Message::Graph(Command::GetDownstream { reply_to, .. })) = impostor.recv().await {
            reply_to
                .send(Message::control(Command::Downstream {
                    token: CorrelationToken::new(),
                    addresses: vec![],
                }))
                .unwrap();
        }
        impostor
    });

    let result = get_downstream_addresses_within(&target, Duration::from_millis(100)).await;
    assert!(matches!(result, Err(Error::Timeout(_))));
    drop(answer.await.unwrap());
}
