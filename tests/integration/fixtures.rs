//! Shared helpers for integration tests.

use std::time::Duration;

use serde_json::Value;
use vertex::{add_downstream_addresses, Address, Anchor, DataFlow, Mailbox, Registry, Transform, Vertex};

/// Upper bound for anything that should happen "promptly".
pub const WAIT: Duration = Duration::from_secs(1);

/// How long to listen before concluding nothing more will arrive.
pub const QUIET: Duration = Duration::from_millis(50);

pub fn double() -> Transform {
    Registry::builtin()
        .resolve("math:double")
        .expect("builtin double")
}

/// A vertex on a fresh anchor, with no downstream workers.
pub struct TestVertex {
    pub anchor: Address,
    pub control: Address,
    pub data: Address,
}

impl TestVertex {
    pub fn new(method: DataFlow) -> Self {
        Self::with_transform(double(), method)
    }

    pub fn with_transform(transform: Transform, method: DataFlow) -> Self {
        let anchor = Anchor::spawn();
        let (control, data) = Vertex::new(&anchor, transform)
            .with_method(method)
            .spawn()
            .expect("spawn vertex");
        Self {
            anchor,
            control,
            data,
        }
    }

    /// Attach `count` fresh stand-in workers and return them in insertion order.
    pub fn attach_workers(&self, count: usize) -> Vec<Mailbox> {
        let workers: Vec<Mailbox> = (0..count).map(|_| Mailbox::new()).collect();
        add_downstream_addresses(&self.data, addresses(&workers));
        workers
    }
}

pub fn addresses(workers: &[Mailbox]) -> Vec<Address> {
    workers.iter().map(|w| w.address().clone()).collect()
}

/// Everything a worker receives until it has been quiet for [`QUIET`].
pub async fn collect(worker: &mut Mailbox) -> Vec<Value> {
    let mut values = Vec::new();
    while let Some(v) = worker.recv_data(QUIET).await {
        values.push(v);
    }
    values
}

/// Wait for `task` to exit and assert the exit was abnormal.
pub async fn assert_terminated(task: &Address) {
    let reason = tokio::time::timeout(WAIT, task.wait_exit())
        .await
        .unwrap_or_else(|_| panic!("{} is still running", task));
    assert!(reason.is_abnormal(), "{} exited with {}", task, reason);
}

/// Give spawned tasks a moment to drain their mailboxes.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
