//! Caller-owned inbox.
//!
//! A [`Mailbox`] has an [`Address`] like any task, but nothing runs behind
//! it: the owner pulls messages out directly. It is how a caller receives
//! query replies, and how a test or CLI stands in for a downstream worker.
//!
//! A mailbox still belongs to the fault domain it is linked into: killing
//! its address marks it exited with [`ExitReason::Killed`] and stops
//! delivery to the owner.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{Address, ExitReason, Role, TaskId};
use crate::message::Message;

pub struct Mailbox {
    address: Address,
    rx: mpsc::UnboundedReceiver<Message>,
    kill: CancellationToken,
    exit_tx: Arc<watch::Sender<Option<ExitReason>>>,
    watcher: Option<JoinHandle<()>>,
}

impl Mailbox {
    /// Create an inbox with a fresh address.
    ///
    /// Inside a tokio runtime a small watcher records a kill as the exit
    /// reason straight away; elsewhere the kill is noticed on the next read.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = watch::channel(None);
        let exit_tx = Arc::new(exit_tx);
        let kill = CancellationToken::new();
        let address = Address::new(TaskId::new(), Role::Mailbox, tx, kill.clone(), exit_rx);
        let watcher = Handle::try_current().ok().map(|handle| {
            let kill = kill.clone();
            let exit_tx = exit_tx.clone();
            handle.spawn(async move {
                kill.cancelled().await;
                mark_killed(&exit_tx);
            })
        });
        Self {
            address,
            rx,
            kill,
            exit_tx,
            watcher,
        }
    }

    /// Address to hand out as a downstream worker or reply target.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Next message. The mailbox holds its own address, so this only
    /// resolves when something arrives or the address is killed.
    pub async fn recv(&mut self) -> Option<Message> {
        if self.killed() {
            return None;
        }
        let exit_tx = &self.exit_tx;
        tokio::select! {
            biased;
            _ = self.kill.cancelled() => {
                mark_killed(exit_tx);
                None
            }
            msg = self.rx.recv() => msg,
        }
    }

    /// Next message within `wait`.
    pub async fn recv_timeout(&mut self, wait: Duration) -> Option<Message> {
        tokio::time::timeout(wait, self.recv()).await.ok().flatten()
    }

    /// Next data payload within `wait`, skipping control traffic.
    pub async fn recv_data(&mut self, wait: Duration) -> Option<Value> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            match tokio::time::timeout_at(deadline, self.recv()).await {
                Ok(Some(Message::Data(value))) => return Some(value),
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => return None,
            }
        }
    }

    /// Drain every payload already queued, without waiting.
    pub fn drain_data(&mut self) -> Vec<Value> {
        let mut values = Vec::new();
        if self.killed() {
            return values;
        }
        while let Ok(msg) = self.rx.try_recv() {
            if let Message::Data(value) = msg {
                values.push(value);
            }
        }
        values
    }

    fn killed(&mut self) -> bool {
        if !self.kill.is_cancelled() {
            return false;
        }
        mark_killed(&self.exit_tx);
        self.rx.close();
        true
    }
}

/// Record `Killed` unless an exit reason is already set.
fn mark_killed(exit_tx: &watch::Sender<Option<ExitReason>>) {
    exit_tx.send_if_modified(|reason| {
        if reason.is_some() {
            return false;
        }
        *reason = Some(ExitReason::Killed);
        true
    });
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Mailbox {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        self.exit_tx.send_if_modified(|reason| {
            if reason.is_some() {
                return false;
            }
            *reason = Some(ExitReason::Normal);
            true
        });
    }
}
