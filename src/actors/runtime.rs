//! Receive loop shared by every task, plus the link registry.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::{Address, ExitReason, Role, TaskId};
use crate::message::Message;
use crate::{vlog, vlog_debug, vlog_error, vlog_warn, Result};

/// What a task does after handling a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit(ExitReason),
}

/// Message handling for one kind of task.
///
/// Handlers run to completion one message at a time. Returning an error or
/// panicking ends the task abnormally.
pub(crate) trait Behavior: Send + 'static {
    fn role(&self) -> Role;

    fn handle(&mut self, msg: Message, ctx: &mut Context) -> Result<Flow>;
}

/// Per-task state owned by the runtime and lent to the behaviour.
pub(crate) struct Context {
    id: TaskId,
    links: Links,
}

impl Context {
    fn new(id: TaskId) -> Self {
        Self {
            id,
            links: Links::default(),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Bind peers to this task. Already-linked peers and the task itself are
    /// skipped.
    pub(crate) fn link(&mut self, peers: Vec<Address>) {
        for peer in peers {
            if peer.id() == self.id {
                continue;
            }
            if self.links.add(peer.clone()) {
                vlog_debug!("{} linked {}", self.id.short(), peer);
            }
        }
    }
}

#[derive(Default)]
struct Links {
    peers: HashMap<TaskId, Address>,
    exits: FuturesUnordered<BoxFuture<'static, (TaskId, ExitReason)>>,
}

impl Links {
    fn add(&mut self, peer: Address) -> bool {
        if self.peers.contains_key(&peer.id()) {
            return false;
        }
        let watched = peer.clone();
        self.exits
            .push(async move { (watched.id(), watched.wait_exit().await) }.boxed());
        self.peers.insert(peer.id(), peer);
        true
    }

    /// Next linked peer to exit. Pending forever while nothing is linked.
    async fn next_exit(&mut self) -> (TaskId, ExitReason) {
        match self.exits.next().await {
            Some(exit) => exit,
            None => std::future::pending().await,
        }
    }

    fn forget(&mut self, peer: TaskId) {
        self.peers.remove(&peer);
    }

    fn kill_all(&self) {
        for peer in self.peers.values() {
            peer.kill();
        }
    }
}

enum Event {
    Killed,
    PeerExit(TaskId, ExitReason),
    Received(Option<Message>),
}

/// Start a task running `behavior` and return its address.
pub(crate) fn spawn<B: Behavior>(behavior: B) -> Address {
    let id = TaskId::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let kill = CancellationToken::new();
    let (exit_tx, exit_rx) = watch::channel(None);
    let address = Address::new(id, behavior.role(), tx, kill.clone(), exit_rx);

    vlog_debug!("spawn {}", address);
    tokio::spawn(run(behavior, Context::new(id), rx, kill, exit_tx));

    address
}

async fn run<B: Behavior>(
    mut behavior: B,
    mut ctx: Context,
    mut rx: mpsc::UnboundedReceiver<Message>,
    kill: CancellationToken,
    exit_tx: watch::Sender<Option<ExitReason>>,
) {
    let role = behavior.role();

    let reason = loop {
        let event = tokio::select! {
            biased;
            _ = kill.cancelled() => Event::Killed,
            (peer, reason) = ctx.links.next_exit() => Event::PeerExit(peer, reason),
            msg = rx.recv() => Event::Received(msg),
        };

        match event {
            Event::Killed => break ExitReason::Killed,
            Event::PeerExit(peer, reason) => {
                if reason.is_abnormal() {
                    break ExitReason::Linked {
                        peer,
                        reason: Box::new(reason),
                    };
                }
                ctx.links.forget(peer);
            }
            Event::Received(None) => break ExitReason::Normal,
            Event::Received(Some(msg)) => {
                if let Flow::Exit(reason) = dispatch(&mut behavior, msg, &mut ctx) {
                    break reason;
                }
            }
        }
    };

    let me = format!("{}@{}", role, ctx.id.short());
    match &reason {
        ExitReason::Normal | ExitReason::Killed => vlog_debug!("{} exited: {}", me, reason),
        ExitReason::Stopped => vlog!("{} exited: {}", me, reason),
        ExitReason::Linked { .. } => vlog_warn!("{} exited: {}", me, reason),
        ExitReason::Failed(_) | ExitReason::Panicked(_) => vlog_error!("{} exited: {}", me, reason),
    }

    if reason.is_abnormal() {
        ctx.links.kill_all();
    }
    exit_tx.send_replace(Some(reason));
}

fn dispatch<B: Behavior>(behavior: &mut B, msg: Message, ctx: &mut Context) -> Flow {
    match panic::catch_unwind(AssertUnwindSafe(|| behavior.handle(msg, ctx))) {
        Ok(Ok(flow)) => flow,
        Ok(Err(e)) => Flow::Exit(ExitReason::Failed(e.to_string())),
        Err(payload) => Flow::Exit(ExitReason::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
