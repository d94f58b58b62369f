//! Task system for vertex clusters.
//!
//! Each task is an independent tokio task that owns an unbounded mailbox and
//! handles one [`Message`] at a time. Tasks of a vertex:
//! - Fault domain anchor (`anchor`)
//! - Control task (`control`)
//! - Data task (`data`)
//! - Trace, log and reflect sinks (`sink`)
//!
//! Tasks are reached only through an [`Address`]. Failure propagation uses
//! links: a task that exits abnormally kills every task it is linked to, and
//! a task notices when a linked peer exits abnormally and follows it.

pub mod anchor;
pub mod control;
pub mod data;
pub mod mailbox;
pub(crate) mod runtime;
pub mod sink;

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::message::Message;
use crate::{Error, Result};

pub use data::DataFlow;
pub use mailbox::Mailbox;

/// Unique identifier for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 characters of the UUID, for log lines.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Responsibility of a task within its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anchor,
    Control,
    Data,
    Trace,
    Log,
    Reflect,
    /// A caller-owned inbox with no task behind it.
    Mailbox,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Anchor => "anchor",
            Role::Control => "control",
            Role::Data => "data",
            Role::Trace => "trace",
            Role::Log => "log",
            Role::Reflect => "reflect",
            Role::Mailbox => "mailbox",
        };
        f.write_str(s)
    }
}

/// Why a task stopped running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Mailbox closed; not propagated to links.
    Normal,
    /// Explicit `stop` command.
    Stopped,
    /// Killed from outside, including by a dying linked peer.
    Killed,
    /// A message handler returned an error.
    Failed(String),
    /// A message handler panicked.
    Panicked(String),
    /// A linked peer exited abnormally.
    Linked { peer: TaskId, reason: Box<ExitReason> },
}

impl ExitReason {
    /// Abnormal exits take down every linked task.
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, ExitReason::Normal)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Normal => write!(f, "normal"),
            ExitReason::Stopped => write!(f, "stopped"),
            ExitReason::Killed => write!(f, "killed"),
            ExitReason::Failed(e) => write!(f, "failed: {}", e),
            ExitReason::Panicked(e) => write!(f, "panicked: {}", e),
            ExitReason::Linked { peer, reason } => {
                write!(f, "linked {} exited ({})", peer.short(), reason)
            }
        }
    }
}

/// Handle used to reach a task.
///
/// Cloning is cheap. Equality and hashing go by [`TaskId`] only.
#[derive(Clone)]
pub struct Address {
    id: TaskId,
    role: Role,
    tx: mpsc::UnboundedSender<Message>,
    kill: CancellationToken,
    exit: watch::Receiver<Option<ExitReason>>,
}

impl Address {
    pub(crate) fn new(
        id: TaskId,
        role: Role,
        tx: mpsc::UnboundedSender<Message>,
        kill: CancellationToken,
        exit: watch::Receiver<Option<ExitReason>>,
    ) -> Self {
        Self {
            id,
            role,
            tx,
            kill,
            exit,
        }
    }

    /// Identity of the task behind this address.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// What the task does within its vertex.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Queue a message; fails once the task's mailbox is gone.
    pub fn send(&self, msg: Message) -> Result<()> {
        self.tx.send(msg).map_err(|_| Error::Disconnected {
            role: self.role,
            id: self.id,
        })
    }

    /// Terminate the task abnormally, as if it had crashed.
    pub fn kill(&self) {
        self.kill.cancel();
    }

    /// True until the task has exited or its mailbox is gone.
    pub fn is_alive(&self) -> bool {
        self.exit.borrow().is_none() && !self.tx.is_closed()
    }

    /// Exit reason if the task has already stopped.
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit.borrow().clone()
    }

    /// Wait until the task stops and return why.
    pub async fn wait_exit(&self) -> ExitReason {
        let mut exit = self.exit.clone();
        let reported = exit
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|reason| (*reason).clone());
        // No report means the runtime dropped the task before it could exit.
        reported.unwrap_or(ExitReason::Killed)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.id.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.id.short())
    }
}
