//! Messages exchanged between the tasks of a vertex cluster.
//!
//! Every mailbox carries the same [`Message`] type. Control-plane traffic is
//! tagged ([`Message::Graph`] wrapping a [`Command`]); anything else is a raw
//! data payload. A task that does not recognise a command either ignores it
//! or, in the data task's case, treats only untagged messages as payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::actors::Address;

/// Unique value pairing a downstream query with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(pub Uuid);

impl CorrelationToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Control-scope commands. Which task honours which command is up to the
/// receiving behaviour.
#[derive(Debug, Clone)]
pub enum Command {
    /// Bind the listed tasks into the receiver's fault domain.
    Link(Vec<Address>),
    Stop,
    Clone,
    AddDownstream(Vec<Address>),
    GetDownstream {
        token: CorrelationToken,
        reply_to: Address,
    },
    /// Reply to [`Command::GetDownstream`].
    Downstream {
        token: CorrelationToken,
        addresses: Vec<Address>,
    },
    /// A command this build does not know; kept so senders from newer
    /// graphs can still be delivered to and ignored.
    Unknown(String),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::Link(_) => "link",
            Command::Stop => "stop",
            Command::Clone => "clone",
            Command::AddDownstream(_) => "add_downstream",
            Command::GetDownstream { .. } => "get_downstream",
            Command::Downstream { .. } => "downstream",
            Command::Unknown(name) => name.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Graph-scope tagged control message.
    Graph(Command),
    /// Untagged data payload.
    Data(Value),
}

impl Message {
    pub fn control(command: Command) -> Self {
        Message::Graph(command)
    }

    pub fn data(payload: impl Into<Value>) -> Self {
        Message::Data(payload.into())
    }

    /// Short label for logs; payload contents are not included.
    pub fn label(&self) -> String {
        match self {
            Message::Graph(cmd) => format!("graph/{}", cmd.name()),
            Message::Data(_) => "data".to_string(),
        }
    }
}
