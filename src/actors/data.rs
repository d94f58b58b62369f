//! Data task: downstream membership and relay.
//!
//! Messages are handled strictly in arrival order:
//! - `add_downstream(list)` appends to the worker set (no dedup)
//! - `get_downstream(token, reply_to)` replies with a snapshot
//! - other graph-tagged messages are ignored
//! - untagged messages are payloads and get relayed
//!
//! Both relay methods invoke the transform exactly once per payload.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::runtime::{self, Behavior, Context, Flow};
use super::{Address, Role};
use crate::message::{Command, Message};
use crate::transform::Transform;
use crate::{vlog_debug, vlog_trace, Error, Result};

/// How a payload's result is distributed to downstream workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFlow {
    /// One worker per payload, rotating through the set.
    #[default]
    RoundRobin,
    /// Every worker gets the same result.
    Broadcast,
}

impl fmt::Display for DataFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFlow::RoundRobin => write!(f, "round_robin"),
            DataFlow::Broadcast => write!(f, "broadcast"),
        }
    }
}

/// Data task: owns the downstream worker set and relays transformed
/// payloads to it.
pub struct Data {
    workers: VecDeque<Address>,
    transform: Transform,
    method: DataFlow,
}

impl Data {
    /// Data task with an empty downstream set.
    pub fn new(transform: Transform, method: DataFlow) -> Self {
        Self {
            workers: VecDeque::new(),
            transform,
            method,
        }
    }

    /// Start the task and return its address.
    pub fn spawn(self) -> Address {
        runtime::spawn(self)
    }

    fn relay(&mut self, payload: Value) -> Result<()> {
        match self.method {
            DataFlow::RoundRobin => {
                let worker = self.workers.pop_front().ok_or(Error::EmptyDownstream)?;
                let result = self.transform.invoke(payload)?;
                vlog_trace!("data: {} -> {}", self.transform.reference(), worker);
                deliver(&worker, result);
                self.workers.push_back(worker);
            }
            DataFlow::Broadcast => {
                let result = self.transform.invoke(payload)?;
                vlog_trace!(
                    "data: {} -> {} workers",
                    self.transform.reference(),
                    self.workers.len()
                );
                for worker in &self.workers {
                    deliver(worker, result.clone());
                }
            }
        }
        Ok(())
    }
}

/// Sends to a vanished worker are dropped, like any send to a dead task.
fn deliver(worker: &Address, result: Value) {
    if worker.send(Message::Data(result)).is_err() {
        vlog_debug!("data: worker {} is gone, result dropped", worker);
    }
}

impl Behavior for Data {
    fn role(&self) -> Role {
        Role::Data
    }

    fn handle(&mut self, msg: Message, ctx: &mut Context) -> Result<Flow> {
        match msg {
            Message::Graph(Command::AddDownstream(addresses)) => {
                vlog_debug!(
                    "data {}: adding {} downstream (now {})",
                    ctx.id().short(),
                    addresses.len(),
                    self.workers.len() + addresses.len()
                );
                self.workers.extend(addresses);
            }
            Message::Graph(Command::GetDownstream { token, reply_to }) => {
                let addresses = self.workers.iter().cloned().collect();
                let reply = Message::control(Command::Downstream { token, addresses });
                if reply_to.send(reply).is_err() {
                    vlog_debug!("data {}: query caller {} is gone", ctx.id().short(), reply_to);
                }
            }
            Message::Graph(_) => {}
            Message::Data(payload) => self.relay(payload)?,
        }
        Ok(Flow::Continue)
    }
}
