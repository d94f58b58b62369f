//! Control task: the vertex's administrative state machine.
//!
//! ```text
//! Running --stop--> Terminated (exit "stopped", cascades through the anchor)
//! Running --clone--> Running
//! ```
//!
//! Commands are fire-and-forget; nothing is ever sent back.

use super::runtime::{self, Behavior, Context, Flow};
use super::{Address, ExitReason, Role};
use crate::message::{Command, Message};
use crate::transform::TransformRef;
use crate::{vlog_debug, Result};

/// Addresses of every other task in the cluster.
#[derive(Debug, Clone)]
pub struct Peers {
    pub anchor: Address,
    pub data: Address,
    pub trace: Address,
    pub log: Address,
    pub reflect: Address,
}

/// Control task for one vertex.
pub struct Control {
    peers: Peers,
    transform: TransformRef,
}

impl Control {
    /// `transform` is kept for diagnostics only; the data task owns the callable.
    pub fn new(peers: Peers, transform: TransformRef) -> Self {
        Self { peers, transform }
    }

    /// Start the task and return its address.
    pub fn spawn(self) -> Address {
        runtime::spawn(self)
    }

    /// Extension point for duplicating this vertex's wiring into a sibling.
    /// Currently does nothing.
    fn clone_vertex(&self, ctx: &Context) {
        vlog_debug!(
            "control {}: clone requested for {} (data {}), no-op",
            ctx.id().short(),
            self.transform,
            self.peers.data
        );
    }
}

impl Behavior for Control {
    fn role(&self) -> Role {
        Role::Control
    }

    fn handle(&mut self, msg: Message, ctx: &mut Context) -> Result<Flow> {
        match msg {
            Message::Graph(Command::Stop) => {
                vlog_debug!("control {}: stop", ctx.id().short());
                Ok(Flow::Exit(ExitReason::Stopped))
            }
            Message::Graph(Command::Clone) => {
                self.clone_vertex(ctx);
                Ok(Flow::Continue)
            }
            _ => Ok(Flow::Continue),
        }
    }
}
