//! Fault domain anchor.
//!
//! The anchor has no behaviour beyond linking: every task of a vertex (and,
//! through anchor chaining, every vertex of a graph) is linked to it, so one
//! abnormal exit anywhere tears the whole domain down.

use super::runtime::{self, Behavior, Context, Flow};
use super::{Address, Role};
use crate::message::{Command, Message};
use crate::{vlog_warn, Result};

pub struct Anchor;

impl Anchor {
    /// Start a fresh anchor. Typically one per graph.
    pub fn spawn() -> Address {
        runtime::spawn(Anchor)
    }
}

impl Behavior for Anchor {
    fn role(&self) -> Role {
        Role::Anchor
    }

    fn handle(&mut self, msg: Message, ctx: &mut Context) -> Result<Flow> {
        match msg {
            Message::Graph(Command::Link(peers)) => ctx.link(peers),
            other => vlog_warn!(
                "anchor {}: unrecognised instruction {}",
                ctx.id().short(),
                other.label()
            ),
        }
        Ok(Flow::Continue)
    }
}

/// Ask `anchor` to link `peers`. Binding is incremental; call it again as
/// the graph grows.
pub fn link(anchor: &Address, peers: Vec<Address>) -> Result<()> {
    anchor.send(Message::control(Command::Link(peers)))
}
