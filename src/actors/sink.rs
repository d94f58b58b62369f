//! Trace, log and reflect sinks.
//!
//! Placeholders reserved for diagnostics, audit and state introspection.
//! Today a sink honours `link` and drops everything else.

use super::runtime::{self, Behavior, Context, Flow};
use super::{Address, Role};
use crate::message::{Command, Message};
use crate::{vlog_trace, Result};

pub struct Sink {
    role: Role,
}

impl Sink {
    pub fn spawn(role: Role) -> Address {
        debug_assert!(matches!(role, Role::Trace | Role::Log | Role::Reflect));
        runtime::spawn(Sink { role })
    }
}

impl Behavior for Sink {
    fn role(&self) -> Role {
        self.role
    }

    fn handle(&mut self, msg: Message, ctx: &mut Context) -> Result<Flow> {
        match msg {
            Message::Graph(Command::Link(peers)) => ctx.link(peers),
            other => vlog_trace!("{} sink dropped {}", self.role, other.label()),
        }
        Ok(Flow::Continue)
    }
}
