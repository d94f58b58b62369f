//! Vertex construction and the public control/data operations.
//!
//! A vertex is six tasks created together: data, trace, log, reflect,
//! control (holding the other addresses), all linked into a caller-supplied
//! anchor. Callers only ever see the control and data addresses.

use serde_json::Value;

use crate::actors::anchor;
use crate::actors::control::{Control, Peers};
use crate::actors::data::Data;
use crate::actors::sink::Sink;
use crate::actors::{Address, DataFlow, Role};
use crate::config::Config;
use crate::message::{Command, Message};
use crate::transform::Transform;
use crate::{vlog, vlog_debug, Result};

/// Builder for one vertex cluster.
pub struct Vertex {
    anchor: Address,
    transform: Transform,
    method: DataFlow,
}

/// All six tasks of a spawned vertex.
#[derive(Debug, Clone)]
pub(crate) struct Cluster {
    pub anchor: Address,
    pub control: Address,
    pub data: Address,
    pub trace: Address,
    pub log: Address,
    pub reflect: Address,
}

impl Cluster {
    pub(crate) fn tasks(&self) -> [&Address; 6] {
        [
            &self.anchor,
            &self.control,
            &self.data,
            &self.trace,
            &self.log,
            &self.reflect,
        ]
    }
}

impl Vertex {
    /// Round-robin vertex bound to `anchor`.
    pub fn new(anchor: &Address, transform: Transform) -> Self {
        Self {
            anchor: anchor.clone(),
            transform,
            method: DataFlow::default(),
        }
    }

    /// Like [`Vertex::new`], with the relay method taken from `config`.
    pub fn from_config(anchor: &Address, transform: Transform, config: &Config) -> Self {
        Self::new(anchor, transform).with_method(config.method)
    }

    /// Relay method; fixed once the vertex is spawned.
    pub fn with_method(mut self, method: DataFlow) -> Self {
        self.method = method;
        self
    }

    /// Spawn the cluster and return `(control, data)`.
    pub fn spawn(self) -> Result<(Address, Address)> {
        let cluster = self.spawn_cluster()?;
        Ok((cluster.control, cluster.data))
    }

    pub(crate) fn spawn_cluster(self) -> Result<Cluster> {
        let reference = self.transform.reference().clone();

        let data = Data::new(self.transform, self.method).spawn();
        let trace = Sink::spawn(Role::Trace);
        let log = Sink::spawn(Role::Log);
        let reflect = Sink::spawn(Role::Reflect);
        let control = Control::new(
            Peers {
                anchor: self.anchor.clone(),
                data: data.clone(),
                trace: trace.clone(),
                log: log.clone(),
                reflect: reflect.clone(),
            },
            reference.clone(),
        )
        .spawn();

        let members = vec![
            control.clone(),
            data.clone(),
            trace.clone(),
            log.clone(),
            reflect.clone(),
        ];
        if let Err(e) = anchor::link(&self.anchor, members.clone()) {
            for task in &members {
                task.kill();
            }
            return Err(e);
        }

        let cluster = Cluster {
            anchor: self.anchor,
            control,
            data,
            trace,
            log,
            reflect,
        };
        vlog!("vertex {} ({}) spawned", reference, self.method);
        vlog_debug!("vertex {} tasks: {:?}", reference, cluster.tasks());
        Ok(cluster)
    }
}

/// Create a round-robin vertex bound to `anchor`.
pub fn create(anchor: &Address, transform: Transform) -> Result<(Address, Address)> {
    Vertex::new(anchor, transform).spawn()
}

/// Stop the vertex. Tears down everything sharing its anchor.
pub fn control_stop(control: &Address) {
    fire(control, Message::control(Command::Stop));
}

/// Ask the control task to clone the vertex. Currently a no-op.
pub fn control_clone(control: &Address) {
    fire(control, Message::control(Command::Clone));
}

/// Append workers to the downstream set. Duplicates are kept.
pub fn add_downstream_addresses(data: &Address, addresses: Vec<Address>) {
    fire(data, Message::control(Command::AddDownstream(addresses)));
}

/// Hand a payload to the data task for relay.
pub fn deliver(data: &Address, payload: impl Into<Value>) {
    fire(data, Message::data(payload));
}

fn fire(to: &Address, msg: Message) {
    let label = msg.label();
    if to.send(msg).is_err() {
        vlog_debug!("{} sent to {} after it exited, dropped", label, to);
    }
}
