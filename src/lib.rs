//! Vertex clusters for a concurrent dataflow graph.
//!
//! A vertex is six cooperating tokio tasks sharing one fault domain: an
//! anchor, a control task, a data task that relays transformed payloads to
//! its downstream workers, and three placeholder sinks. Callers hold only
//! the control and data addresses.

pub mod actors;
pub mod config;
pub mod error;
pub mod log;
pub mod message;
pub mod query;
pub mod transform;
pub mod vertex;

pub use actors::anchor::{link, Anchor};
pub use actors::{Address, DataFlow, ExitReason, Mailbox, Role, TaskId};
pub use error::{Error, Result};
pub use message::{Command, CorrelationToken, Message};
pub use query::{
    get_downstream_addresses, get_downstream_addresses_with, get_downstream_addresses_within,
    DEFAULT_QUERY_TIMEOUT,
};
pub use transform::{Registry, Transform, TransformRef};
pub use vertex::{
    add_downstream_addresses, control_clone, control_stop, create, deliver, Vertex,
};
