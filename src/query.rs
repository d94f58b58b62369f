//! Synchronous downstream query.
//!
//! The caller sends `get_downstream(token, reply_to)` from a private
//! [`Mailbox`] and waits for the reply carrying the same token. Only the
//! caller blocks, and only up to the bound.

use std::time::Duration;

use crate::actors::{Address, Mailbox};
use crate::config::Config;
use crate::message::{Command, CorrelationToken, Message};
use crate::{vlog_debug, vlog_trace, Error, Result};

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(2000);

/// Current downstream set of `data`, in relay order.
pub async fn get_downstream_addresses(data: &Address) -> Result<Vec<Address>> {
    get_downstream_addresses_within(data, DEFAULT_QUERY_TIMEOUT).await
}

/// Same as [`get_downstream_addresses`] with the configured bound.
pub async fn get_downstream_addresses_with(data: &Address, config: &Config) -> Result<Vec<Address>> {
    get_downstream_addresses_within(data, config.query_timeout()).await
}

pub async fn get_downstream_addresses_within(
    data: &Address,
    bound: Duration,
) -> Result<Vec<Address>> {
    let mut inbox = Mailbox::new();
    let token = CorrelationToken::new();
    let deadline = tokio::time::Instant::now() + bound;

    let request = Message::control(Command::GetDownstream {
        token,
        reply_to: inbox.address().clone(),
    });
    // A send to a task that is already gone still waits out the bound.
    if data.send(request).is_err() {
        vlog_debug!("query {}: {} is gone", token, data);
    }

    loop {
        match tokio::time::timeout_at(deadline, inbox.recv()).await {
            Ok(Some(Message::Graph(Command::Downstream { token: t, addresses }))) if t == token => {
                return Ok(addresses);
            }
            Ok(Some(other)) => vlog_trace!("query {}: discarding {}", token, other.label()),
            Ok(None) | Err(_) => return Err(Error::Timeout(bound)),
        }
    }
}
