//! Integration test suite for vertex clusters.
//!
//! These tests drive vertices only through the public API: construction,
//! fire-and-forget control/data operations and the downstream query.
//! Downstream workers are [`vertex::Mailbox`] stand_ins.
//!
//! # Test Categories
//!
//! - `relay`: round-robin and broadcast distribution, chained vertices
//! - `membership`: add/query of the downstream set
//! - `query`: correlation and timeout behaviour of the synchronous query
//! - `fault`: stop, transform failure and shared-anchor teardown

mod fixtures;

mod membership;
mod query;
mod relay;
