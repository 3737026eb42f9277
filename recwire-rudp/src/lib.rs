//! # recwire-rudp
//!
//! Stop-and-wait reliable transport for the recwire record store, layered
//! on an unreliable datagram channel.
//!
//! ## Protocol
//!
//! - One request in flight at a time (stop-and-wait, no pipelining)
//! - Sequence-numbered requests; the reply echoes the request sequence
//! - Timeout-triggered retransmission, bounded attempts
//! - Foreign senders and stale duplicates silently discarded
//!
//! ## Client
//!
//! ```rust,ignore
//! use recwire_proto::Record;
//! use recwire_rudp::Connection;
//!
//! let mut conn = Connection::open("127.0.0.1:7400")?;
//! let reply = conn.execute(Record::add(7, "Ann", 30))?;
//! println!("server said: {:?}", reply.command);
//! conn.close()?;
//! ```
//!
//! ## Server
//!
//! ```rust,ignore
//! use recwire_rudp::RecordServer;
//!
//! let mut server = RecordServer::bind("0.0.0.0:7400")?;
//! server.run()?;
//! ```
//!
//! The server mirrors the client's state machine per peer address: it
//! answers a retransmitted request with the previously computed reply
//! instead of touching the store again, so duplicated datagrams never
//! double-apply an operation.

pub mod client;
pub mod error;
pub mod peer;
pub mod server;
pub mod store;
pub mod timer;

mod socket;

pub use client::{ArqConfig, Connection, ATTEMPT_TIMEOUT, MAX_ATTEMPTS};
pub use error::{ArqError, Result};
pub use server::RecordServer;
pub use store::{AddOutcome, RecordStore};
pub use timer::RetryTimer;
