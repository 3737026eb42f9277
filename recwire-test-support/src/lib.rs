//! # recwire-test-support
//!
//! Fault injection for transport tests:
//!
//! - [`FaultPlan`]: per-datagram drop/duplicate decisions
//! - [`LossyProxy`]: a UDP forwarder that applies fault plans between a
//!   real client and server
//!
//! None of this ships in production builds; the transport crates pull it in
//! as a dev-dependency only.

pub mod fault;
pub mod proxy;

pub use fault::{DropDecision, FaultPattern, FaultPlan};
pub use proxy::LossyProxy;
