//! # recwire-proto
//!
//! Shared wire types for the recwire record-store protocol.
//!
//! This crate provides the on-wire vocabulary used by both the client
//! transport and the server:
//!
//! - [`FrameType`]: frame type discriminator (SYN / DATA / ACK / FIN)
//! - [`Frame`]: one datagram's worth of protocol state
//! - [`Record`]: the add/retrieve request and response payload
//! - [`Command`]: record command and response status codes
//!
//! ## Wire format
//!
//! All multi-byte fields are **network byte order** (big-endian), so client
//! and server agree regardless of host architecture. Two frame shapes exist:
//!
//! ```text
//! Control (SYN/ACK/FIN), 8 bytes:
//!   type:u32 | sequence:u32
//!
//! Data, 52 bytes:
//!   type:u32 | sequence:u32 | command:u32 | id:u32 | name:[u8;32] | age:u32
//! ```
//!
//! No other lengths are valid; [`Frame::decode`] rejects everything else.
//!
//! ## Usage
//!
//! ```rust
//! use recwire_proto::{Frame, Record};
//!
//! let request = Record::add(7, "Ann", 30);
//! let frame = Frame::data(0, request);
//!
//! let bytes = frame.encode();
//! let parsed = Frame::decode(&bytes).unwrap();
//! assert_eq!(parsed, frame);
//! ```

mod frame;
mod record;

pub use frame::{Frame, FrameType, WireError, CONTROL_FRAME_LEN, DATA_FRAME_LEN};
pub use record::{Command, Record, MAX_NAME_LEN, RECORD_LEN};
