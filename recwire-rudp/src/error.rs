//! Error types for recwire-rudp.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArqError>;

/// Failures that cross the transport boundary.
///
/// Malformed datagrams and foreign senders never appear here; the engine
/// absorbs them as channel noise and keeps waiting.
#[derive(Error, Debug)]
pub enum ArqError {
    /// The handshake exhausted its attempts without any reply. Fatal; the
    /// connection was never established.
    #[error("handshake got no reply after {attempts} attempts")]
    ConnectFailed { attempts: u32 },

    /// One exchange exhausted its attempts. Recoverable: the sequence number
    /// did not advance, so re-issuing the same request is safe.
    #[error("no valid reply after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// Socket-level failure. Fatal to the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
