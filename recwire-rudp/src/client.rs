//! Client connection: handshake, request/response exchange, teardown.
//!
//! A [`Connection`] owns the datagram socket, the registered peer address
//! and the current sequence number. Exclusive ownership (`&mut self` on
//! [`Connection::execute`]) enforces the single-outstanding-request
//! invariant: the protocol has no request identifier beyond the one
//! in-flight sequence number, so concurrent exchanges on one connection
//! would corrupt the state machine.
//!
//! The exchange itself is a stop-and-wait ARQ loop:
//!
//! ```text
//! for attempt in 0..max_attempts:
//!     send DATA(seq)
//!     arm timer
//!     until timer expires:
//!         recv datagram
//!         drop if foreign sender / undecodable / wrong sequence
//!         otherwise: stop timer, return payload
//! -> Timeout (sequence unchanged)
//! ```
//!
//! Retransmission always resends the identical frame bytes; a fresh
//! sequence number is only assigned after a successful exchange.

use crate::error::{ArqError, Result};
use crate::peer;
use crate::socket::bind_ephemeral;
use crate::timer::RetryTimer;
use recwire_proto::{Frame, FrameType, Record};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receive buffer size. Larger than any valid frame so an oversized
/// datagram keeps its real length and fails decoding instead of being
/// silently truncated into a valid shape.
const RECV_BUFFER_SIZE: usize = 256;

/// Attempt ceiling for the handshake and for each exchange.
pub const MAX_ATTEMPTS: u32 = 5;

/// Per-attempt reply timeout.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);

/// Retry/timeout knobs for one connection.
#[derive(Debug, Clone, Copy)]
pub struct ArqConfig {
    /// Attempts before giving up on an exchange (or the handshake).
    pub max_attempts: u32,
    /// How long each attempt waits for a valid reply.
    pub attempt_timeout: Duration,
}

impl Default for ArqConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            attempt_timeout: ATTEMPT_TIMEOUT,
        }
    }
}

/// A client connection to one record server.
pub struct Connection {
    socket: UdpSocket,
    peer: SocketAddr,
    sequence: u32,
    config: ArqConfig,
}

impl Connection {
    /// Open a connection with the default retry configuration.
    ///
    /// Resolves `peer`, binds an ephemeral local socket and performs the
    /// liveness handshake: SYN, wait for any reply from the peer, retry up
    /// to the attempt ceiling. Fails with [`ArqError::ConnectFailed`] once
    /// all attempts are exhausted.
    pub fn open<A: ToSocketAddrs>(peer: A) -> Result<Self> {
        Self::open_with(peer, ArqConfig::default())
    }

    /// Open a connection with explicit retry configuration.
    pub fn open_with<A: ToSocketAddrs>(peer: A, config: ArqConfig) -> Result<Self> {
        let peer = peer
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "peer did not resolve"))?;
        let socket = bind_ephemeral(peer)?;

        let mut conn = Self {
            socket,
            peer,
            sequence: 0,
            config,
        };
        conn.handshake()?;
        Ok(conn)
    }

    /// The registered peer address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// The current sequence number (next exchange's sequence).
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Perform one request/response exchange.
    ///
    /// On success the sequence number advances by exactly one. On
    /// [`ArqError::Timeout`] it is left unchanged, so re-issuing the same
    /// logical request is safe: the server recognises the reused sequence
    /// and answers with the previously computed result.
    pub fn execute(&mut self, request: Record) -> Result<Record> {
        let bytes = Frame::data(self.sequence, request).encode();

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                debug!(seq = self.sequence, attempt, "retransmitting request");
            }
            self.socket.send_to(&bytes, self.peer)?;

            let timer = RetryTimer::start(self.config.attempt_timeout);
            if let Some(reply) = self.await_reply(&timer)? {
                timer.stop();
                self.sequence = self.sequence.wrapping_add(1);
                return Ok(reply);
            }
            debug!(seq = self.sequence, attempt, "attempt timed out");
        }

        warn!(seq = self.sequence, "exchange exhausted all attempts");
        Err(ArqError::Timeout {
            attempts: self.config.max_attempts,
        })
    }

    /// Tear down the connection.
    ///
    /// Sends a single best-effort FIN; loss is tolerated because teardown
    /// is never retried. The socket is released when `self` drops.
    pub fn close(self) -> Result<()> {
        let bytes = Frame::fin(self.sequence).encode();
        self.socket.send_to(&bytes, self.peer)?;
        info!(peer = %self.peer, "connection closed");
        Ok(())
    }

    /// Wait for the reply to the in-flight request, bounded by `timer`.
    ///
    /// Returns `Ok(None)` when the timer expires first. Foreign senders,
    /// undecodable datagrams, non-DATA frames and wrong sequence numbers
    /// are all discarded here; only send/receive failures propagate.
    fn await_reply(&mut self, timer: &RetryTimer) -> Result<Option<Record>> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        loop {
            let Some(remaining) = timer.remaining() else {
                return Ok(None);
            };
            self.socket.set_read_timeout(Some(remaining))?;

            let (len, src) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if receive_timed_out(&e) => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if !peer::from_peer(src, self.peer) {
                debug!(%src, "discarding datagram from foreign sender");
                continue;
            }

            let frame = match Frame::decode(&buf[..len]) {
                Ok(frame) => frame,
                Err(e) => {
                    // Indistinguishable from channel noise; keep waiting.
                    debug!(error = %e, "discarding malformed datagram");
                    continue;
                }
            };

            if frame.sequence != self.sequence {
                debug!(
                    got = frame.sequence,
                    expected = self.sequence,
                    "discarding stale reply"
                );
                continue;
            }

            match (frame.frame_type, frame.payload) {
                (FrameType::Data, Some(record)) => return Ok(Some(record)),
                _ => {
                    debug!(frame_type = ?frame.frame_type, "ignoring non-DATA frame");
                    continue;
                }
            }
        }
    }

    /// Liveness handshake: the peer only has to prove it is reachable, so
    /// any datagram from the registered peer address completes it.
    fn handshake(&mut self) -> Result<()> {
        let bytes = Frame::syn(self.sequence).encode();
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                debug!(attempt, "retrying handshake");
            }
            self.socket.send_to(&bytes, self.peer)?;

            let timer = RetryTimer::start(self.config.attempt_timeout);
            loop {
                let Some(remaining) = timer.remaining() else {
                    break;
                };
                self.socket.set_read_timeout(Some(remaining))?;

                match self.socket.recv_from(&mut buf) {
                    Ok((_, src)) if peer::from_peer(src, self.peer) => {
                        timer.stop();
                        info!(peer = %self.peer, "connection established");
                        return Ok(());
                    }
                    Ok((_, src)) => {
                        debug!(%src, "discarding datagram from foreign sender");
                    }
                    Err(e) if receive_timed_out(&e) => break,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        warn!(peer = %self.peer, "handshake exhausted all attempts");
        Err(ArqError::ConnectFailed {
            attempts: self.config.max_attempts,
        })
    }
}

/// Platform-dependent kind reported when a read timeout elapses.
#[inline]
fn receive_timed_out(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ArqConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.attempt_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_open_unresolvable_peer_is_io_error() {
        let result = Connection::open("this-host-does-not-exist.invalid:7400");
        assert!(matches!(result, Err(ArqError::Io(_))));
    }
}
