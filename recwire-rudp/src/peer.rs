//! Source address validation.
//!
//! The datagram channel is a shared, addressed medium: unrelated traffic can
//! land on the same local port. Anything not from the registered peer is
//! cross-talk, not a protocol violation, so it is dropped without touching
//! protocol state.

use std::net::SocketAddr;

/// True iff `src` matches the registered peer's IP and port exactly.
#[inline]
pub fn from_peer(src: SocketAddr, peer: SocketAddr) -> bool {
    src.ip() == peer.ip() && src.port() == peer.port()
}
