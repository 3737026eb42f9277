//! UDP socket setup shared by client and server.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// Socket buffer size (1MB; frames are tiny, this covers bursts)
const SOCKET_BUFFER_SIZE: usize = 1024 * 1024;

/// Bind a UDP socket with sized buffers and address reuse.
pub(crate) fn bind_udp(addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_send_buffer_size(SOCKET_BUFFER_SIZE)?;
    socket.set_recv_buffer_size(SOCKET_BUFFER_SIZE)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

/// Ephemeral local socket in the same address family as `peer`.
pub(crate) fn bind_ephemeral(peer: SocketAddr) -> io::Result<UdpSocket> {
    let local = if peer.is_ipv4() {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
    } else {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
    };
    bind_udp(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_ephemeral_picks_port() {
        let peer: SocketAddr = "127.0.0.1:7400".parse().unwrap();
        let socket = bind_ephemeral(peer).unwrap();
        assert!(socket.local_addr().unwrap().port() > 0);
    }

    #[test]
    fn test_bind_explicit_addr() {
        let socket = bind_udp("127.0.0.1:0".parse().unwrap()).unwrap();
        assert!(socket.local_addr().unwrap().ip().is_loopback());
    }
}
