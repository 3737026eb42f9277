//! Lossy UDP proxy.
//!
//! Sits between one client and one upstream server and applies a
//! [`FaultPlan`] per direction, so integration tests can lose or duplicate
//! datagrams without patching the transport under test.
//!
//! The first non-upstream sender seen becomes "the client"; this proxy is
//! deliberately single-client.

use crate::fault::{DropDecision, FaultPlan};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::thread;

/// Maximum datagram the proxy will forward.
const MAX_DATAGRAM: usize = 2048;

pub struct LossyProxy {
    socket: UdpSocket,
    local_addr: SocketAddr,
    upstream: SocketAddr,
    client: Option<SocketAddr>,
    /// Applied to client -> upstream datagrams.
    drop_to_upstream: FaultPlan,
    /// Applied to upstream -> client datagrams.
    drop_to_client: FaultPlan,
    /// "Drop" decisions here deliver the upstream -> client datagram twice.
    duplicate_to_client: FaultPlan,
}

impl LossyProxy {
    /// Bind a proxy on an ephemeral loopback port in front of `upstream`.
    pub fn bind(upstream: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0")?;
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            local_addr,
            upstream,
            client: None,
            drop_to_upstream: FaultPlan::none(),
            drop_to_client: FaultPlan::none(),
            duplicate_to_client: FaultPlan::none(),
        })
    }

    /// Address clients should talk to instead of the upstream.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn with_drop_to_upstream(mut self, plan: FaultPlan) -> Self {
        self.drop_to_upstream = plan;
        self
    }

    pub fn with_drop_to_client(mut self, plan: FaultPlan) -> Self {
        self.drop_to_client = plan;
        self
    }

    pub fn with_duplicate_to_client(mut self, plan: FaultPlan) -> Self {
        self.duplicate_to_client = plan;
        self
    }

    /// Forward datagrams until the socket fails (normally: forever).
    ///
    /// Run this on its own thread; the test process exiting tears it down.
    pub fn run(mut self) {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let (len, src) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return,
            };
            let data = &buf[..len];

            if src == self.upstream {
                let Some(client) = self.client else { continue };
                if self.drop_to_client.decide() == DropDecision::Drop {
                    continue;
                }
                let _ = self.socket.send_to(data, client);
                if self.duplicate_to_client.decide() == DropDecision::Drop {
                    let _ = self.socket.send_to(data, client);
                }
            } else {
                self.client = Some(src);
                if self.drop_to_upstream.decide() == DropDecision::Drop {
                    continue;
                }
                let _ = self.socket.send_to(data, self.upstream);
            }
        }
    }

    /// Convenience: run the proxy on a background thread.
    pub fn spawn(self) -> SocketAddr {
        let addr = self.local_addr;
        thread::spawn(move || self.run());
        addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_proxy_forwards_both_directions() {
        let upstream = UdpSocket::bind("127.0.0.1:0").unwrap();
        let upstream_addr = upstream.local_addr().unwrap();

        let proxy_addr = LossyProxy::bind(upstream_addr).unwrap().spawn();

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        upstream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        client.send_to(b"ping", proxy_addr).unwrap();
        let mut buf = [0u8; 64];
        let (len, from_proxy) = upstream.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"ping");

        upstream.send_to(b"pong", from_proxy).unwrap();
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"pong");
    }

    #[test]
    fn test_proxy_drops_to_upstream() {
        let upstream = UdpSocket::bind("127.0.0.1:0").unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        upstream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();

        let proxy_addr = LossyProxy::bind(upstream_addr)
            .unwrap()
            .with_drop_to_upstream(FaultPlan::first_n(1))
            .spawn();

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.send_to(b"lost", proxy_addr).unwrap();
        client.send_to(b"kept", proxy_addr).unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = upstream.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"kept");
    }

    #[test]
    fn test_proxy_duplicates_to_client() {
        let upstream = UdpSocket::bind("127.0.0.1:0").unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        upstream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        let proxy_addr = LossyProxy::bind(upstream_addr)
            .unwrap()
            .with_duplicate_to_client(FaultPlan::first_n(1))
            .spawn();

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        client.send_to(b"hello", proxy_addr).unwrap();
        let mut buf = [0u8; 64];
        let (_, from_proxy) = upstream.recv_from(&mut buf).unwrap();

        upstream.send_to(b"reply", from_proxy).unwrap();
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"reply");
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"reply");
    }
}
