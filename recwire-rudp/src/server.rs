//! Record server: the peer side of the stop-and-wait protocol.
//!
//! One [`Session`] per client address mirrors the client's state machine:
//! it tracks the next expected sequence number and keeps the encoded bytes
//! of the last reply. A retransmitted request (the previous sequence) is
//! answered from that cache without consulting the store again, so a
//! duplicated datagram can never double-apply an add.
//!
//! Session state lives inside the server instance, never in process-global
//! state; multiple servers can serve independently in one process.

use crate::socket::bind_udp;
use crate::store::{AddOutcome, RecordStore};
use recwire_proto::{Command, Frame, FrameType, Record};
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::{debug, info};

/// Receive buffer size. Larger than any valid frame so an oversized
/// datagram keeps its real length and fails decoding.
const RECV_BUFFER_SIZE: usize = 256;

/// Per-peer protocol state.
struct Session {
    /// Sequence number of the next fresh request.
    expected_seq: u32,
    /// Encoded reply to the previous request, resent on duplicates.
    last_reply: Option<Vec<u8>>,
}

impl Session {
    fn starting_at(expected_seq: u32) -> Self {
        Self {
            expected_seq,
            last_reply: None,
        }
    }
}

/// Multi-client record server over the stop-and-wait transport.
pub struct RecordServer {
    socket: UdpSocket,
    local_addr: SocketAddr,
    sessions: HashMap<SocketAddr, Session>,
    store: RecordStore,
}

impl RecordServer {
    /// Bind to an address and create a server with an empty store.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "addr did not resolve"))?;
        let socket = bind_udp(addr)?;
        let local_addr = socket.local_addr()?;
        info!(%local_addr, "record server listening");

        Ok(Self {
            socket,
            local_addr,
            sessions: HashMap::new(),
            store: RecordStore::new(),
        })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The record store backing this server.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Serve datagrams forever.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.serve_one()?;
        }
    }

    /// Block for one datagram and handle it.
    pub fn serve_one(&mut self) -> io::Result<()> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let (len, src) = loop {
            match self.socket.recv_from(&mut buf) {
                Ok(received) => break received,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if let Some(reply) = self.process(src, &buf[..len]) {
            self.socket.send_to(&reply, src)?;
        }
        Ok(())
    }

    /// Run one datagram through the state machine, returning the bytes to
    /// send back to `src`, if any.
    fn process(&mut self, src: SocketAddr, bytes: &[u8]) -> Option<Vec<u8>> {
        let frame = match Frame::decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(%src, error = %e, "discarding malformed datagram");
                return None;
            }
        };

        match frame.frame_type {
            FrameType::Syn => {
                debug!(%src, "session opened");
                self.sessions.insert(src, Session::starting_at(0));
                Some(Frame::ack(frame.sequence).encode())
            }
            FrameType::Fin => {
                debug!(%src, "session closed");
                self.sessions.remove(&src);
                None
            }
            FrameType::Data => self.process_request(src, frame),
            // Clients never send ACK frames; stray ones are noise.
            FrameType::Ack => None,
        }
    }

    fn process_request(&mut self, src: SocketAddr, frame: Frame) -> Option<Vec<u8>> {
        let request = frame.payload?;

        // A request from an unknown peer (e.g. after a server restart)
        // starts a session at its own sequence number.
        let session = self
            .sessions
            .entry(src)
            .or_insert_with(|| Session::starting_at(frame.sequence));

        if frame.sequence == session.expected_seq {
            let reply = apply(&mut self.store, &request)?;
            let bytes = Frame::data(frame.sequence, reply).encode();
            session.last_reply = Some(bytes.clone());
            session.expected_seq = session.expected_seq.wrapping_add(1);
            Some(bytes)
        } else if frame.sequence.wrapping_add(1) == session.expected_seq {
            // Retransmission of the exchange we already answered: resend
            // the cached reply, never recompute.
            debug!(%src, seq = frame.sequence, "resending cached reply for duplicate");
            session.last_reply.clone()
        } else {
            debug!(
                %src,
                got = frame.sequence,
                expected = session.expected_seq,
                "discarding out-of-window request"
            );
            None
        }
    }
}

/// Execute a request against the store and build the response record.
///
/// Response-code commands arriving as requests are dropped.
fn apply(store: &mut RecordStore, request: &Record) -> Option<Record> {
    match request.command {
        Command::Add => {
            let reply = match store.try_add(request.clone()) {
                AddOutcome::Added => {
                    info!(id = request.id, name = %request.name, "record added");
                    request.with_command(Command::AddOk)
                }
                AddOutcome::AlreadyExists => {
                    debug!(id = request.id, "record already exists");
                    request.with_command(Command::AddDuplicate)
                }
            };
            Some(reply)
        }
        Command::Retrieve => {
            let reply = match store.try_get(request.id) {
                Some(found) => found.with_command(Command::RetrieveOk),
                None => {
                    debug!(id = request.id, "record not found");
                    Record::retrieve(request.id).with_command(Command::RetrieveMissing)
                }
            };
            Some(reply)
        }
        _ => {
            debug!(command = ?request.command, "ignoring non-request command");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> RecordServer {
        RecordServer::bind("127.0.0.1:0").unwrap()
    }

    fn client_addr() -> SocketAddr {
        "127.0.0.1:40001".parse().unwrap()
    }

    fn decode(bytes: &[u8]) -> Frame {
        Frame::decode(bytes).unwrap()
    }

    #[test]
    fn test_syn_opens_session_and_acks() {
        let mut server = server();
        let reply = server.process(client_addr(), &Frame::syn(0).encode()).unwrap();
        assert_eq!(decode(&reply), Frame::ack(0));
        assert_eq!(server.session_count(), 1);
    }

    #[test]
    fn test_fin_closes_session() {
        let mut server = server();
        server.process(client_addr(), &Frame::syn(0).encode());
        server.process(client_addr(), &Frame::fin(0).encode());
        assert_eq!(server.session_count(), 0);
    }

    #[test]
    fn test_add_request_answered_in_sequence() {
        let mut server = server();
        let src = client_addr();
        server.process(src, &Frame::syn(0).encode());

        let request = Frame::data(0, Record::add(7, "Ann", 30));
        let reply = decode(&server.process(src, &request.encode()).unwrap());
        assert_eq!(reply.sequence, 0);
        assert_eq!(reply.payload.unwrap().command, Command::AddOk);
        assert_eq!(server.store().len(), 1);
    }

    #[test]
    fn test_duplicate_request_resends_cached_reply() {
        let mut server = server();
        let src = client_addr();
        server.process(src, &Frame::syn(0).encode());

        let request = Frame::data(0, Record::add(7, "Ann", 30)).encode();
        let first = server.process(src, &request).unwrap();
        let second = server.process(src, &request).unwrap();

        // Same bytes, not a recomputed AddDuplicate, and no double-add.
        assert_eq!(first, second);
        assert_eq!(decode(&second).payload.unwrap().command, Command::AddOk);
        assert_eq!(server.store().len(), 1);
    }

    #[test]
    fn test_out_of_window_request_dropped() {
        let mut server = server();
        let src = client_addr();
        server.process(src, &Frame::syn(0).encode());

        let future = Frame::data(5, Record::add(7, "Ann", 30)).encode();
        assert!(server.process(src, &future).is_none());
        assert!(server.store().is_empty());
    }

    #[test]
    fn test_retrieve_missing_id() {
        let mut server = server();
        let src = client_addr();
        server.process(src, &Frame::syn(0).encode());

        let request = Frame::data(0, Record::retrieve(99)).encode();
        let reply = decode(&server.process(src, &request).unwrap());
        let record = reply.payload.unwrap();
        assert_eq!(record.command, Command::RetrieveMissing);
        assert_eq!(record.id, 99);
    }

    #[test]
    fn test_sessions_are_independent_per_peer() {
        let mut server = server();
        let alice: SocketAddr = "127.0.0.1:40001".parse().unwrap();
        let bob: SocketAddr = "127.0.0.1:40002".parse().unwrap();
        server.process(alice, &Frame::syn(0).encode());
        server.process(bob, &Frame::syn(0).encode());

        let add = Frame::data(0, Record::add(1, "Ann", 30)).encode();
        assert!(server.process(alice, &add).is_some());
        // Bob's session still expects sequence 0, so his own first
        // request is served normally.
        let retrieve = Frame::data(0, Record::retrieve(1)).encode();
        let reply = decode(&server.process(bob, &retrieve).unwrap());
        assert_eq!(reply.payload.unwrap().command, Command::RetrieveOk);
    }

    #[test]
    fn test_unknown_peer_data_starts_session() {
        let mut server = server();
        let src = client_addr();

        // No SYN seen (server restarted); the request itself seeds the
        // session at its sequence number.
        let request = Frame::data(3, Record::add(7, "Ann", 30)).encode();
        let reply = decode(&server.process(src, &request).unwrap());
        assert_eq!(reply.sequence, 3);
        assert_eq!(server.session_count(), 1);
    }

    #[test]
    fn test_malformed_datagram_dropped() {
        let mut server = server();
        assert!(server.process(client_addr(), &[0xde, 0xad]).is_none());
        assert_eq!(server.session_count(), 0);
    }

    #[test]
    fn test_response_command_as_request_dropped() {
        let mut server = server();
        let src = client_addr();
        server.process(src, &Frame::syn(0).encode());

        let bogus = Frame::data(0, Record::add(7, "Ann", 30).with_command(Command::AddOk));
        assert!(server.process(src, &bogus.encode()).is_none());
        assert!(server.store().is_empty());
    }
}
