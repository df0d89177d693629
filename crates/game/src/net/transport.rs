use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::stats::NetworkStats;

const FRAME_HEADER: usize = 2;
const READ_CHUNK: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(SocketAddr),
    Received(Vec<u8>),
    Disconnected,
}

/// Reliable, ordered byte channel to a single peer. Every payload travels as a
/// frame prefixed with its length (u16, little-endian).
///
/// A listening transport accepts one peer at a time and goes back to
/// accepting once that peer leaves. A connecting transport is finished after
/// its peer disconnects.
pub struct Transport {
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
    peer_addr: Option<SocketAddr>,
    read_buffer: Vec<u8>,
    write_buffer: Vec<u8>,
    announce_connect: bool,
    stats: NetworkStats,
}

impl Transport {
    pub fn listen(port: u16) -> io::Result<Self> {
        Self::listen_on(("0.0.0.0", port))
    }

    pub fn listen_on<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener: Some(listener),
            stream: None,
            peer_addr: None,
            read_buffer: Vec::new(),
            write_buffer: Vec::new(),
            announce_connect: false,
            stats: NetworkStats::default(),
        })
    }

    pub fn connect(addr: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            listener: None,
            stream: Some(stream),
            peer_addr: Some(addr),
            read_buffer: Vec::new(),
            write_buffer: Vec::new(),
            announce_connect: true,
            stats: NetworkStats {
                connections: 1,
                ..NetworkStats::default()
            },
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match (&self.listener, &self.stream) {
            (Some(listener), _) => listener.local_addr(),
            (None, Some(stream)) => stream.local_addr(),
            (None, None) => Err(io::Error::new(io::ErrorKind::NotConnected, "transport closed")),
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut NetworkStats {
        &mut self.stats
    }

    pub fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        if self.stream.is_none() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "no peer connected"));
        }

        let len = u16::try_from(payload.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "payload exceeds frame size")
        })?;

        self.write_buffer.extend_from_slice(&len.to_le_bytes());
        self.write_buffer.extend_from_slice(payload);
        self.stats.record_sent(payload.len());

        self.flush()
    }

    /// Accepts a pending peer, flushes queued writes, and returns at most
    /// `max_payloads` received payloads. Extra complete frames wait for the
    /// next poll.
    pub fn poll(&mut self, max_payloads: usize) -> Vec<TransportEvent> {
        let mut events = Vec::new();

        if self.announce_connect {
            self.announce_connect = false;
            if let Some(addr) = self.peer_addr {
                events.push(TransportEvent::Connected(addr));
            }
        }

        if self.stream.is_none() {
            self.accept(&mut events);
        }

        if self.stream.is_none() {
            return events;
        }

        let mut closed = match self.flush() {
            Ok(()) => false,
            Err(e) => {
                log::debug!("write to peer failed: {}", e);
                true
            }
        };

        if !closed {
            closed = self.fill_read_buffer();
        }

        let mut delivered = 0;
        while delivered < max_payloads {
            match self.next_frame() {
                Some(payload) => {
                    self.stats.record_received(payload.len());
                    events.push(TransportEvent::Received(payload));
                    delivered += 1;
                }
                None => break,
            }
        }

        if closed && delivered < max_payloads {
            self.drop_peer();
            events.push(TransportEvent::Disconnected);
        }

        events
    }

    pub fn close(&mut self) {
        self.drop_peer();
        self.listener = None;
    }

    fn accept(&mut self, events: &mut Vec<TransportEvent>) {
        let Some(listener) = &self.listener else {
            return;
        };

        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = stream
                    .set_nonblocking(true)
                    .and_then(|()| stream.set_nodelay(true))
                {
                    log::warn!("failed to configure stream from {}: {}", addr, e);
                    return;
                }
                self.stream = Some(stream);
                self.peer_addr = Some(addr);
                self.stats.connections += 1;
                events.push(TransportEvent::Connected(addr));
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => log::debug!("accept failed: {}", e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            self.write_buffer.clear();
            return Ok(());
        };

        while !self.write_buffer.is_empty() {
            match stream.write(&self.write_buffer) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.write_buffer.drain(..n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Returns true once the peer has gone away.
    fn fill_read_buffer(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return true;
        };

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => return true,
                Ok(n) => self.read_buffer.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return false,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("read from peer failed: {}", e);
                    return true;
                }
            }
        }
    }

    fn next_frame(&mut self) -> Option<Vec<u8>> {
        if self.read_buffer.len() < FRAME_HEADER {
            return None;
        }

        let len = u16::from_le_bytes([self.read_buffer[0], self.read_buffer[1]]) as usize;
        if self.read_buffer.len() < FRAME_HEADER + len {
            return None;
        }

        let payload = self.read_buffer[FRAME_HEADER..FRAME_HEADER + len].to_vec();
        self.read_buffer.drain(..FRAME_HEADER + len);
        Some(payload)
    }

    fn drop_peer(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        self.peer_addr = None;
        self.announce_connect = false;
        self.read_buffer.clear();
        self.write_buffer.clear();
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}
