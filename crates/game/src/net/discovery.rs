use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

const MAX_BEACON_SIZE: usize = 256;

/// Host side: announces the token on the discovery port at a fixed interval.
pub struct Beacon {
    socket: UdpSocket,
    target: SocketAddr,
    token: Vec<u8>,
    interval: Duration,
    last_sent: Option<Instant>,
}

impl Beacon {
    pub fn new(target: SocketAddr, token: &str, interval: Duration) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.set_broadcast(true)?;

        Ok(Self {
            socket,
            target,
            token: token.as_bytes().to_vec(),
            interval,
            last_sent: None,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Sends when an interval has elapsed since the previous beacon. Returns
    /// whether a datagram went out.
    pub fn tick(&mut self) -> io::Result<bool> {
        let due = self
            .last_sent
            .is_none_or(|sent| sent.elapsed() >= self.interval);
        if !due {
            return Ok(false);
        }

        self.send_now()?;
        Ok(true)
    }

    pub fn send_now(&mut self) -> io::Result<()> {
        self.last_sent = Some(Instant::now());
        self.socket.send_to(&self.token, self.target)?;
        Ok(())
    }
}

/// Joiner side: waits for a beacon carrying the expected token.
pub struct DiscoveryListener {
    socket: UdpSocket,
    token: Vec<u8>,
    buffer: [u8; MAX_BEACON_SIZE],
}

impl DiscoveryListener {
    pub fn bind(port: u16, token: &str) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;

        Ok(Self {
            socket,
            token: token.as_bytes().to_vec(),
            buffer: [0u8; MAX_BEACON_SIZE],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// One bounded attempt. Datagrams with a different token are skipped until
    /// the deadline; `Ok(None)` means nobody announced in time.
    pub fn listen(&mut self, timeout: Duration) -> io::Result<Option<IpAddr>> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            self.socket.set_read_timeout(Some(remaining))?;

            match self.socket.recv_from(&mut self.buffer) {
                Ok((size, from)) => {
                    if self.buffer[..size] == self.token[..] {
                        return Ok(Some(from.ip()));
                    }
                    log::trace!("ignoring {} byte datagram from {}", size, from);
                }
                Err(ref e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(None);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn beacon_respects_interval() {
        let target = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9);
        let mut beacon = Beacon::new(target, "TOKEN", Duration::from_secs(60)).unwrap();

        assert!(beacon.tick().unwrap());
        assert!(!beacon.tick().unwrap());
    }

    #[test]
    fn listen_times_out_quietly() {
        let mut listener = DiscoveryListener::bind(0, "TOKEN").unwrap();
        let found = listener.listen(Duration::from_millis(20)).unwrap();
        assert_eq!(found, None);
    }
}
