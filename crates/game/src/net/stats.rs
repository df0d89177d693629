#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub payloads_sent: u64,
    pub payloads_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub malformed_dropped: u64,
    pub connections: u64,
}

impl NetworkStats {
    pub fn record_sent(&mut self, bytes: usize) {
        self.payloads_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub fn record_received(&mut self, bytes: usize) {
        self.payloads_received += 1;
        self.bytes_received += bytes as u64;
    }

    pub fn record_malformed(&mut self) {
        self.malformed_dropped += 1;
    }
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sent {} ({} B), received {} ({} B), dropped {}",
            self.payloads_sent,
            self.bytes_sent,
            self.payloads_received,
            self.bytes_received,
            self.malformed_dropped
        )
    }
}
