use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Per-stream accounting kept by the connection: payload bytes carried,
/// the distinct packet numbers the stream's frames travelled in, and when
/// the stream was first active.
#[derive(Debug, Default)]
pub struct StreamStats {
    bytes: u64,
    packet_numbers: HashSet<u64>,
    started_at: Option<Instant>,
}

impl StreamStats {
    /// Stamps the start instant once; later calls keep the first.
    pub fn start(&mut self, at: Instant) {
        self.started_at.get_or_insert(at);
    }

    pub fn record_frame(&mut self, packet_number: u64, bytes: usize) {
        self.bytes += bytes as u64;
        self.packet_numbers.insert(packet_number);
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn distinct_packets(&self) -> usize {
        self.packet_numbers.len()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|at| at.elapsed())
    }
}
