use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const LOOP_BACK_ADDR: &str = "127.0.0.1";
pub const PORT_SENDER: u16 = 33336;
pub const PORT_RECEIVER: u16 = 3492;

pub const MIN_PACKET_SIZE: u16 = 1000;
pub const MAX_PACKET_SIZE: u16 = 2000;
pub const FRAMES_IN_PACKET: usize = 5;
pub const TIMEOUT_SECS: u64 = 10;
pub const MAX_STREAMS: usize = 5;
pub const FILE_PATH: &str = "img.gif";
pub const MAX_STREAM_TABLE: usize = 64;

/// Runtime knobs for one connection. Everything the loops consult lives
/// here and is passed into the constructor; nothing is read from module
/// scope at run time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Inclusive range the sender picks its packet size from.
    pub min_packet_size: u16,
    pub max_packet_size: u16,
    /// Divisor for the per-stream frame budget: packet_size / frames_in_packet.
    pub frames_in_packet: usize,
    /// Receive timeout; hitting it is the receiver's normal shutdown signal.
    pub timeout: Duration,
    pub local_addr: SocketAddr,
    pub remote_addr: SocketAddr,
    /// Streams the sender entry point opens.
    pub max_streams: usize,
    /// File loaded into each stream by the sender entry point.
    pub file_path: PathBuf,
    /// Directory the receiver writes finished streams into.
    pub output_dir: PathBuf,
    /// Cap on lazily created streams, so a corrupt id cannot grow the
    /// table without bound.
    pub max_stream_table: usize,
}

impl Config {
    pub fn sender() -> Self {
        Self {
            local_addr: addr(PORT_SENDER),
            remote_addr: addr(PORT_RECEIVER),
            ..Self::base()
        }
    }

    pub fn receiver() -> Self {
        Self {
            local_addr: addr(PORT_RECEIVER),
            remote_addr: addr(PORT_SENDER),
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            min_packet_size: MIN_PACKET_SIZE,
            max_packet_size: MAX_PACKET_SIZE,
            frames_in_packet: FRAMES_IN_PACKET,
            timeout: Duration::from_secs(TIMEOUT_SECS),
            local_addr: addr(PORT_SENDER),
            remote_addr: addr(PORT_RECEIVER),
            max_streams: MAX_STREAMS,
            file_path: PathBuf::from(FILE_PATH),
            output_dir: PathBuf::from("."),
            max_stream_table: MAX_STREAM_TABLE,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::sender()
    }
}

fn addr(port: u16) -> SocketAddr {
    format!("{LOOP_BACK_ADDR}:{port}")
        .parse()
        .expect("loopback address")
}
