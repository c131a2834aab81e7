use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Instant;

use rand::Rng;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::coder::Coder;
use crate::config::Config;
use crate::packet::frame::{Frame, StreamFrame};
use crate::packet::packet::Packet;
use crate::primitives::PacketNumber;
use crate::result::{FlitError, FlitResult};
use crate::stream::id::StreamId;
use crate::stream::Stream;

use super::stats::StreamStats;
use super::types::{ConnectionState, Role};

/// One endpoint of a transfer. Owns the UDP socket, the stream table and
/// everything the two loops touch; exactly one of `send_packets` and
/// `receive_packets` runs per process, so no state is shared.
pub struct Connection {
    role: Role,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    socket: UdpSocket,
    streams: HashMap<StreamId, Stream>,
    // ids with bytes to send, or recently activated by receipt
    active: Vec<StreamId>,
    // frames that did not fit into the packet under construction
    pending_frames: VecDeque<StreamFrame>,
    // drives locally opened stream ids; lazily created peer streams
    // do not advance it
    local_stream_seq: u64,
    streams_created: u64,
    packets_sent: u64,
    packets_received: u64,
    // None until the 2-byte negotiation datagram has been sent or seen
    packet_size: Option<usize>,
    stats: HashMap<StreamId, StreamStats>,
    state: ConnectionState,
    config: Config,
}

impl Connection {
    pub async fn new(role: Role, config: Config) -> FlitResult<Self> {
        let socket = UdpSocket::bind(config.local_addr).await?;
        let local_addr = socket.local_addr()?;
        debug!(%local_addr, ?role, "connection bound");
        Ok(Self {
            role,
            local_addr,
            remote_addr: config.remote_addr,
            socket,
            streams: HashMap::new(),
            active: Vec::new(),
            pending_frames: VecDeque::new(),
            local_stream_seq: 0,
            streams_created: 0,
            packets_sent: 0,
            packets_received: 0,
            packet_size: None,
            stats: HashMap::new(),
            state: ConnectionState::Idle,
            config,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn packet_size(&self) -> Option<usize> {
        self.packet_size
    }

    /// Opens a stream initiated by this endpoint and returns its id.
    pub fn open_stream(&mut self, unidirectional: bool) -> FlitResult<StreamId> {
        let id = StreamId::new(self.local_stream_seq, unidirectional, self.role.is_server())?;
        self.local_stream_seq += 1;
        self.streams_created += 1;
        self.streams.insert(id, Stream::new(id, self.role));
        self.stats.entry(id).or_default();
        debug!(stream = %id, "stream opened");
        Ok(id)
    }

    /// Appends bytes to a stream's send buffer. Explicit writes never
    /// create streams; unknown ids are an error here.
    pub fn add_data_to_stream(&mut self, id: StreamId, data: &[u8]) -> FlitResult<()> {
        let stream = self
            .streams
            .get_mut(&id)
            .ok_or(FlitError::UnknownStream(id.to_inner()))?;
        stream.write(data)?;
        self.activate(id);
        Ok(())
    }

    /// Loads a whole file into a stream's send buffer.
    pub async fn add_file_to_stream(&mut self, id: StreamId, path: &Path) -> FlitResult<()> {
        let data = tokio::fs::read(path).await?;
        self.add_data_to_stream(id, &data)
    }

    fn activate(&mut self, id: StreamId) {
        if !self.active.contains(&id) {
            self.active.push(id);
        }
    }

    fn deactivate(&mut self, id: StreamId) {
        self.active.retain(|&active| active != id);
    }

    /// Builds one packet by draining frames from the active streams.
    /// Leftover frames that did not fit wait in the overflow queue and are
    /// placed first into the next packet.
    fn create_packet(&mut self) -> FlitResult<Packet> {
        let packet_size = self.packet_size.ok_or(FlitError::SizeNotNegotiated)?;
        let frame_budget = packet_size / self.config.frames_in_packet;

        // partition the buffers of streams that have not been asked yet
        let refill: Vec<StreamId> = self.active.clone();
        for id in refill {
            if let Some(stream) = self.streams.get_mut(&id) {
                if stream.wants_frames() {
                    stream.generate_frames(frame_budget)?;
                }
            }
        }

        let packet_number = PacketNumber::new(self.packets_sent)?;
        let mut packet = Packet::new(self.role.peer_id(), packet_number);
        let mut remaining = packet_size.saturating_sub(packet.overhead());

        loop {
            let frame = match self.pending_frames.pop_front() {
                Some(frame) => frame,
                None => {
                    if self.active.is_empty() {
                        break;
                    }
                    let pick = rand::rng().random_range(0..self.active.len());
                    let id = self.active[pick];
                    let Some(stream) = self.streams.get_mut(&id) else {
                        self.deactivate(id);
                        continue;
                    };
                    let next = stream.next_frame();
                    let finished = stream.is_finished();
                    if finished {
                        self.deactivate(id);
                        self.streams.remove(&id);
                        debug!(stream = %id, "stream finished");
                    }
                    match next {
                        Some(frame) => frame,
                        None => {
                            if !finished {
                                // dry but not done, wait for more data
                                self.deactivate(id);
                            }
                            continue;
                        }
                    }
                }
            };

            let size = frame.encoded_len();
            if size <= remaining {
                remaining -= size;
                if let Ok(id) = StreamId::from_raw(frame.stream_id) {
                    let stats = self.stats.entry(id).or_default();
                    stats.start(Instant::now());
                    stats.record_frame(packet_number.to_inner(), frame.data.len());
                }
                packet.add_frame(Frame::Stream(frame));
            } else {
                self.pending_frames.push_back(frame);
                break;
            }
        }

        self.packets_sent += 1;
        Ok(packet)
    }

    /// The sender loop: negotiate the packet size with a leading 2-byte
    /// datagram, then build and send packets until every stream finished.
    pub async fn send_packets(&mut self) -> FlitResult<()> {
        let packet_size = rand::rng()
            .random_range(self.config.min_packet_size..=self.config.max_packet_size)
            as usize;
        self.socket
            .send_to(&(packet_size as u16).to_be_bytes(), self.remote_addr)
            .await?;
        self.packet_size = Some(packet_size);
        self.state = ConnectionState::Active;
        debug!(packet_size, "packet size negotiated");

        let started = Instant::now();
        for stats in self.stats.values_mut() {
            stats.start(started);
        }

        while !self.active.is_empty() {
            let packet = self.create_packet()?;
            if packet.payload.is_empty() {
                continue;
            }
            self.socket
                .send_to(&packet.encode(), self.remote_addr)
                .await?;
        }

        self.close();
        Ok(())
    }

    /// The receiver loop: the first datagram carries the packet size, the
    /// rest are packets. Runs until the socket times out or every stream
    /// that appeared has finished.
    pub async fn receive_packets(&mut self) -> FlitResult<()> {
        let mut buf = vec![0u8; self.config.max_packet_size as usize];
        loop {
            let (len, _peer) = match timeout(self.config.timeout, self.socket.recv_from(&mut buf))
                .await
            {
                Ok(Ok(received)) => received,
                Ok(Err(error)) => {
                    warn!(%error, "socket error while receiving");
                    break;
                }
                Err(_elapsed) => {
                    debug!("receive timed out");
                    break;
                }
            };

            if self.packet_size.is_none() {
                if len != 2 {
                    warn!(len, "expected the 2-byte size negotiation datagram first");
                    continue;
                }
                let negotiated = u16::from_be_bytes([buf[0], buf[1]]) as usize;
                self.packet_size = Some(negotiated);
                self.state = ConnectionState::Active;
                buf.resize(negotiated, 0);
                debug!(packet_size = negotiated, "packet size negotiated");
                continue;
            }

            let packet = match Packet::decode(&buf[..len]) {
                Ok(packet) => packet,
                Err(error) => {
                    warn!(%error, "dropping undecodable packet");
                    continue;
                }
            };
            self.packets_received += 1;
            self.handle_packet(packet).await;

            if self.streams_created > 0 && self.active.is_empty() {
                debug!("every stream drained, closing");
                break;
            }
        }

        self.close();
        Ok(())
    }

    /// Dispatches a packet's frames to their streams. Per-frame failures
    /// are logged and skipped so one bad frame cannot stall the loop.
    async fn handle_packet(&mut self, packet: Packet) {
        let packet_number = packet.packet_number.to_inner();
        for frame in packet.payload {
            match frame {
                Frame::Stream(frame) => {
                    if let Err(error) = self.deliver(packet_number, frame).await {
                        warn!(%error, "failed to deliver frame");
                    }
                }
                other => debug!(kind = ?other.kind(), "ignoring non-stream frame"),
            }
        }
    }

    async fn deliver(&mut self, packet_number: u64, frame: StreamFrame) -> FlitResult<()> {
        let id = StreamId::from_raw(frame.stream_id)?;
        if !self.streams.contains_key(&id) {
            if self.streams.len() >= self.config.max_stream_table {
                return Err(FlitError::StreamTableFull(frame.stream_id));
            }
            self.streams.insert(id, Stream::new(id, self.role));
            self.streams_created += 1;
            debug!(stream = %id, "stream created from peer frame");
        }
        self.activate(id);

        let stats = self.stats.entry(id).or_default();
        stats.start(Instant::now());
        stats.record_frame(packet_number, frame.data.len());

        let stream = self
            .streams
            .get_mut(&id)
            .ok_or(FlitError::UnknownStream(frame.stream_id))?;
        stream.receive_frame(&frame)?;

        if stream.is_finished() {
            self.deactivate(id);
            self.persist_stream(id).await?;
        }
        Ok(())
    }

    /// Writes a finished stream's bytes to `<id>.gif` and drops the stream.
    async fn persist_stream(&mut self, id: StreamId) -> FlitResult<()> {
        let mut stream = self
            .streams
            .remove(&id)
            .ok_or(FlitError::UnknownStream(id.to_inner()))?;
        let data = stream.take_data()?;
        let path = self.config.output_dir.join(format!("{id}.gif"));
        tokio::fs::write(&path, &data).await?;
        info!(stream = %id, bytes = data.len(), path = %path.display(), "stream written");
        Ok(())
    }

    /// Marks the connection closed and emits the statistics. The socket
    /// itself closes when the connection is dropped.
    fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        info!(
            streams = self.streams_created,
            packets_sent = self.packets_sent,
            packets_received = self.packets_received,
            "connection closed"
        );
        for (id, stats) in &self.stats {
            let elapsed_ms = stats
                .elapsed()
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or(0);
            info!(
                stream = %id,
                bytes = stats.bytes(),
                packets = stats.distinct_packets(),
                elapsed_ms,
                "stream statistics"
            );
        }
    }
}
