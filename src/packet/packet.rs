use crate::coder::Coder;
use crate::primitives::PacketNumber;
use crate::result::{ensure_len, FlitError, FlitResult};

use super::frame::Frame;
use super::header::PacketHeader;
use super::types::ConnectionId;

/// One UDP datagram payload after the size negotiation exchange: a short
/// header, the destination connection id, a truncated packet number and an
/// ordered list of frames.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Packet {
    pub dest_conn_id: ConnectionId,
    pub packet_number: PacketNumber,
    pub payload: Vec<Frame>,
}

impl Packet {
    pub fn new(dest_conn_id: ConnectionId, packet_number: PacketNumber) -> Self {
        Self {
            dest_conn_id,
            packet_number,
            payload: Vec::new(),
        }
    }

    pub fn add_frame(&mut self, frame: Frame) {
        self.payload.push(frame);
    }

    /// Bytes taken by everything that is not frames.
    pub fn overhead(&self) -> usize {
        PacketHeader::WIRE_LEN + ConnectionId::WIRE_LEN + self.packet_number.size()
    }

    pub fn encoded_len(&self) -> usize {
        self.overhead()
            + self
                .payload
                .iter()
                .map(|frame| frame.encoded_len())
                .sum::<usize>()
    }

    fn walk_payload(payload: &[u8]) -> FlitResult<Vec<Frame>> {
        let mut frames = Vec::new();
        let mut cursor = 0;
        while cursor < payload.len() {
            let span = Frame::wire_len(&payload[cursor..])?;
            if cursor + span > payload.len() {
                return Err(FlitError::FrameOvershoot {
                    span,
                    remaining: payload.len() - cursor,
                });
            }
            frames.push(Frame::decode(&payload[cursor..cursor + span])?);
            cursor += span;
        }
        Ok(frames)
    }
}

impl Coder for Packet {
    fn encode(&self) -> Vec<u8> {
        let header = PacketHeader::for_packet_number_len(self.packet_number.size());
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&header.encode());
        bytes.extend_from_slice(&self.dest_conn_id.encode());
        bytes.extend_from_slice(&self.packet_number.encode());
        for frame in &self.payload {
            bytes.extend_from_slice(&frame.encode());
        }
        bytes
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        let header = PacketHeader::decode(bytes)?;
        let pn_len = header.packet_number_len();
        let end_of_fields = PacketHeader::WIRE_LEN + ConnectionId::WIRE_LEN + pn_len;
        ensure_len(bytes, end_of_fields)?;

        let dest_conn_id = ConnectionId::decode(&bytes[PacketHeader::WIRE_LEN..])?;
        let packet_number = PacketNumber::decode(
            &bytes[PacketHeader::WIRE_LEN + ConnectionId::WIRE_LEN..end_of_fields],
        )?;
        let payload = Self::walk_payload(&bytes[end_of_fields..])?;

        Ok(Self {
            dest_conn_id,
            packet_number,
            payload,
        })
    }
}
