use bytes::Bytes;

use crate::coder::Coder;
use crate::frame_kinds;
use crate::result::{ensure_len, FlitError, FlitResult};

frame_kinds! {
    // a reset stream frame abruptly terminates the sending part of a stream;
    // carried on the wire but never scheduled by this implementation
    RESET_STREAM = 0x04,
    // a stop sending frame asks the peer to cease transmission on a stream
    STOP_SENDING = 0x05,
    // stream frames carry one slice of one stream's byte sequence; the low
    // three type bits flag the optional fields: 0b0000_1(OFF)(LEN)(FIN)
    STREAM = 0x08,
    // flow control stubs, see RFC 9000 sections 19.9 through 19.12.
    // all of them round-trip their wire form and are otherwise ignored
    MAX_DATA = 0x10,
    MAX_STREAM_DATA = 0x11,
    MAX_STREAMS_BIDI = 0x12,
    MAX_STREAMS_UNI = 0x13,
    DATA_BLOCKED = 0x14,
}

pub const OFF_BIT: u8 = 0x04;
pub const LEN_BIT: u8 = 0x02;
pub const FIN_BIT: u8 = 0x01;

const STREAM_TYPE_MASK: u8 = !(OFF_BIT | LEN_BIT | FIN_BIT);

impl FrameKind {
    pub fn classify(byte: u8) -> FlitResult<Self> {
        match byte {
            RESET_STREAM => Ok(FrameKind::RESET_STREAM),
            STOP_SENDING => Ok(FrameKind::STOP_SENDING),
            MAX_DATA => Ok(FrameKind::MAX_DATA),
            MAX_STREAM_DATA => Ok(FrameKind::MAX_STREAM_DATA),
            MAX_STREAMS_BIDI => Ok(FrameKind::MAX_STREAMS_BIDI),
            MAX_STREAMS_UNI => Ok(FrameKind::MAX_STREAMS_UNI),
            DATA_BLOCKED => Ok(FrameKind::DATA_BLOCKED),
            byte if byte & STREAM_TYPE_MASK == STREAM => Ok(FrameKind::STREAM),
            unknown => Err(FlitError::UnknownFrameType(unknown)),
        }
    }
}

/// One slice of one stream's byte sequence.
///
/// Wire form: type(1) | stream_id(8 BE) | offset(8 BE, only if OFF) |
/// length(8 BE, only if LEN) | data. OFF is set iff the offset is non-zero
/// and LEN iff the length is non-zero, so only the first frame of a stream
/// ever omits the offset.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct StreamFrame {
    pub stream_id: u64,
    pub offset: u64,
    pub length: u64,
    pub fin: bool,
    pub data: Bytes,
}

impl StreamFrame {
    pub fn new(stream_id: u64, offset: u64, fin: bool, data: Bytes) -> Self {
        Self {
            stream_id,
            offset,
            length: data.len() as u64,
            fin,
            data,
        }
    }

    pub fn type_byte(&self) -> u8 {
        let mut byte = STREAM;
        if self.offset != 0 {
            byte |= OFF_BIT;
        }
        if self.length != 0 {
            byte |= LEN_BIT;
        }
        if self.fin {
            byte |= FIN_BIT;
        }
        byte
    }

    /// Index one past the type, stream id and the optional fields, i.e.
    /// where the data starts. Callable on just the first byte of a frame.
    pub fn end_of_attrs(first_byte: u8) -> usize {
        let mut end = 1 + 8;
        if first_byte & OFF_BIT != 0 {
            end += 8;
        }
        if first_byte & LEN_BIT != 0 {
            end += 8;
        }
        end
    }

    /// Value of the LEN field, or 0 when it is absent. `attrs` must span at
    /// least `end_of_attrs` bytes of the frame. The LEN field sits at 9..17
    /// when OFF is absent and at 17..25 when it is present.
    pub fn length_from_attrs(attrs: &[u8]) -> FlitResult<u64> {
        ensure_len(attrs, 1)?;
        let first_byte = attrs[0];
        if first_byte & LEN_BIT == 0 {
            return Ok(0);
        }
        let at = if first_byte & OFF_BIT != 0 { 17 } else { 9 };
        ensure_len(attrs, at + 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&attrs[at..at + 8]);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn encoded_len(&self) -> usize {
        Self::end_of_attrs(self.type_byte()) + self.data.len()
    }
}

impl Coder for StreamFrame {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.push(self.type_byte());
        bytes.extend_from_slice(&self.stream_id.to_be_bytes());
        if self.offset != 0 {
            bytes.extend_from_slice(&self.offset.to_be_bytes());
        }
        if self.length != 0 {
            bytes.extend_from_slice(&self.length.to_be_bytes());
        }
        bytes.extend_from_slice(&self.data);
        bytes
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, 1)?;
        let first_byte = bytes[0];
        if first_byte & STREAM_TYPE_MASK != STREAM {
            return Err(FlitError::UnknownFrameType(first_byte));
        }
        let end = Self::end_of_attrs(first_byte);
        ensure_len(bytes, end)?;

        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[1..9]);
        let stream_id = u64::from_be_bytes(raw);

        let mut index = 9;
        let mut offset = 0;
        if first_byte & OFF_BIT != 0 {
            raw.copy_from_slice(&bytes[index..index + 8]);
            offset = u64::from_be_bytes(raw);
            index += 8;
        }
        let mut length = 0;
        if first_byte & LEN_BIT != 0 {
            raw.copy_from_slice(&bytes[index..index + 8]);
            length = u64::from_be_bytes(raw);
        }
        let fin = first_byte & FIN_BIT != 0;

        // everything after the attrs is the data slot
        let data = Bytes::copy_from_slice(&bytes[end..]);
        Ok(Self {
            stream_id,
            offset,
            length,
            fin,
            data,
        })
    }
}

// The stub frames below mirror RFC 9000's field lists with this codebase's
// fixed 8-byte big-endian integers in place of varints.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ResetStreamFrame {
    pub stream_id: u64,
    pub error_code: u64,
    pub final_size: u64,
}

impl ResetStreamFrame {
    pub const WIRE_LEN: usize = 1 + 8 + 8 + 8;
}

impl Coder for ResetStreamFrame {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::WIRE_LEN);
        bytes.push(RESET_STREAM);
        bytes.extend_from_slice(&self.stream_id.to_be_bytes());
        bytes.extend_from_slice(&self.error_code.to_be_bytes());
        bytes.extend_from_slice(&self.final_size.to_be_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, Self::WIRE_LEN)?;
        Ok(Self {
            stream_id: read_u64(bytes, 1),
            error_code: read_u64(bytes, 9),
            final_size: read_u64(bytes, 17),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StopSendingFrame {
    pub stream_id: u64,
    pub error_code: u64,
}

impl StopSendingFrame {
    pub const WIRE_LEN: usize = 1 + 8 + 8;
}

impl Coder for StopSendingFrame {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::WIRE_LEN);
        bytes.push(STOP_SENDING);
        bytes.extend_from_slice(&self.stream_id.to_be_bytes());
        bytes.extend_from_slice(&self.error_code.to_be_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, Self::WIRE_LEN)?;
        Ok(Self {
            stream_id: read_u64(bytes, 1),
            error_code: read_u64(bytes, 9),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MaxDataFrame {
    pub maximum_data: u64,
}

impl MaxDataFrame {
    pub const WIRE_LEN: usize = 1 + 8;
}

impl Coder for MaxDataFrame {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::WIRE_LEN);
        bytes.push(MAX_DATA);
        bytes.extend_from_slice(&self.maximum_data.to_be_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, Self::WIRE_LEN)?;
        Ok(Self {
            maximum_data: read_u64(bytes, 1),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MaxStreamDataFrame {
    pub stream_id: u64,
    pub maximum_stream_data: u64,
}

impl MaxStreamDataFrame {
    pub const WIRE_LEN: usize = 1 + 8 + 8;
}

impl Coder for MaxStreamDataFrame {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::WIRE_LEN);
        bytes.push(MAX_STREAM_DATA);
        bytes.extend_from_slice(&self.stream_id.to_be_bytes());
        bytes.extend_from_slice(&self.maximum_stream_data.to_be_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, Self::WIRE_LEN)?;
        Ok(Self {
            stream_id: read_u64(bytes, 1),
            maximum_stream_data: read_u64(bytes, 9),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MaxStreamsFrame {
    pub unidirectional: bool,
    pub maximum_streams: u64,
}

impl MaxStreamsFrame {
    pub const WIRE_LEN: usize = 1 + 8;
}

impl Coder for MaxStreamsFrame {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::WIRE_LEN);
        bytes.push(if self.unidirectional {
            MAX_STREAMS_UNI
        } else {
            MAX_STREAMS_BIDI
        });
        bytes.extend_from_slice(&self.maximum_streams.to_be_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, Self::WIRE_LEN)?;
        Ok(Self {
            unidirectional: bytes[0] == MAX_STREAMS_UNI,
            maximum_streams: read_u64(bytes, 1),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DataBlockedFrame {
    pub limit: u64,
}

impl DataBlockedFrame {
    pub const WIRE_LEN: usize = 1 + 8;
}

impl Coder for DataBlockedFrame {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::WIRE_LEN);
        bytes.push(DATA_BLOCKED);
        bytes.extend_from_slice(&self.limit.to_be_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, Self::WIRE_LEN)?;
        Ok(Self {
            limit: read_u64(bytes, 1),
        })
    }
}

/// The sum of every frame the packet parser understands. Only `Stream`
/// frames are scheduled and dispatched end to end.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Frame {
    Stream(StreamFrame),
    ResetStream(ResetStreamFrame),
    StopSending(StopSendingFrame),
    MaxData(MaxDataFrame),
    MaxStreamData(MaxStreamDataFrame),
    MaxStreams(MaxStreamsFrame),
    DataBlocked(DataBlockedFrame),
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Stream(_) => FrameKind::STREAM,
            Frame::ResetStream(_) => FrameKind::RESET_STREAM,
            Frame::StopSending(_) => FrameKind::STOP_SENDING,
            Frame::MaxData(_) => FrameKind::MAX_DATA,
            Frame::MaxStreamData(_) => FrameKind::MAX_STREAM_DATA,
            Frame::MaxStreams(frame) => {
                if frame.unidirectional {
                    FrameKind::MAX_STREAMS_UNI
                } else {
                    FrameKind::MAX_STREAMS_BIDI
                }
            }
            Frame::DataBlocked(_) => FrameKind::DATA_BLOCKED,
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Frame::Stream(frame) => frame.encoded_len(),
            Frame::ResetStream(_) => ResetStreamFrame::WIRE_LEN,
            Frame::StopSending(_) => StopSendingFrame::WIRE_LEN,
            Frame::MaxData(_) => MaxDataFrame::WIRE_LEN,
            Frame::MaxStreamData(_) => MaxStreamDataFrame::WIRE_LEN,
            Frame::MaxStreams(_) => MaxStreamsFrame::WIRE_LEN,
            Frame::DataBlocked(_) => DataBlockedFrame::WIRE_LEN,
        }
    }

    /// Number of bytes the frame starting at `payload[0]` occupies. Stream
    /// frames carry no length prefix, so their span is probed from the type
    /// byte and the LEN field; every other kind has a fixed wire length.
    pub fn wire_len(payload: &[u8]) -> FlitResult<usize> {
        ensure_len(payload, 1)?;
        let span = match FrameKind::classify(payload[0])? {
            FrameKind::STREAM => {
                let attrs = StreamFrame::end_of_attrs(payload[0]);
                ensure_len(payload, attrs)?;
                let length = StreamFrame::length_from_attrs(&payload[..attrs])?;
                attrs + length as usize
            }
            FrameKind::RESET_STREAM => ResetStreamFrame::WIRE_LEN,
            FrameKind::STOP_SENDING => StopSendingFrame::WIRE_LEN,
            FrameKind::MAX_DATA => MaxDataFrame::WIRE_LEN,
            FrameKind::MAX_STREAM_DATA => MaxStreamDataFrame::WIRE_LEN,
            FrameKind::MAX_STREAMS_BIDI | FrameKind::MAX_STREAMS_UNI => MaxStreamsFrame::WIRE_LEN,
            FrameKind::DATA_BLOCKED => DataBlockedFrame::WIRE_LEN,
        };
        Ok(span)
    }
}

impl Coder for Frame {
    fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Stream(frame) => frame.encode(),
            Frame::ResetStream(frame) => frame.encode(),
            Frame::StopSending(frame) => frame.encode(),
            Frame::MaxData(frame) => frame.encode(),
            Frame::MaxStreamData(frame) => frame.encode(),
            Frame::MaxStreams(frame) => frame.encode(),
            Frame::DataBlocked(frame) => frame.encode(),
        }
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, 1)?;
        match FrameKind::classify(bytes[0])? {
            FrameKind::STREAM => Ok(Frame::Stream(StreamFrame::decode(bytes)?)),
            FrameKind::RESET_STREAM => Ok(Frame::ResetStream(ResetStreamFrame::decode(bytes)?)),
            FrameKind::STOP_SENDING => Ok(Frame::StopSending(StopSendingFrame::decode(bytes)?)),
            FrameKind::MAX_DATA => Ok(Frame::MaxData(MaxDataFrame::decode(bytes)?)),
            FrameKind::MAX_STREAM_DATA => {
                Ok(Frame::MaxStreamData(MaxStreamDataFrame::decode(bytes)?))
            }
            FrameKind::MAX_STREAMS_BIDI | FrameKind::MAX_STREAMS_UNI => {
                Ok(Frame::MaxStreams(MaxStreamsFrame::decode(bytes)?))
            }
            FrameKind::DATA_BLOCKED => Ok(Frame::DataBlocked(DataBlockedFrame::decode(bytes)?)),
        }
    }
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_be_bytes(raw)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    fn random_stream_frame() -> StreamFrame {
        let mut rng = rand::rng();
        let len = rng.random_range(0..64usize);
        let data: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        StreamFrame::new(
            rng.random_range(0..1u64 << 62),
            rng.random_range(0..1u64 << 62),
            rng.random_bool(0.5),
            Bytes::from(data),
        )
    }

    #[test]
    fn test_bare_frame_size_and_type() {
        // offset 0, length 0, no fin: nothing optional on the wire
        let frame = StreamFrame::new(7, 0, false, Bytes::new());
        let encoded = frame.encode();
        assert_eq!(encoded.len(), 1 + 8);
        assert_eq!(encoded[0], 0x08);
    }

    #[test]
    fn test_full_frame_size_and_type() {
        let frame = StreamFrame::new(7, 100, true, Bytes::from_static(b"tail"));
        let encoded = frame.encode();
        assert_eq!(encoded.len(), 1 + 8 + 8 + 8 + 4);
        assert_eq!(encoded[0], 0x0F);
    }

    #[test]
    fn test_stream_frame_round_trip() {
        for i in 0..100 {
            println!("Testing random stream frame {}", i);
            let frame = random_stream_frame();
            let reconstructed = StreamFrame::decode(&frame.encode()).unwrap();
            assert_eq!(frame, reconstructed);
        }
    }

    #[test]
    fn test_end_of_attrs() {
        assert_eq!(StreamFrame::end_of_attrs(0x08), 9);
        assert_eq!(StreamFrame::end_of_attrs(0x08 | FIN_BIT), 9);
        assert_eq!(StreamFrame::end_of_attrs(0x08 | OFF_BIT), 17);
        assert_eq!(StreamFrame::end_of_attrs(0x08 | LEN_BIT), 17);
        assert_eq!(StreamFrame::end_of_attrs(0x08 | OFF_BIT | LEN_BIT), 25);
    }

    #[test]
    fn test_length_from_attrs() {
        // LEN absent
        let frame = StreamFrame::new(1, 5, false, Bytes::new());
        let encoded = frame.encode();
        assert_eq!(StreamFrame::length_from_attrs(&encoded).unwrap(), 0);

        // LEN at 9..17 when OFF is absent
        let frame = StreamFrame::new(1, 0, false, Bytes::from_static(b"abcde"));
        let encoded = frame.encode();
        assert_eq!(StreamFrame::length_from_attrs(&encoded).unwrap(), 5);

        // LEN at 17..25 when OFF is present
        let frame = StreamFrame::new(1, 9, false, Bytes::from_static(b"abcde"));
        let encoded = frame.encode();
        assert_eq!(StreamFrame::length_from_attrs(&encoded).unwrap(), 5);
    }

    #[test]
    fn test_probes_walk_concatenated_frames() {
        let frames = vec![
            StreamFrame::new(2, 0, false, Bytes::from_static(b"first")),
            StreamFrame::new(2, 5, false, Bytes::from_static(b"second")),
            StreamFrame::new(6, 0, true, Bytes::new()),
            StreamFrame::new(2, 11, true, Bytes::from_static(b"x")),
        ];
        let mut payload = Vec::new();
        for frame in &frames {
            payload.extend_from_slice(&frame.encode());
        }

        let mut cursor = 0;
        let mut walked = Vec::new();
        while cursor < payload.len() {
            let span = Frame::wire_len(&payload[cursor..]).unwrap();
            walked.push(StreamFrame::decode(&payload[cursor..cursor + span]).unwrap());
            cursor += span;
        }
        assert_eq!(cursor, payload.len());
        assert_eq!(walked, frames);
    }

    #[test]
    fn test_stub_frames_round_trip() {
        let frames = vec![
            Frame::ResetStream(ResetStreamFrame {
                stream_id: 3,
                error_code: 1,
                final_size: 1024,
            }),
            Frame::StopSending(StopSendingFrame {
                stream_id: 3,
                error_code: 1,
            }),
            Frame::MaxData(MaxDataFrame { maximum_data: 1 << 20 }),
            Frame::MaxStreamData(MaxStreamDataFrame {
                stream_id: 7,
                maximum_stream_data: 4096,
            }),
            Frame::MaxStreams(MaxStreamsFrame {
                unidirectional: true,
                maximum_streams: 10,
            }),
            Frame::MaxStreams(MaxStreamsFrame {
                unidirectional: false,
                maximum_streams: 10,
            }),
            Frame::DataBlocked(DataBlockedFrame { limit: 2000 }),
        ];
        for frame in frames {
            let encoded = frame.encode();
            assert_eq!(encoded.len(), frame.encoded_len());
            assert_eq!(Frame::decode(&encoded).unwrap(), frame);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(Frame::decode(&[0x1e]).is_err());
        assert!(Frame::wire_len(&[0xFF]).is_err());
        assert!(matches!(
            FrameKind::classify(0x00),
            Err(FlitError::UnknownFrameType(0x00))
        ));
    }

    #[test]
    fn test_truncated_rejected() {
        let frame = StreamFrame::new(1, 9, true, Bytes::from_static(b"abc"));
        let encoded = frame.encode();
        assert!(StreamFrame::decode(&encoded[..10]).is_err());
        assert!(ResetStreamFrame::decode(&[RESET_STREAM]).is_err());
    }
}
