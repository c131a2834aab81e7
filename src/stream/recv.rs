use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

use crate::packet::frame::StreamFrame;
use crate::result::{FlitError, FlitResult};

use super::id::StreamId;

/// Receiving-half lifecycle, after RFC 9000 section 3.2.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecvState {
    Recv,
    SizeKnown,
    DataRecvd,
    DataRead,
}

/// The receiving half of a stream. Frames land in an offset-keyed map in
/// whatever order the packets carried them; once the FIN has been seen and
/// every byte up to the final size has arrived, the map is flushed in
/// ascending offset order into one contiguous buffer.
#[derive(Debug)]
pub struct RecvStream {
    id: StreamId,
    // bytes admitted across all distinct offsets
    admitted: u64,
    // the FIN frame's offset plus length, once seen
    final_size: Option<u64>,
    segments: BTreeMap<u64, Bytes>,
    assembled: Option<Bytes>,
    state: RecvState,
}

impl RecvStream {
    pub fn new(id: StreamId) -> Self {
        Self {
            id,
            admitted: 0,
            final_size: None,
            segments: BTreeMap::new(),
            assembled: None,
            state: RecvState::Recv,
        }
    }

    pub fn state(&self) -> RecvState {
        self.state
    }

    /// The half counts as terminal once the data is assembled, read or not.
    pub fn is_terminal(&self) -> bool {
        self.state == RecvState::DataRecvd || self.state == RecvState::DataRead
    }

    pub fn frame_received(&mut self, frame: &StreamFrame) {
        if frame.fin {
            if self.state == RecvState::Recv {
                self.state = RecvState::SizeKnown;
            }
            self.final_size = Some(frame.offset + frame.data.len() as u64);
        }

        // duplicate offsets overwrite; data for a given offset is
        // deterministic, so only count the replaced bytes once
        if let Some(previous) = self.segments.insert(frame.offset, frame.data.clone()) {
            self.admitted -= previous.len() as u64;
        }
        self.admitted += frame.data.len() as u64;

        if self.state == RecvState::SizeKnown && Some(self.admitted) == self.final_size {
            self.flush();
        }
    }

    // the BTreeMap iterates in ascending offset order, which is exactly
    // the reassembly order
    fn flush(&mut self) {
        let mut buffer = BytesMut::with_capacity(self.admitted as usize);
        for data in self.segments.values() {
            buffer.put_slice(data);
        }
        self.segments.clear();
        self.assembled = Some(buffer.freeze());
        self.state = RecvState::DataRecvd;
    }

    /// Hands the assembled bytes out exactly once.
    pub fn take_data(&mut self) -> FlitResult<Bytes> {
        if self.state != RecvState::DataRecvd {
            return Err(FlitError::NotReadable(self.id.to_inner()));
        }
        self.state = RecvState::DataRead;
        Ok(self.assembled.take().unwrap_or_default())
    }
}
