use std::collections::VecDeque;

use bytes::Bytes;

use crate::packet::frame::StreamFrame;
use crate::result::{FlitError, FlitResult};

use super::id::StreamId;

/// Sending-half lifecycle, after RFC 9000 section 3.1. There are no
/// acknowledgements on this channel, so the terminal state is plain `Done`
/// rather than anything claiming the peer received the data.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SendState {
    Ready,
    Send,
    DataSent,
    Done,
}

/// The sending half of a stream: an append-only buffer partitioned into
/// frames on demand, handed out one frame at a time by the connection's
/// packet builder.
#[derive(Debug)]
pub struct SendStream {
    id: StreamId,
    // next untransmitted byte of the buffer
    offset: usize,
    buffer: Vec<u8>,
    pending: VecDeque<StreamFrame>,
    state: SendState,
}

impl SendStream {
    pub fn new(id: StreamId) -> Self {
        Self {
            id,
            offset: 0,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            state: SendState::Ready,
        }
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state == SendState::Done
    }

    /// Whether the half still has to be asked for frames: data has been
    /// written and none of it has been partitioned yet.
    pub fn wants_frames(&self) -> bool {
        self.state == SendState::Ready && !self.buffer.is_empty()
    }

    pub fn write(&mut self, data: &[u8]) -> FlitResult<()> {
        if self.state != SendState::Ready {
            return Err(FlitError::NotWritable(self.id.to_inner()));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Partitions the unsent part of the buffer into non-FIN frames of
    /// exactly `max_size` bytes, then one FIN frame carrying the tail
    /// (possibly empty). `max_size` is this stream's share of a packet's
    /// payload budget.
    pub fn generate_frames(&mut self, max_size: usize) -> FlitResult<()> {
        if self.state != SendState::Ready {
            return Err(FlitError::NotWritable(self.id.to_inner()));
        }
        let whole_frames = (self.buffer.len() - self.offset) / max_size;
        for _ in 0..whole_frames {
            let data = Bytes::copy_from_slice(&self.buffer[self.offset..self.offset + max_size]);
            self.pending.push_back(StreamFrame::new(
                self.id.to_inner(),
                self.offset as u64,
                false,
                data,
            ));
            self.offset += max_size;
        }
        let fin = self.generate_fin_frame();
        self.pending.push_back(fin);
        Ok(())
    }

    // materializing the FIN is the point where there is nothing left to
    // partition, hence DataSent
    fn generate_fin_frame(&mut self) -> StreamFrame {
        self.state = SendState::DataSent;
        let data = Bytes::copy_from_slice(&self.buffer[self.offset..]);
        let frame = StreamFrame::new(self.id.to_inner(), self.offset as u64, true, data);
        self.offset = self.buffer.len();
        frame
    }

    /// Pops the next pending frame. The FIN frame is always last and
    /// handing it out finishes the half.
    pub fn next_frame(&mut self) -> Option<StreamFrame> {
        let frame = self.pending.pop_front()?;
        self.state = if frame.fin {
            SendState::Done
        } else {
            SendState::Send
        };
        Some(frame)
    }
}
