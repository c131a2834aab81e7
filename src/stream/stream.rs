use bytes::Bytes;

use crate::connection::types::Role;
use crate::packet::frame::StreamFrame;
use crate::result::{FlitError, FlitResult};

use super::id::StreamId;
use super::recv::RecvStream;
use super::send::SendStream;

/// One application stream: a sending half and a receiving half bound under
/// a single id. Which halves are usable follows from the id's attributes
/// and the endpoint's role; the unusable half of a unidirectional stream
/// is permanently terminal.
#[derive(Debug)]
pub struct Stream {
    id: StreamId,
    sender: SendStream,
    receiver: RecvStream,
    sender_usable: bool,
    receiver_usable: bool,
}

impl Stream {
    pub fn new(id: StreamId, local_role: Role) -> Self {
        let locally_initiated = id.is_server_initiated() == local_role.is_server();
        let unidirectional = id.is_unidirectional();
        Self {
            id,
            sender: SendStream::new(id),
            receiver: RecvStream::new(id),
            sender_usable: !unidirectional || locally_initiated,
            receiver_usable: !unidirectional || !locally_initiated,
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn sender_usable(&self) -> bool {
        self.sender_usable
    }

    pub fn receiver_usable(&self) -> bool {
        self.receiver_usable
    }

    pub fn write(&mut self, data: &[u8]) -> FlitResult<()> {
        if !self.sender_usable {
            return Err(FlitError::NotWritable(self.id.to_inner()));
        }
        self.sender.write(data)
    }

    /// Whether the packet builder should ask this stream to partition its
    /// buffer before the next packet.
    pub fn wants_frames(&self) -> bool {
        self.sender_usable && self.sender.wants_frames()
    }

    pub fn generate_frames(&mut self, max_size: usize) -> FlitResult<()> {
        if !self.sender_usable {
            return Err(FlitError::NotWritable(self.id.to_inner()));
        }
        self.sender.generate_frames(max_size)
    }

    pub fn next_frame(&mut self) -> Option<StreamFrame> {
        if !self.sender_usable {
            return None;
        }
        self.sender.next_frame()
    }

    pub fn receive_frame(&mut self, frame: &StreamFrame) -> FlitResult<()> {
        if !self.receiver_usable {
            return Err(FlitError::NotReadable(self.id.to_inner()));
        }
        self.receiver.frame_received(frame);
        Ok(())
    }

    pub fn take_data(&mut self) -> FlitResult<Bytes> {
        if !self.receiver_usable {
            return Err(FlitError::NotReadable(self.id.to_inner()));
        }
        self.receiver.take_data()
    }

    /// For file transfer one finished half is enough on a bidirectional
    /// stream; a unidirectional stream finishes with its only usable half.
    pub fn is_finished(&self) -> bool {
        match (self.sender_usable, self.receiver_usable) {
            (true, true) => self.sender.is_terminal() || self.receiver.is_terminal(),
            (true, false) => self.sender.is_terminal(),
            (false, true) => self.receiver.is_terminal(),
            (false, false) => true,
        }
    }
}
