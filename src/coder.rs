use crate::result::FlitResult;

/// Wire codec seam implemented by everything that crosses the socket.
/// `decode` expects a slice spanning exactly one encoded value.
pub trait Coder: Sized {
    fn encode(&self) -> Vec<u8>;
    fn decode(bytes: &[u8]) -> FlitResult<Self>;
}
