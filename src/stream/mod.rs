pub mod id;
pub mod recv;
pub mod send;
pub mod stream;

pub use id::*;
pub use stream::Stream;
