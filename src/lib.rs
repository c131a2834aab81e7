pub mod primitives;
pub use primitives::*;

pub mod bits;
pub mod coder;
pub mod config;
pub mod connection;
pub mod macros;
pub mod packet;
pub mod result;
pub mod stream;
