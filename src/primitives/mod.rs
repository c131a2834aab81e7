pub mod packet_number;

pub use packet_number::*;
