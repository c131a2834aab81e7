pub mod connection;
pub mod stats;
pub mod types;

pub use connection::Connection;
pub use types::Role;
