//! Packet model: code enum and the in-memory packet with its ordered
//! attribute multi-map.

pub mod code;
#[allow(clippy::module_inception)]
pub mod packet;

pub use code::Code;
pub use packet::Packet;
