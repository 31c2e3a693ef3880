//! HPACK header compression (RFC 7541).
//!
//! Each direction of a connection owns one `Encoder` or `Decoder`; the two
//! never share dynamic-table state, and indices are encoded absolutely on
//! the wire.

mod decoder;
mod encoder;
mod header;
pub mod huffman;
mod table;

pub use self::decoder::{Decoder, DecoderError};
pub use self::encoder::Encoder;
pub use self::header::Header;

/// Initial dynamic table capacity in both directions (RFC 7541 Section 6.5.2).
pub const DEFAULT_TABLE_SIZE: usize = 4_096;
