//! The stateful byte-stream side of the frame codec.
//!
//! `Parser` turns successive input slices into typed `frame::Frame` records;
//! serialization lives with the frame types themselves.

mod error;
mod parser;

pub use self::error::RecvError;
pub use self::parser::Parser;
