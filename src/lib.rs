//! An I/O-free implementation of the HTTP/2 wire protocol (RFC 7540) and the
//! HPACK header compression format (RFC 7541).
//!
//! The crate accepts and emits byte streams; it never opens sockets, spawns
//! threads, or arms timers. Transport layers (TLS tunnels, mock pipes, test
//! harnesses) feed raw bytes in through `Connection::feed_bytes` and drain
//! raw bytes out through the `Handler::on_send_bytes` callback.
//!
//! Four subsystems make up the crate:
//!
//! * `hpack` holds the stateful header compression codec: static and dynamic
//!   tables, canonical integer and string primitives, and the Huffman codec.
//! * `frame` holds typed records for the ten RFC 7540 frame types together
//!   with their serializers.
//! * `codec` holds the stateful parser that turns an incoming byte stream
//!   into frame records.
//! * `proto` holds the connection engine: settings, stream lifecycle,
//!   two-level flow control, CONTINUATION assembly, and the outbound framing
//!   helpers.
//!
//! The 24-octet connection preface is deliberately not handled here; callers
//! prepend it on connect and strip it on accept. `PREFACE` is exported for
//! their convenience.

#![deny(missing_debug_implementations)]

extern crate byteorder;
extern crate bytes;
extern crate fnv;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate ordermap;

pub mod codec;
pub mod error;
pub mod frame;
pub mod hpack;
pub mod proto;

pub use codec::RecvError;
pub use error::SendError;
pub use frame::{Frame, Reason, StreamId};
pub use hpack::Header;
pub use proto::{Config, Connection, Handler, Role};

/// The 24-octet client connection preface.
///
/// Sent once, client to server, ahead of the first frame. The core treats it
/// as an opaque fixed prefix owned by the caller.
pub const PREFACE: &'static [u8; 24] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";
