use frame::StreamId;

use bytes::{BufMut, BigEndian};

/// The 9-octet header common to every HTTP/2 frame.
///
/// The 24-bit payload length travels separately: on parse it is consumed by
/// the codec layer before the payload is sliced off, and on encode it is
/// derived from the payload actually written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Head {
    kind: Kind,
    flag: u8,
    stream_id: StreamId,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Kind {
    Data = 0,
    Headers = 1,
    Priority = 2,
    Reset = 3,
    Settings = 4,
    PushPromise = 5,
    Ping = 6,
    GoAway = 7,
    WindowUpdate = 8,
    Continuation = 9,
    Unknown,
}

// ===== impl Head =====

impl Head {
    pub fn new(kind: Kind, flag: u8, stream_id: StreamId) -> Head {
        Head {
            kind: kind,
            flag: flag,
            stream_id: stream_id,
        }
    }

    /// Parse an HTTP/2 frame header, starting at the type octet.
    ///
    /// The slice must hold at least the 6 trailing octets of the 9-octet
    /// header (type, flags, R|stream-id); the length prefix is handled by
    /// the caller.
    pub fn parse(header: &[u8]) -> Head {
        Head {
            kind: Kind::new(header[0]),
            flag: header[1],
            stream_id: StreamId::parse(&header[2..]),
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn flag(&self) -> u8 {
        self.flag
    }

    /// Write the full 9-octet header.
    ///
    /// The reserved bit of the stream identifier is always emitted as zero.
    pub fn encode<B: BufMut>(&self, payload_len: usize, dst: &mut B) {
        debug_assert!(payload_len < 1 << 24);

        dst.put_uint::<BigEndian>(payload_len as u64, 3);
        dst.put_u8(self.kind.byte());
        dst.put_u8(self.flag);
        dst.put_u32::<BigEndian>(self.stream_id.into());
    }
}

// ===== impl Kind =====

impl Kind {
    pub fn new(byte: u8) -> Kind {
        match byte {
            0 => Kind::Data,
            1 => Kind::Headers,
            2 => Kind::Priority,
            3 => Kind::Reset,
            4 => Kind::Settings,
            5 => Kind::PushPromise,
            6 => Kind::Ping,
            7 => Kind::GoAway,
            8 => Kind::WindowUpdate,
            9 => Kind::Continuation,
            _ => Kind::Unknown,
        }
    }

    fn byte(&self) -> u8 {
        use self::Kind::*;

        match *self {
            Data => 0,
            Headers => 1,
            Priority => 2,
            Reset => 3,
            Settings => 4,
            PushPromise => 5,
            Ping => 6,
            GoAway => 7,
            WindowUpdate => 8,
            Continuation => 9,
            // Unknown frames carry their own raw type octet and never
            // round-trip through `Head::encode`.
            Unknown => unreachable!(),
        }
    }
}
