use frame::{Frame, StreamId};
use bytes::{BufMut, Bytes, BytesMut, BigEndian};

/// A frame of a type this peer does not implement.
///
/// Surfaced as an opaque record so callers can observe extension traffic;
/// the connection engine discards these without further processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unknown {
    kind: u8,
    flag: u8,
    stream_id: StreamId,
    payload: Bytes,
}

impl Unknown {
    pub fn new(kind: u8, flag: u8, stream_id: StreamId, payload: Bytes) -> Unknown {
        Unknown {
            kind: kind,
            flag: flag,
            stream_id: stream_id,
            payload: payload,
        }
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn flag(&self) -> u8 {
        self.flag
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(super::HEADER_LEN + self.payload.len());
        dst.put_uint::<BigEndian>(self.payload.len() as u64, 3);
        dst.put_u8(self.kind);
        dst.put_u8(self.flag);
        dst.put_u32::<BigEndian>(self.stream_id.into());
        dst.put_slice(&self.payload);
    }
}

impl From<Unknown> for Frame {
    fn from(src: Unknown) -> Frame {
        Frame::Unknown(src)
    }
}
