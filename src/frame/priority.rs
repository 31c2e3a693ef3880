use frame::{Error, Frame, Head, Kind, StreamId};
use bytes::{BufMut, BytesMut, BigEndian};

/// A PRIORITY frame.
///
/// The payload is parsed and re-emitted faithfully, but the crate performs
/// no dependency-tree arithmetic with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Priority {
    stream_id: StreamId,
    dependency: StreamDependency,
}

/// The 5-octet priority block: `E|dep (4), weight (1)`.
///
/// Also carried inline by HEADERS frames with the PRIORITY flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDependency {
    /// The stream being depended on.
    pub dependency_id: StreamId,

    /// Weight as carried on the wire, 0..=255 standing for 1..=256.
    pub weight: u8,

    /// Whether the dependency is exclusive.
    pub is_exclusive: bool,
}

// ===== impl Priority =====

impl Priority {
    pub fn new(stream_id: StreamId, dependency: StreamDependency) -> Priority {
        Priority {
            stream_id: stream_id,
            dependency: dependency,
        }
    }

    pub fn load(head: Head, payload: &[u8]) -> Result<Priority, Error> {
        debug_assert_eq!(head.kind(), Kind::Priority);

        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        // PRIORITY frames are exactly 5 octets.
        if payload.len() != 5 {
            return Err(Error::BadFrameSize);
        }

        let dependency = StreamDependency::load(payload)?;

        if dependency.dependency_id == head.stream_id() {
            // A stream cannot depend on itself.
            return Err(Error::InvalidDependencyId);
        }

        Ok(Priority {
            stream_id: head.stream_id(),
            dependency: dependency,
        })
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn dependency(&self) -> &StreamDependency {
        &self.dependency
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        trace!("encoding PRIORITY; stream={:?}", self.stream_id);

        let head = Head::new(Kind::Priority, 0, self.stream_id);
        dst.reserve(super::HEADER_LEN + 5);
        head.encode(5, dst);
        self.dependency.encode(dst);
    }
}

impl From<Priority> for Frame {
    fn from(src: Priority) -> Frame {
        Frame::Priority(src)
    }
}

// ===== impl StreamDependency =====

impl StreamDependency {
    pub fn new(dependency_id: StreamId, weight: u8, is_exclusive: bool) -> StreamDependency {
        StreamDependency {
            dependency_id: dependency_id,
            weight: weight,
            is_exclusive: is_exclusive,
        }
    }

    pub fn load(src: &[u8]) -> Result<StreamDependency, Error> {
        if src.len() < 5 {
            return Err(Error::BadFrameSize);
        }

        // The exclusive flag occupies the reserved bit of the dependency id.
        let is_exclusive = src[0] & 0x80 != 0;
        let dependency_id = StreamId::parse(src);

        Ok(StreamDependency {
            dependency_id: dependency_id,
            weight: src[4],
            is_exclusive: is_exclusive,
        })
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        let mut raw: u32 = self.dependency_id.into();

        if self.is_exclusive {
            raw |= 1 << 31;
        }

        dst.put_u32::<BigEndian>(raw);
        dst.put_u8(self.weight);
    }
}
