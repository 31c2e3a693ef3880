use frame::{Error, Frame, Head, Kind, StreamId};
use bytes::{BufMut, BytesMut, BigEndian};

const SIZE_INCREMENT_MASK: u32 = 1 << 31;

/// A WINDOW_UPDATE frame, stream-scoped or (on stream zero) connection
/// scoped.
///
/// A zero increment is well-formed at this layer; the connection engine
/// decides its error scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUpdate {
    stream_id: StreamId,
    size_increment: u32,
}

impl WindowUpdate {
    pub fn new(stream_id: StreamId, size_increment: u32) -> WindowUpdate {
        WindowUpdate {
            stream_id: stream_id,
            size_increment: size_increment,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn size_increment(&self) -> u32 {
        self.size_increment
    }

    pub fn load(head: Head, payload: &[u8]) -> Result<WindowUpdate, Error> {
        debug_assert_eq!(head.kind(), Kind::WindowUpdate);

        // WINDOW_UPDATE frames are exactly 4 octets.
        if payload.len() != 4 {
            return Err(Error::BadFrameSize);
        }

        // R bit masked off.
        let size_increment = unpack_octets_4!(payload, 0, u32) & !SIZE_INCREMENT_MASK;

        Ok(WindowUpdate {
            stream_id: head.stream_id(),
            size_increment: size_increment,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        trace!("encoding WINDOW_UPDATE; stream={:?} inc={}",
               self.stream_id, self.size_increment);

        let head = Head::new(Kind::WindowUpdate, 0, self.stream_id);
        dst.reserve(super::HEADER_LEN + 4);
        head.encode(4, dst);
        dst.put_u32::<BigEndian>(self.size_increment & !SIZE_INCREMENT_MASK);
    }
}

impl From<WindowUpdate> for Frame {
    fn from(src: WindowUpdate) -> Frame {
        Frame::WindowUpdate(src)
    }
}
