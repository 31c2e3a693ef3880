use frame::{util, Error, Frame, Head, Kind, StreamId};
use bytes::{BufMut, Bytes, BytesMut};

/// A DATA frame: application octets bound to a single stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    stream_id: StreamId,
    data: Bytes,
    flags: DataFlag,
    pad_len: Option<u8>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct DataFlag(u8);

const END_STREAM: u8 = 0x1;
const PADDED: u8 = 0x8;
const ALL: u8 = END_STREAM | PADDED;

// ===== impl Data =====

impl Data {
    pub fn new(stream_id: StreamId, data: Bytes, eos: bool) -> Data {
        let mut flags = DataFlag::default();

        if eos {
            flags.set_end_stream();
        }

        Data {
            stream_id: stream_id,
            data: data,
            flags: flags,
            pad_len: None,
        }
    }

    pub fn load(head: Head, mut payload: Bytes) -> Result<Data, Error> {
        debug_assert_eq!(head.kind(), Kind::Data);

        if head.stream_id().is_zero() {
            // DATA frames MUST be associated with a stream.
            return Err(Error::InvalidStreamId);
        }

        let flags = DataFlag::load(head.flag());

        let pad_len = if flags.is_padded() {
            Some(util::strip_padding(&mut payload)?)
        } else {
            None
        };

        Ok(Data {
            stream_id: head.stream_id(),
            data: payload,
            flags: flags,
            pad_len: pad_len,
        })
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn is_end_stream(&self) -> bool {
        self.flags.is_end_stream()
    }

    pub fn set_end_stream(&mut self) {
        self.flags.set_end_stream();
    }

    pub fn payload(&self) -> &Bytes {
        &self.data
    }

    pub fn into_payload(self) -> Bytes {
        self.data
    }

    /// Octets this frame occupies under flow control: the content plus any
    /// padding and its length prefix.
    pub fn flow_len(&self) -> usize {
        util::flow_len(self.data.len(), self.pad_len)
    }

    pub fn head(&self) -> Head {
        Head::new(Kind::Data, self.flags.into(), self.stream_id)
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        let pad_len = self.pad_len.unwrap_or(0) as usize;
        let payload_len = self.flow_len();

        trace!("encoding DATA; len={}", payload_len);

        dst.reserve(super::HEADER_LEN + payload_len);
        self.head().encode(payload_len, dst);

        if self.flags.is_padded() {
            dst.put_u8(pad_len as u8);
        }

        dst.put_slice(&self.data);

        // Padding octets are always transmitted as zero.
        for _ in 0..pad_len {
            dst.put_u8(0);
        }
    }
}

impl From<Data> for Frame {
    fn from(src: Data) -> Frame {
        Frame::Data(src)
    }
}

// ===== impl DataFlag =====

impl DataFlag {
    pub fn load(bits: u8) -> DataFlag {
        DataFlag(bits & ALL)
    }

    pub fn is_end_stream(&self) -> bool {
        self.0 & END_STREAM == END_STREAM
    }

    pub fn set_end_stream(&mut self) {
        self.0 |= END_STREAM
    }

    pub fn is_padded(&self) -> bool {
        self.0 & PADDED == PADDED
    }
}

impl From<DataFlag> for u8 {
    fn from(src: DataFlag) -> u8 {
        src.0
    }
}
