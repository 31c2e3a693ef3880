use frame::{Error, Frame, Head, Kind, Reason, StreamId};
use bytes::{BufMut, Bytes, BytesMut, BigEndian};

/// A GOAWAY frame: the last peer-initiated stream that will be processed, an
/// error code, and opaque debug data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoAway {
    last_stream_id: StreamId,
    error_code: Reason,
    debug_data: Bytes,
}

impl GoAway {
    pub fn new(last_stream_id: StreamId, error: Reason, debug_data: Bytes) -> GoAway {
        GoAway {
            last_stream_id: last_stream_id,
            error_code: error,
            debug_data: debug_data,
        }
    }

    pub fn last_stream_id(&self) -> StreamId {
        self.last_stream_id
    }

    pub fn reason(&self) -> Reason {
        self.error_code
    }

    pub fn debug_data(&self) -> &Bytes {
        &self.debug_data
    }

    pub fn load(head: Head, mut payload: Bytes) -> Result<GoAway, Error> {
        debug_assert_eq!(head.kind(), Kind::GoAway);

        if !head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        // At least the last-stream-id and error-code words.
        if payload.len() < 8 {
            return Err(Error::BadFrameSize);
        }

        let last_stream_id = StreamId::parse(&payload[..4]);
        let error_code = unpack_octets_4!(payload, 4, u32);
        let debug_data = payload.split_off(8);

        Ok(GoAway {
            last_stream_id: last_stream_id,
            error_code: error_code.into(),
            debug_data: debug_data,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        trace!("encoding GO_AWAY; code={:?}", self.error_code);

        let payload_len = 8 + self.debug_data.len();
        let head = Head::new(Kind::GoAway, 0, StreamId::zero());

        dst.reserve(super::HEADER_LEN + payload_len);
        head.encode(payload_len, dst);
        dst.put_u32::<BigEndian>(self.last_stream_id.into());
        dst.put_u32::<BigEndian>(self.error_code.into());
        dst.put_slice(&self.debug_data);
    }
}

impl From<GoAway> for Frame {
    fn from(src: GoAway) -> Frame {
        Frame::GoAway(src)
    }
}
