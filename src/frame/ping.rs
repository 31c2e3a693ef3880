use frame::{Error, Frame, Head, Kind, StreamId};
use bytes::{BufMut, BytesMut};

const ACK: u8 = 0x1;

/// Length of the opaque payload, always.
const PAYLOAD_LEN: usize = 8;

/// A PING frame: eight opaque octets, echoed back with the ACK flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    ack: bool,
    payload: [u8; PAYLOAD_LEN],
}

// ===== impl Ping =====

impl Ping {
    pub fn ping(payload: [u8; PAYLOAD_LEN]) -> Ping {
        Ping {
            ack: false,
            payload: payload,
        }
    }

    /// The answer to a received `ping`, carrying its payload.
    pub fn pong(payload: [u8; PAYLOAD_LEN]) -> Ping {
        Ping {
            ack: true,
            payload: payload,
        }
    }

    pub fn is_ack(&self) -> bool {
        self.ack
    }

    pub fn payload(&self) -> &[u8; PAYLOAD_LEN] {
        &self.payload
    }

    pub fn into_payload(self) -> [u8; PAYLOAD_LEN] {
        self.payload
    }

    pub fn load(head: Head, bytes: &[u8]) -> Result<Ping, Error> {
        debug_assert_eq!(head.kind(), Kind::Ping);

        // PING frames address the connection, never a stream.
        if !head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        if bytes.len() != PAYLOAD_LEN {
            return Err(Error::BadFrameSize);
        }

        let mut payload = [0; PAYLOAD_LEN];
        payload.copy_from_slice(bytes);

        Ok(Ping {
            ack: head.flag() & ACK == ACK,
            payload: payload,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        trace!("encoding PING; ack={}", self.ack);

        let flag = if self.ack { ACK } else { 0 };
        let head = Head::new(Kind::Ping, flag, StreamId::zero());

        dst.reserve(super::HEADER_LEN + PAYLOAD_LEN);
        head.encode(PAYLOAD_LEN, dst);
        dst.put_slice(&self.payload);
    }
}

impl From<Ping> for Frame {
    fn from(src: Ping) -> Frame {
        Frame::Ping(src)
    }
}
