use codec::RecvError;
use frame::{self, Frame, Head, Kind, Reason};
use frame::{DEFAULT_MAX_FRAME_SIZE, HEADER_LEN, MAX_MAX_FRAME_SIZE};

use bytes::{Bytes, BytesMut};

/// A stateful frame parser: successive byte slices in, typed frame records
/// out.
///
/// Input is accumulated in an internal buffer; no frame is yielded until its
/// full header and payload are present, and no reference to caller memory is
/// retained across calls.
#[derive(Debug)]
pub struct Parser {
    buf: BytesMut,
    state: State,

    /// Largest payload the peer may send us, per the size gate.
    max_frame_size: u32,

    /// Set once the size gate trips; nothing further is parsed.
    halted: bool,
}

#[derive(Debug)]
enum State {
    AwaitingHeader,
    AwaitingPayload { head: Head, raw_kind: u8, len: usize },
}

// ===== impl Parser =====

impl Parser {
    pub fn new() -> Parser {
        Parser {
            buf: BytesMut::new(),
            state: State::AwaitingHeader,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            halted: false,
        }
    }

    /// Updates the max frame size gate.
    ///
    /// Must be within the RFC-defined range of the setting.
    pub fn set_max_frame_size(&mut self, val: u32) {
        debug_assert!(DEFAULT_MAX_FRAME_SIZE <= val && val <= MAX_MAX_FRAME_SIZE);
        self.max_frame_size = val;
    }

    /// Append raw bytes to the internal buffer.
    pub fn feed(&mut self, src: &[u8]) {
        self.buf.extend_from_slice(src);
    }

    /// Octets currently buffered awaiting a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pull the next complete frame out of the buffer.
    ///
    /// Returns `Ok(None)` when the buffered input stops mid-frame; state is
    /// preserved and parsing resumes on the next `feed`.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, RecvError> {
        loop {
            if self.halted {
                return Ok(None);
            }

            match self.state {
                State::AwaitingHeader => {
                    if self.buf.len() < HEADER_LEN {
                        return Ok(None);
                    }

                    let len = ((self.buf[0] as usize) << 16)
                        | ((self.buf[1] as usize) << 8)
                        | (self.buf[2] as usize);
                    let raw_kind = self.buf[3];
                    let head = Head::parse(&self.buf[3..HEADER_LEN]);

                    trace!("parsed frame head; kind={:?} len={}", head.kind(), len);

                    if len as u32 > self.max_frame_size {
                        debug!("frame size {} above limit {}", len, self.max_frame_size);
                        self.halted = true;
                        return Err(RecvError::Connection(Reason::FRAME_SIZE_ERROR));
                    }

                    let _ = self.buf.split_to(HEADER_LEN);

                    self.state = State::AwaitingPayload {
                        head: head,
                        raw_kind: raw_kind,
                        len: len,
                    };
                }
                State::AwaitingPayload { head, raw_kind, len } => {
                    if self.buf.len() < len {
                        return Ok(None);
                    }

                    let payload = self.buf.split_to(len).freeze();
                    self.state = State::AwaitingHeader;

                    return self.decode_frame(head, raw_kind, payload).map(Some);
                }
            }
        }
    }

    fn decode_frame(
        &mut self,
        head: Head,
        raw_kind: u8,
        payload: Bytes,
    ) -> Result<Frame, RecvError> {
        let frame = match head.kind() {
            Kind::Data => frame::Data::load(head, payload)?.into(),
            Kind::Headers => {
                match frame::Headers::load(head, payload) {
                    Ok(frame) => frame.into(),
                    Err(frame::Error::InvalidDependencyId) => {
                        // A stream depending on itself fails only that
                        // stream.
                        return Err(RecvError::Stream {
                            id: head.stream_id(),
                            reason: Reason::PROTOCOL_ERROR,
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Kind::Priority => {
                match frame::Priority::load(head, &payload) {
                    Ok(frame) => frame.into(),
                    Err(frame::Error::InvalidDependencyId) => {
                        return Err(RecvError::Stream {
                            id: head.stream_id(),
                            reason: Reason::PROTOCOL_ERROR,
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Kind::Reset => frame::Reset::load(head, &payload)?.into(),
            Kind::Settings => frame::Settings::load(head, &payload)?.into(),
            Kind::PushPromise => frame::PushPromise::load(head, payload)?.into(),
            Kind::Ping => frame::Ping::load(head, &payload)?.into(),
            Kind::GoAway => frame::GoAway::load(head, payload)?.into(),
            Kind::WindowUpdate => frame::WindowUpdate::load(head, &payload)?.into(),
            Kind::Continuation => frame::Continuation::load(head, payload)?.into(),
            Kind::Unknown => {
                frame::Unknown::new(raw_kind, head.flag(), head.stream_id(), payload).into()
            }
        };

        debug!("received; frame={:?}", frame);

        Ok(frame)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use frame::Frame;

    fn parse_one(src: &[u8]) -> Result<Option<Frame>, RecvError> {
        let mut parser = Parser::new();
        parser.feed(src);
        parser.next_frame()
    }

    #[test]
    fn parse_ping() {
        let frame = parse_one(&[
            0x00, 0x00, 0x08, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02,
            0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ]).unwrap()
            .unwrap();

        match frame {
            Frame::Ping(ping) => {
                assert!(!ping.is_ack());
                assert_eq!(ping.payload(), &[1, 2, 3, 4, 5, 6, 7, 8]);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn parse_across_partial_feeds() {
        let bytes = [
            0x00, 0x00, 0x05, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, b'h', b'e',
            b'l', b'l', b'o',
        ];

        let mut parser = Parser::new();

        for split in 1..bytes.len() - 1 {
            let (a, b) = bytes.split_at(split);

            parser.feed(a);
            assert_eq!(parser.next_frame().unwrap(), None);

            parser.feed(b);
            match parser.next_frame().unwrap().unwrap() {
                Frame::Data(data) => {
                    assert_eq!(data.stream_id(), 1);
                    assert!(data.is_end_stream());
                    assert_eq!(&data.payload()[..], b"hello");
                }
                other => panic!("unexpected frame {:?}", other),
            }

            assert_eq!(parser.next_frame().unwrap(), None);
        }
    }

    #[test]
    fn parse_window_update_zero_increment() {
        // A zero increment is structurally valid; scoping the error is the
        // engine's job.
        let frame = parse_one(&[
            0x00, 0x00, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x00,
        ]).unwrap()
            .unwrap();

        match frame {
            Frame::WindowUpdate(wu) => {
                assert_eq!(wu.stream_id(), 1);
                assert_eq!(wu.size_increment(), 0);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn parse_unknown_kind() {
        let frame = parse_one(&[
            0x00, 0x00, 0x02, 0x77, 0x0a, 0x00, 0x00, 0x00, 0x07, 0xde, 0xad,
        ]).unwrap()
            .unwrap();

        match frame {
            Frame::Unknown(unknown) => {
                assert_eq!(unknown.kind(), 0x77);
                assert_eq!(unknown.flag(), 0x0a);
                assert_eq!(unknown.stream_id(), 7);
                assert_eq!(&unknown.payload()[..], &[0xde, 0xad]);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn size_gate_halts() {
        let mut parser = Parser::new();

        // A 20000-octet DATA frame against the default 16384 limit.
        parser.feed(&[0x00, 0x4e, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);

        assert_eq!(
            parser.next_frame(),
            Err(RecvError::Connection(Reason::FRAME_SIZE_ERROR))
        );

        // Once tripped, nothing further is parsed.
        parser.feed(&[0x00; 32]);
        assert_eq!(parser.next_frame().unwrap(), None);
    }

    #[test]
    fn ping_with_bad_length() {
        assert_eq!(
            parse_one(&[0x00, 0x00, 0x01, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff]),
            Err(RecvError::Connection(Reason::FRAME_SIZE_ERROR))
        );
    }

    #[test]
    fn data_on_stream_zero() {
        assert_eq!(
            parse_one(&[0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff]),
            Err(RecvError::Connection(Reason::PROTOCOL_ERROR))
        );
    }
}
