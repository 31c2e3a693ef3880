//! Shared plumbing for the integration tests: a collecting handler and a
//! few wire-byte helpers.

use h2_wire::{Frame, Handler, RecvError};
use h2_wire::codec::Parser;
use h2_wire::frame::{self, StreamId};
use h2_wire::proto::Connection;

use bytes::Bytes;

/// Records everything the connection tells us.
#[derive(Debug, Default)]
pub struct MockHandler {
    pub frames: Vec<Frame>,
    pub sent: Vec<Bytes>,
    pub settings_acks: usize,
    pub ping_acks: Vec<frame::Ping>,
    pub goaways: Vec<frame::GoAway>,
}

impl Handler for MockHandler {
    fn on_frame(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }

    fn on_settings_ack(&mut self) {
        self.settings_acks += 1;
    }

    fn on_ping_ack(&mut self, frame: &frame::Ping) {
        self.ping_acks.push(*frame);
    }

    fn on_goaway(&mut self, frame: &frame::GoAway) {
        self.goaways.push(frame.clone());
    }

    fn on_send_bytes(&mut self, bytes: Bytes) {
        self.sent.push(bytes);
    }
}

impl MockHandler {
    pub fn new() -> MockHandler {
        let _ = ::env_logger::try_init();
        MockHandler::default()
    }

    /// Everything emitted so far, as one contiguous byte stream.
    pub fn sent_bytes(&self) -> Vec<u8> {
        let mut out = vec![];
        for chunk in &self.sent {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Re-parse the emitted byte stream into typed records.
    pub fn sent_frames(&self) -> Vec<Frame> {
        let mut parser = Parser::new();
        parser.feed(&self.sent_bytes());

        let mut frames = vec![];
        while let Some(frame) = parser.next_frame().expect("emitted frames reparse") {
            frames.push(frame);
        }
        frames
    }

    pub fn take_sent(&mut self) -> Vec<Bytes> {
        ::std::mem::replace(&mut self.sent, vec![])
    }
}

/// Feed bytes expecting no connection-level error.
pub fn feed_ok(conn: &mut Connection, handler: &mut MockHandler, src: &[u8]) {
    let (consumed, err) = conn.feed_bytes(src, handler);
    assert_eq!(consumed, src.len());
    assert_eq!(err, None);
}

/// Feed bytes expecting the given connection-level error.
pub fn feed_conn_err(
    conn: &mut Connection,
    handler: &mut MockHandler,
    src: &[u8],
    reason: frame::Reason,
) {
    let (_, err) = conn.feed_bytes(src, handler);
    assert_eq!(err, Some(RecvError::Connection(reason)));
}

pub fn ping_bytes(payload: [u8; 8], ack: bool) -> Vec<u8> {
    let frame = if ack {
        frame::Ping::pong(payload)
    } else {
        frame::Ping::ping(payload)
    };

    let mut buf = ::bytes::BytesMut::new();
    frame.encode(&mut buf);
    buf.to_vec()
}

pub fn settings_bytes(set: &frame::SettingSet) -> Vec<u8> {
    let mut buf = ::bytes::BytesMut::new();
    frame::Settings::new(set.clone()).encode(&mut buf);
    buf.to_vec()
}

pub fn data_bytes(stream_id: u32, payload: &[u8], eos: bool) -> Vec<u8> {
    let frame = frame::Data::new(
        StreamId::from(stream_id),
        Bytes::from(payload.to_vec()),
        eos,
    );

    let mut buf = ::bytes::BytesMut::new();
    frame.encode(&mut buf);
    buf.to_vec()
}

/// Expect exactly one RST_STREAM among the emitted frames and return it.
pub fn expect_reset(handler: &MockHandler) -> frame::Reset {
    let resets: Vec<frame::Reset> = handler
        .sent_frames()
        .into_iter()
        .filter_map(|frame| match frame {
            Frame::Reset(reset) => Some(reset),
            _ => None,
        })
        .collect();

    assert_eq!(resets.len(), 1, "expected exactly one RST_STREAM");
    resets[0]
}
