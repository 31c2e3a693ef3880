//! Round-trip coverage: every frame record survives serialize then parse, with
//! the common header's length re-derived and padding normalized to zero.

extern crate bytes;
extern crate h2_wire;

use h2_wire::Frame;
use h2_wire::codec::Parser;
use h2_wire::frame::{self, StreamDependency, StreamId};
use h2_wire::hpack;

use bytes::{Bytes, BytesMut};

fn reparse(bytes: &[u8]) -> Frame {
    let mut parser = Parser::new();
    parser.feed(bytes);
    parser.next_frame().unwrap().expect("one complete frame")
}

fn assert_round_trip(frame: Frame, bytes: &BytesMut) {
    assert_eq!(reparse(bytes), frame);
}

#[test]
fn data_round_trip() {
    let frame = frame::Data::new(3.into(), Bytes::from_static(b"payload"), true);

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::Data(frame), &buf);
}

#[test]
fn padded_data_normalizes_padding_to_zero() {
    // DATA, PADDED, pad length 3 with junk padding on the wire.
    let wire = [
        0x00, 0x00, 0x07, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x03, b'h',
        b'i', b'!', 0xaa, 0xbb, 0xcc,
    ];

    let frame = match reparse(&wire) {
        Frame::Data(frame) => frame,
        other => panic!("expected DATA, got {:?}", other),
    };

    assert_eq!(&frame.payload()[..], b"hi!");
    // Padding counts toward flow control.
    assert_eq!(frame.flow_len(), 7);

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    // Identical except the padding octets, which re-emit as zero.
    assert_eq!(&buf[..13], &wire[..13]);
    assert_eq!(&buf[13..], &[0, 0, 0]);

    assert_eq!(reparse(&buf), Frame::Data(frame));
}

#[test]
fn headers_round_trip() {
    let mut encoder = hpack::Encoder::new();
    let mut decoder = hpack::Decoder::new(64 * 1024);

    let headers = vec![
        hpack::Header::new(":method", "POST"),
        hpack::Header::new(":path", "/submit"),
        hpack::Header::new("content-length", "42"),
    ];

    let frame = frame::Headers::new(5.into(), headers, true);

    let mut buf = BytesMut::new();
    frame.encode(&mut encoder, &mut buf);

    let mut parsed = match reparse(&buf) {
        Frame::Headers(parsed) => parsed,
        other => panic!("expected HEADERS, got {:?}", other),
    };

    let fragment = parsed.take_fragment();
    parsed.load_hpack(&fragment, &mut decoder).unwrap();

    assert_eq!(parsed, frame);
}

#[test]
fn headers_with_priority_round_trip() {
    let mut encoder = hpack::Encoder::new();
    let mut decoder = hpack::Decoder::new(64 * 1024);

    let mut frame = frame::Headers::new(
        5.into(),
        vec![hpack::Header::new(":method", "GET")],
        false,
    );
    frame.set_stream_dependency(StreamDependency::new(3.into(), 200, true));

    let mut buf = BytesMut::new();
    frame.encode(&mut encoder, &mut buf);

    let mut parsed = match reparse(&buf) {
        Frame::Headers(parsed) => parsed,
        other => panic!("expected HEADERS, got {:?}", other),
    };

    let fragment = parsed.take_fragment();
    parsed.load_hpack(&fragment, &mut decoder).unwrap();

    assert_eq!(parsed, frame);
    assert_eq!(
        parsed.stream_dependency(),
        Some(&StreamDependency::new(3.into(), 200, true))
    );
}

#[test]
fn push_promise_round_trip() {
    let mut encoder = hpack::Encoder::new();
    let mut decoder = hpack::Decoder::new(64 * 1024);

    let frame = frame::PushPromise::new(
        1.into(),
        2.into(),
        vec![hpack::Header::new(":path", "/feed.xml")],
    );

    let mut buf = BytesMut::new();
    frame.encode(&mut encoder, &mut buf);

    let mut parsed = match reparse(&buf) {
        Frame::PushPromise(parsed) => parsed,
        other => panic!("expected PUSH_PROMISE, got {:?}", other),
    };

    let fragment = parsed.take_fragment();
    parsed.load_hpack(&fragment, &mut decoder).unwrap();

    assert_eq!(parsed, frame);
}

#[test]
fn priority_round_trip() {
    let frame = frame::Priority::new(9.into(), StreamDependency::new(7.into(), 15, false));

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::Priority(frame), &buf);
}

#[test]
fn reset_round_trip() {
    let frame = frame::Reset::new(3.into(), frame::Reason::CANCEL);

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::Reset(frame), &buf);
}

#[test]
fn settings_round_trip() {
    let mut set = frame::SettingSet::default();
    set.set_header_table_size(Some(8_192));
    set.set_enable_push(Some(0));
    set.set_initial_window_size(Some(131_070));
    set.set_max_frame_size(Some(32_768));

    let frame = frame::Settings::new(set);

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::Settings(frame), &buf);
}

#[test]
fn settings_ack_round_trip() {
    let frame = frame::Settings::ack();

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_eq!(&buf[..], &[0x00, 0x00, 0x00, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00]);
    assert_round_trip(Frame::Settings(frame), &buf);
}

#[test]
fn ping_round_trip() {
    let frame = frame::Ping::pong([0xde, 0xad, 0xbe, 0xef, 0x00, 0x11, 0x22, 0x33]);

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::Ping(frame), &buf);
}

#[test]
fn go_away_round_trip() {
    let frame = frame::GoAway::new(
        7.into(),
        frame::Reason::ENHANCE_YOUR_CALM,
        Bytes::from_static(b"slow down"),
    );

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::GoAway(frame), &buf);
}

#[test]
fn window_update_round_trip() {
    let frame = frame::WindowUpdate::new(0.into(), 123_456);

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::WindowUpdate(frame), &buf);
}

#[test]
fn continuation_round_trip() {
    let frame = frame::Continuation::new(5.into(), Bytes::from_static(&[0x82, 0x86]), true);

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::Continuation(frame), &buf);
}

#[test]
fn unknown_round_trip() {
    let frame = frame::Unknown::new(0xaf, 0x03, 9.into(), Bytes::from_static(&[1, 2, 3]));

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    assert_round_trip(Frame::Unknown(frame), &buf);
}

#[test]
fn reserved_stream_id_bit_is_masked() {
    // DATA frame with the R bit set on the stream identifier.
    let wire = [
        0x00, 0x00, 0x01, 0x00, 0x00, 0x80, 0x00, 0x00, 0x03, 0xff,
    ];

    match reparse(&wire) {
        Frame::Data(frame) => assert_eq!(frame.stream_id(), 3),
        other => panic!("expected DATA, got {:?}", other),
    }
}

#[test]
fn stream_id_round_trips_as_zero_top_bit() {
    let frame = frame::Data::new(StreamId::max(), Bytes::from_static(b"x"), false);

    let mut buf = BytesMut::new();
    frame.encode(&mut buf);

    // Top bit of the stream id word stays clear.
    assert_eq!(buf[5] & 0x80, 0);
    assert_round_trip(Frame::Data(frame), &buf);
}
