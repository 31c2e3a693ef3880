//! Outbound framing helpers.
//!
//! Pure functions: they never consult streams or windows. The engine applies
//! flow-control limits before calling them.

use frame::{self, Head, Kind, StreamDependency, StreamId};
use hpack;

use bytes::{BufMut, Bytes, BytesMut, BigEndian};

use std::cmp;

const END_STREAM: u8 = 0x1;
const END_HEADERS: u8 = 0x4;
const PADDED: u8 = 0x8;
const PRIORITY: u8 = 0x20;

/// A serialized header-block sequence: the opening HEADERS or PUSH_PROMISE
/// frame, followed by any CONTINUATION frames.
#[derive(Debug)]
pub struct HeaderSequence {
    pub first: Bytes,
    pub continuations: Vec<Bytes>,
}

/// Split application data into DATA frames no larger than the peer's max
/// frame size, carrying END_STREAM only on the final segment.
///
/// Empty input still produces a single empty frame, so that a bare
/// END_STREAM can travel.
pub fn segment_data(
    stream_id: StreamId,
    mut data: Bytes,
    end_stream: bool,
    max_frame_size: usize,
) -> Vec<frame::Data> {
    debug_assert!(max_frame_size > 0);

    if data.is_empty() {
        return vec![frame::Data::new(stream_id, data, end_stream)];
    }

    let mut frames = vec![];

    while !data.is_empty() {
        let chunk = data.split_to(cmp::min(max_frame_size, data.len()));
        let last = data.is_empty();

        frames.push(frame::Data::new(stream_id, chunk, end_stream && last));
    }

    frames
}

/// HPACK-encode a header list once and split the block into an opening
/// frame plus CONTINUATIONs, each within `max_frame_size`. END_HEADERS is
/// set on the last frame only; END_STREAM belongs to the opening frame and
/// is independent of segmentation.
///
/// `kind` selects HEADERS or PUSH_PROMISE; a PUSH_PROMISE carries
/// `promised_id` and ignores `end_stream` and `priority`.
pub fn segment_headers(
    kind: Kind,
    stream_id: StreamId,
    end_stream: bool,
    pad_len: Option<u8>,
    priority: Option<&StreamDependency>,
    promised_id: Option<StreamId>,
    headers: &[hpack::Header],
    encoder: &mut hpack::Encoder,
    max_frame_size: usize,
) -> HeaderSequence {
    debug_assert!(kind == Kind::Headers || kind == Kind::PushPromise);

    let mut block = BytesMut::new();
    encoder.encode(headers, &mut block);
    let mut block = block.freeze();

    // Fixed fields ahead of the fragment in the opening frame: at most a
    // pad length octet, a priority block, and a promised stream id.
    let mut prefix = BytesMut::with_capacity(10);
    let mut flags = 0u8;

    if let Some(n) = pad_len {
        flags |= PADDED;
        prefix.put_u8(n);
    }

    if kind == Kind::Headers {
        if end_stream {
            flags |= END_STREAM;
        }

        if let Some(dep) = priority {
            flags |= PRIORITY;
            dep.encode(&mut prefix);
        }
    }

    if let Some(id) = promised_id {
        prefix.put_u32::<BigEndian>(id.into());
    }

    let padding = pad_len.unwrap_or(0) as usize;

    // The opening frame also fits the prefix fields and trailing padding.
    debug_assert!(prefix.len() + padding < max_frame_size);
    let budget = max_frame_size - prefix.len() - padding;

    let fragment = block.split_to(cmp::min(budget, block.len()));

    if block.is_empty() {
        flags |= END_HEADERS;
    }

    let payload_len = prefix.len() + fragment.len() + padding;
    let mut first = BytesMut::with_capacity(frame::HEADER_LEN + payload_len);

    Head::new(kind, flags, stream_id).encode(payload_len, &mut first);
    first.put_slice(&prefix);
    first.put_slice(&fragment);

    for _ in 0..padding {
        first.put_u8(0);
    }

    let mut continuations = vec![];

    while !block.is_empty() {
        let fragment = block.split_to(cmp::min(max_frame_size, block.len()));
        let cont = frame::Continuation::new(stream_id, fragment, block.is_empty());

        let mut buf = BytesMut::new();
        cont.encode(&mut buf);
        continuations.push(buf.freeze());
    }

    trace!("segmented header block; continuations={}", continuations.len());

    HeaderSequence {
        first: first.freeze(),
        continuations: continuations,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hpack::Header;

    #[test]
    fn segments_data_by_frame_size() {
        let data = Bytes::from(vec![7u8; 25]);
        let frames = segment_data(1.into(), data, true, 10);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload().len(), 10);
        assert_eq!(frames[1].payload().len(), 10);
        assert_eq!(frames[2].payload().len(), 5);

        assert!(!frames[0].is_end_stream());
        assert!(!frames[1].is_end_stream());
        assert!(frames[2].is_end_stream());
    }

    #[test]
    fn empty_data_still_carries_end_stream() {
        let frames = segment_data(1.into(), Bytes::new(), true, 10);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload().len(), 0);
        assert!(frames[0].is_end_stream());
    }

    #[test]
    fn single_frame_block_sets_end_headers() {
        let mut encoder = hpack::Encoder::new();
        let headers = vec![Header::new(":method", "GET")];

        let seq = segment_headers(
            Kind::Headers,
            1.into(),
            true,
            None,
            None,
            None,
            &headers,
            &mut encoder,
            16_384,
        );

        assert!(seq.continuations.is_empty());
        // Length 1, type HEADERS, END_STREAM | END_HEADERS, stream 1, 0x82.
        assert_eq!(
            &seq.first[..],
            &[0x00, 0x00, 0x01, 0x01, 0x05, 0x00, 0x00, 0x00, 0x01, 0x82]
        );
    }

    #[test]
    fn oversize_block_spills_into_continuations() {
        let mut encoder = hpack::Encoder::new();

        // Refuses both tables, so every block is a fat literal.
        let headers: Vec<Header> = (0..40)
            .map(|i| Header::sensitive(format!("x-not-indexed-{:02}", i), vec![b'v'; 60]))
            .collect();

        let seq = segment_headers(
            Kind::Headers,
            1.into(),
            false,
            None,
            None,
            None,
            &headers,
            &mut encoder,
            1_000,
        );

        assert!(!seq.continuations.is_empty());

        // Opening frame: END_HEADERS clear, payload at the cap.
        assert_eq!(seq.first[3], 0x01);
        assert_eq!(seq.first[4] & 0x04, 0);
        assert_eq!(seq.first.len(), frame::HEADER_LEN + 1_000);

        // Every continuation is type 0x9 on the same stream; END_HEADERS on
        // the last alone.
        for (i, cont) in seq.continuations.iter().enumerate() {
            assert_eq!(cont[3], 0x09);

            let last = i == seq.continuations.len() - 1;
            assert_eq!(cont[4] & 0x04 == 0x04, last);
        }
    }
}
