use frame::{util, Error, Frame, Head, Kind, StreamId};
use frame::priority::StreamDependency;
use hpack;

use bytes::{BufMut, Bytes, BytesMut, BigEndian};

use std::mem;

/// A HEADERS frame.
///
/// On the receive path the frame first carries its raw header-block fragment;
/// the decoded header list is attached once the block is complete (either
/// immediately, when END_HEADERS is set, or after the closing CONTINUATION).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    /// The ID of the stream with which this frame is associated.
    stream_id: StreamId,

    /// The stream dependency information, if any.
    stream_dep: Option<StreamDependency>,

    /// The decoded header list.
    headers: Vec<hpack::Header>,

    /// The raw header-block fragment, drained once decoded.
    fragment: Bytes,

    pad_len: Option<u8>,

    flags: HeadersFlag,
}

/// A PUSH_PROMISE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPromise {
    /// The ID of the stream this promise arrived on.
    stream_id: StreamId,

    /// The ID of the stream being reserved.
    promised_id: StreamId,

    headers: Vec<hpack::Header>,

    fragment: Bytes,

    pad_len: Option<u8>,

    flags: HeadersFlag,
}

/// A CONTINUATION frame: nothing but a header-block fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    stream_id: StreamId,
    fragment: Bytes,
    end_headers: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct HeadersFlag(u8);

const END_STREAM: u8 = 0x1;
const END_HEADERS: u8 = 0x4;
const PADDED: u8 = 0x8;
const PRIORITY: u8 = 0x20;
const ALL: u8 = END_STREAM
              | END_HEADERS
              | PADDED
              | PRIORITY;

// PUSH_PROMISE carries no END_STREAM or PRIORITY.
const PUSH_PROMISE_ALL: u8 = END_HEADERS | PADDED;

// ===== impl Headers =====

impl Headers {
    /// Build a HEADERS frame for the send path. END_HEADERS is set; the
    /// outbound segmentation helper clears it when the block is split.
    pub fn new(stream_id: StreamId, headers: Vec<hpack::Header>, eos: bool) -> Headers {
        let mut flags = HeadersFlag(END_HEADERS);

        if eos {
            flags.set_end_stream();
        }

        Headers {
            stream_id: stream_id,
            stream_dep: None,
            headers: headers,
            fragment: Bytes::new(),
            pad_len: None,
            flags: flags,
        }
    }

    pub fn set_stream_dependency(&mut self, dep: StreamDependency) {
        self.stream_dep = Some(dep);
        self.flags.set_priority();
    }

    pub fn load(head: Head, mut payload: Bytes) -> Result<Headers, Error> {
        debug_assert_eq!(head.kind(), Kind::Headers);

        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        let flags = HeadersFlag::load(head.flag());

        let pad_len = if flags.is_padded() {
            Some(util::strip_padding(&mut payload)?)
        } else {
            None
        };

        let stream_dep = if flags.is_priority() {
            if payload.len() < 5 {
                return Err(Error::BadFrameSize);
            }

            let dep = StreamDependency::load(&payload[..5])?;

            if dep.dependency_id == head.stream_id() {
                // A stream cannot depend on itself.
                return Err(Error::InvalidDependencyId);
            }

            let _ = payload.split_to(5);
            Some(dep)
        } else {
            None
        };

        Ok(Headers {
            stream_id: head.stream_id(),
            stream_dep: stream_dep,
            headers: vec![],
            fragment: payload,
            pad_len: pad_len,
            flags: flags,
        })
    }

    /// Decode a complete header block into this frame's header list.
    pub fn load_hpack(
        &mut self,
        src: &Bytes,
        decoder: &mut hpack::Decoder,
    ) -> Result<(), Error> {
        let headers = &mut self.headers;
        decoder.decode(src, |h| headers.push(h)).map_err(Error::Hpack)?;
        self.fragment = Bytes::new();
        Ok(())
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn is_end_headers(&self) -> bool {
        self.flags.is_end_headers()
    }

    pub fn is_end_stream(&self) -> bool {
        self.flags.is_end_stream()
    }

    pub fn stream_dependency(&self) -> Option<&StreamDependency> {
        self.stream_dep.as_ref()
    }

    pub fn headers(&self) -> &[hpack::Header] {
        &self.headers
    }

    pub fn into_headers(self) -> Vec<hpack::Header> {
        self.headers
    }

    pub fn take_fragment(&mut self) -> Bytes {
        mem::replace(&mut self.fragment, Bytes::new())
    }

    /// Serialize as a single frame. The caller is responsible for ensuring
    /// the encoded block fits the peer's max frame size; oversize blocks go
    /// through the outbound segmentation helper instead.
    pub fn encode(&self, encoder: &mut hpack::Encoder, dst: &mut BytesMut) {
        let mut payload = BytesMut::new();

        if let Some(pad_len) = self.pad_len {
            payload.reserve(1);
            payload.put_u8(pad_len);
        }

        if let Some(ref dep) = self.stream_dep {
            payload.reserve(5);
            dep.encode(&mut payload);
        }

        encoder.encode(&self.headers, &mut payload);

        let padding = self.pad_len.unwrap_or(0) as usize;
        payload.reserve(padding);

        for _ in 0..padding {
            payload.put_u8(0);
        }

        trace!("encoding HEADERS; len={}", payload.len());

        let head = Head::new(Kind::Headers, self.flags.into(), self.stream_id);
        dst.reserve(super::HEADER_LEN + payload.len());
        head.encode(payload.len(), dst);
        dst.put_slice(&payload);
    }
}

impl From<Headers> for Frame {
    fn from(src: Headers) -> Frame {
        Frame::Headers(src)
    }
}

// ===== impl PushPromise =====

impl PushPromise {
    pub fn new(
        stream_id: StreamId,
        promised_id: StreamId,
        headers: Vec<hpack::Header>,
    ) -> PushPromise {
        PushPromise {
            stream_id: stream_id,
            promised_id: promised_id,
            headers: headers,
            fragment: Bytes::new(),
            pad_len: None,
            flags: HeadersFlag(END_HEADERS),
        }
    }

    pub fn load(head: Head, mut payload: Bytes) -> Result<PushPromise, Error> {
        debug_assert_eq!(head.kind(), Kind::PushPromise);

        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        let flags = HeadersFlag::load(head.flag() & PUSH_PROMISE_ALL);

        let pad_len = if flags.is_padded() {
            Some(util::strip_padding(&mut payload)?)
        } else {
            None
        };

        if payload.len() < 4 {
            return Err(Error::BadFrameSize);
        }

        // Promised stream id, R bit masked.
        let promised_id = StreamId::parse(&payload[..4]);
        let _ = payload.split_to(4);

        Ok(PushPromise {
            stream_id: head.stream_id(),
            promised_id: promised_id,
            headers: vec![],
            fragment: payload,
            pad_len: pad_len,
            flags: flags,
        })
    }

    pub fn load_hpack(
        &mut self,
        src: &Bytes,
        decoder: &mut hpack::Decoder,
    ) -> Result<(), Error> {
        let headers = &mut self.headers;
        decoder.decode(src, |h| headers.push(h)).map_err(Error::Hpack)?;
        self.fragment = Bytes::new();
        Ok(())
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn promised_id(&self) -> StreamId {
        self.promised_id
    }

    pub fn is_end_headers(&self) -> bool {
        self.flags.is_end_headers()
    }

    pub fn headers(&self) -> &[hpack::Header] {
        &self.headers
    }

    pub fn into_headers(self) -> Vec<hpack::Header> {
        self.headers
    }

    pub fn take_fragment(&mut self) -> Bytes {
        mem::replace(&mut self.fragment, Bytes::new())
    }

    pub fn encode(&self, encoder: &mut hpack::Encoder, dst: &mut BytesMut) {
        let mut payload = BytesMut::new();

        if let Some(pad_len) = self.pad_len {
            payload.reserve(1);
            payload.put_u8(pad_len);
        }

        payload.reserve(4);
        payload.put_u32::<BigEndian>(self.promised_id.into());

        encoder.encode(&self.headers, &mut payload);

        let padding = self.pad_len.unwrap_or(0) as usize;
        payload.reserve(padding);

        for _ in 0..padding {
            payload.put_u8(0);
        }

        trace!("encoding PUSH_PROMISE; len={}", payload.len());

        let head = Head::new(Kind::PushPromise, self.flags.into(), self.stream_id);
        dst.reserve(super::HEADER_LEN + payload.len());
        head.encode(payload.len(), dst);
        dst.put_slice(&payload);
    }
}

impl From<PushPromise> for Frame {
    fn from(src: PushPromise) -> Frame {
        Frame::PushPromise(src)
    }
}

// ===== impl Continuation =====

impl Continuation {
    pub fn new(stream_id: StreamId, fragment: Bytes, end_headers: bool) -> Continuation {
        Continuation {
            stream_id: stream_id,
            fragment: fragment,
            end_headers: end_headers,
        }
    }

    pub fn load(head: Head, payload: Bytes) -> Result<Continuation, Error> {
        debug_assert_eq!(head.kind(), Kind::Continuation);

        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        Ok(Continuation {
            stream_id: head.stream_id(),
            fragment: payload,
            end_headers: head.flag() & END_HEADERS == END_HEADERS,
        })
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn is_end_headers(&self) -> bool {
        self.end_headers
    }

    pub fn take_fragment(&mut self) -> Bytes {
        mem::replace(&mut self.fragment, Bytes::new())
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        trace!("encoding CONTINUATION; len={}", self.fragment.len());

        let flags = if self.end_headers { END_HEADERS } else { 0 };
        let head = Head::new(Kind::Continuation, flags, self.stream_id);

        dst.reserve(super::HEADER_LEN + self.fragment.len());
        head.encode(self.fragment.len(), dst);
        dst.put_slice(&self.fragment);
    }
}

impl From<Continuation> for Frame {
    fn from(src: Continuation) -> Frame {
        Frame::Continuation(src)
    }
}

// ===== impl HeadersFlag =====

impl HeadersFlag {
    pub fn load(bits: u8) -> HeadersFlag {
        HeadersFlag(bits & ALL)
    }

    pub fn is_end_stream(&self) -> bool {
        self.0 & END_STREAM == END_STREAM
    }

    pub fn set_end_stream(&mut self) {
        self.0 |= END_STREAM;
    }

    pub fn is_end_headers(&self) -> bool {
        self.0 & END_HEADERS == END_HEADERS
    }

    pub fn is_padded(&self) -> bool {
        self.0 & PADDED == PADDED
    }

    pub fn is_priority(&self) -> bool {
        self.0 & PRIORITY == PRIORITY
    }

    fn set_priority(&mut self) {
        self.0 |= PRIORITY;
    }
}

impl From<HeadersFlag> for u8 {
    fn from(src: HeadersFlag) -> u8 {
        src.0
    }
}
