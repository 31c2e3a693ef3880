use codec::{Parser, RecvError};
use error::SendError;
use frame::{self, Frame, Kind, Reason, SettingSet, StreamDependency, StreamId};
use frame::DEFAULT_INITIAL_WINDOW_SIZE;
use hpack;
use proto::{framing, FlowControl, Settings, WindowSize};
use proto::stream::Stream;

use bytes::{Bytes, BytesMut};
use fnv::FnvHasher;
use ordermap::OrderMap;

use std::cmp;
use std::collections::VecDeque;
use std::hash::BuildHasherDefault;

/// The caller-facing event surface.
///
/// Delivered synchronously from within `feed_bytes` and the `send_*` calls.
/// Implementations must not re-enter the connection.
pub trait Handler {
    /// A complete inbound frame. Header-opening frames are delivered exactly
    /// once, after their final END_HEADERS, with the header list populated.
    fn on_frame(&mut self, frame: &Frame) {
        let _ = frame;
    }

    /// The peer acknowledged our SETTINGS.
    fn on_settings_ack(&mut self) {}

    /// The peer answered one of our PINGs.
    fn on_ping_ack(&mut self, frame: &frame::Ping) {
        let _ = frame;
    }

    /// The peer is going away.
    fn on_goaway(&mut self, frame: &frame::GoAway) {
        let _ = frame;
    }

    /// Wire bytes ready for the transport.
    fn on_send_bytes(&mut self, bytes: Bytes) {
        let _ = bytes;
    }
}

/// Which end of the connection we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// Connection construction parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial local settings, taken as already advertised. The caller is
    /// responsible for actually transmitting them via `send_settings`.
    pub settings: SettingSet,

    /// Cap on a single decoded header string, defending against
    /// decompression bombs.
    pub max_string_len: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            settings: SettingSet::default(),
            max_string_len: 64 * 1024,
        }
    }
}

type StreamMap = OrderMap<StreamId, Stream, BuildHasherDefault<FnvHasher>>;

/// An HTTP/2 connection: settings, streams, flow control, continuation
/// assembly, and directive emission. Owns both HPACK codecs for its whole
/// lifetime.
#[derive(Debug)]
pub struct Connection {
    role: Role,

    /// Settings we advertise; govern what the peer may send us.
    local_settings: Settings,

    /// Settings the peer advertised; govern what we may send.
    remote_settings: Settings,

    /// Local settings sent but not yet acknowledged, oldest first.
    pending_local: VecDeque<SettingSet>,

    streams: StreamMap,

    /// Next identifier available to this endpoint.
    next_stream_id: StreamId,

    /// Largest peer-initiated identifier seen so far.
    last_remote_id: StreamId,

    /// Connection-level windows; never resized by SETTINGS.
    send_flow: FlowControl,
    recv_flow: FlowControl,

    going_away: bool,

    /// Set once we emit GOAWAY for a connection error; inbound processing
    /// stops for good.
    fatal: Option<Reason>,

    parser: Parser,

    /// Pending header-block sequence. The RFC forbids interleaving, so one
    /// connection-scoped slot is sufficient.
    partial: Option<Partial>,

    hpack_decoder: hpack::Decoder,
    hpack_encoder: hpack::Encoder,
}

/// A header-opening frame awaiting its CONTINUATIONs.
#[derive(Debug)]
struct Partial {
    frame: Continuable,
    buf: BytesMut,
}

#[derive(Debug)]
enum Continuable {
    Headers(frame::Headers),
    PushPromise(frame::PushPromise),
}

// ===== impl Continuable =====

impl Continuable {
    fn stream_id(&self) -> StreamId {
        match *self {
            Continuable::Headers(ref frame) => frame.stream_id(),
            Continuable::PushPromise(ref frame) => frame.stream_id(),
        }
    }

    fn load_hpack(
        &mut self,
        src: &Bytes,
        decoder: &mut hpack::Decoder,
    ) -> Result<(), frame::Error> {
        match *self {
            Continuable::Headers(ref mut frame) => frame.load_hpack(src, decoder),
            Continuable::PushPromise(ref mut frame) => frame.load_hpack(src, decoder),
        }
    }
}

/// Where a stream identifier stands relative to the stream map and the
/// allocation watermarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// In the map and not closed.
    Active,

    /// Closed, or below a watermark: the stream existed once.
    Closed,

    /// Never seen.
    Idle,
}

// ===== impl Connection =====

impl Connection {
    /// Build a connection advertising the configured initial settings.
    ///
    /// Fails with the reason a peer would receive (PROTOCOL_ERROR or
    /// FLOW_CONTROL_ERROR) when a configured settings value is outside its
    /// RFC-defined range.
    pub fn new(role: Role, config: Config) -> Result<Connection, Reason> {
        let mut local_settings = Settings::default();
        local_settings.apply(&config.settings)?;

        let mut hpack_decoder = hpack::Decoder::new(config.max_string_len);
        hpack_decoder.set_max_size_allowed(local_settings.header_table_size() as usize);

        Ok(Connection {
            role: role,
            local_settings: local_settings,
            remote_settings: Settings::default(),
            pending_local: VecDeque::new(),
            streams: StreamMap::default(),
            next_stream_id: match role {
                Role::Client => 1.into(),
                Role::Server => 2.into(),
            },
            last_remote_id: StreamId::zero(),
            send_flow: FlowControl::new(DEFAULT_INITIAL_WINDOW_SIZE),
            recv_flow: FlowControl::new(DEFAULT_INITIAL_WINDOW_SIZE),
            going_away: false,
            fatal: None,
            parser: Parser::new(),
            partial: None,
            hpack_decoder: hpack_decoder,
            hpack_encoder: hpack::Encoder::new(),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_going_away(&self) -> bool {
        self.going_away
    }

    pub fn local_settings(&self) -> &Settings {
        &self.local_settings
    }

    pub fn remote_settings(&self) -> &Settings {
        &self.remote_settings
    }

    /// The next stream identifier this endpoint may initiate with.
    pub fn next_stream_id(&self) -> StreamId {
        self.next_stream_id
    }

    /// Remaining connection-level send window.
    pub fn send_window(&self) -> i32 {
        self.send_flow.window_size()
    }

    /// Remaining send window on the given stream, if it is live.
    pub fn stream_send_window(&self, id: StreamId) -> Option<i32> {
        self.streams.get(&id).map(|s| s.send_flow.window_size())
    }

    // ===== receive path =====

    /// Feed raw transport bytes into the connection.
    ///
    /// Returns the number of input octets accepted and, when a fault
    /// terminated the connection, the connection-level error. Input that
    /// stops mid-frame is retained and resumes on the next call.
    ///
    /// Stream-level violations are handled internally (RST_STREAM goes out,
    /// the stream closes) and do not appear in the return value. After a
    /// connection-level error, nothing further is accepted.
    pub fn feed_bytes<H: Handler>(
        &mut self,
        src: &[u8],
        handler: &mut H,
    ) -> (usize, Option<RecvError>) {
        if self.fatal.is_some() {
            trace!("refusing input; connection already errored");
            return (0, None);
        }

        self.parser.feed(src);
        let consumed = src.len();

        let error = loop {
            match self.parser.next_frame() {
                Ok(Some(frame)) => match self.recv_frame(frame, handler) {
                    Ok(()) => {}
                    Err(RecvError::Stream { id, reason }) => {
                        self.reset_stream(id, reason, handler);
                    }
                    Err(err) => break Some(err),
                },
                Ok(None) => break None,
                Err(RecvError::Stream { id, reason }) => {
                    self.reset_stream(id, reason, handler);
                }
                Err(err) => break Some(err),
            }
        };

        if let Some(RecvError::Connection(reason)) = error {
            self.fatal_error(reason, handler);
        }

        self.drop_closed_streams();

        (consumed, error)
    }

    fn recv_frame<H: Handler>(&mut self, frame: Frame, handler: &mut H) -> Result<(), RecvError> {
        // While a header block is open, only its own CONTINUATIONs may
        // arrive.
        if self.partial.is_some() {
            return self.recv_continuation(frame, handler);
        }

        match frame {
            Frame::Data(frame) => self.recv_data(frame, handler),
            Frame::Headers(frame) => self.recv_headers(frame, handler),
            Frame::Priority(frame) => self.recv_priority(frame, handler),
            Frame::Reset(frame) => self.recv_reset(frame, handler),
            Frame::Settings(frame) => self.recv_settings(frame, handler),
            Frame::PushPromise(frame) => self.recv_push_promise(frame, handler),
            Frame::Ping(frame) => self.recv_ping(frame, handler),
            Frame::GoAway(frame) => self.recv_go_away(frame, handler),
            Frame::WindowUpdate(frame) => self.recv_window_update(frame, handler),
            // A CONTINUATION without an open header block.
            Frame::Continuation(..) => Err(RecvError::Connection(Reason::PROTOCOL_ERROR)),
            Frame::Unknown(frame) => {
                trace!("discarding unknown frame; kind={}", frame.kind());
                Ok(())
            }
        }
    }

    fn recv_continuation<H: Handler>(
        &mut self,
        frame: Frame,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        let mut frame = match frame {
            Frame::Continuation(frame) => frame,
            _ => {
                debug!("non-CONTINUATION frame inside a header block");
                return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
            }
        };

        let end_headers = {
            let partial = self.partial.as_mut().expect("pending header block");

            if frame.stream_id() != partial.frame.stream_id() {
                debug!("CONTINUATION on the wrong stream");
                return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
            }

            partial.buf.extend_from_slice(&frame.take_fragment());
            frame.is_end_headers()
        };

        if !end_headers {
            return Ok(());
        }

        let mut partial = self.partial.take().expect("pending header block");
        let block = partial.buf.freeze();

        partial
            .frame
            .load_hpack(&block, &mut self.hpack_decoder)
            .map_err(RecvError::from)?;

        match partial.frame {
            Continuable::Headers(frame) => self.recv_headers_complete(frame, handler),
            Continuable::PushPromise(frame) => self.recv_push_promise_complete(frame, handler),
        }
    }

    fn recv_data<H: Handler>(
        &mut self,
        frame: frame::Data,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        let id = frame.stream_id();
        let len = frame.flow_len() as WindowSize;

        match self.classify(id) {
            Slot::Active => {}
            Slot::Closed => {
                return Err(RecvError::Stream {
                    id: id,
                    reason: Reason::STREAM_CLOSED,
                })
            }
            Slot::Idle => return Err(RecvError::Connection(Reason::PROTOCOL_ERROR)),
        }

        {
            let stream = self.streams.get_mut(&id).expect("active stream");

            if !stream.state.is_recv_open() {
                return Err(RecvError::Stream {
                    id: id,
                    reason: Reason::STREAM_CLOSED,
                });
            }

            // Both windows are charged the full payload, padding included;
            // overdraft on either one is fatal to the connection.
            if len > stream.recv_flow.available() || len > self.recv_flow.available() {
                debug!("DATA overruns the receive window; stream={:?}", id);
                return Err(RecvError::Connection(Reason::FLOW_CONTROL_ERROR));
            }

            stream.recv_flow.recv_data(len);
            self.recv_flow.recv_data(len);

            stream
                .state
                .recv_data(frame.is_end_stream())
                .map_err(|reason| RecvError::Stream { id: id, reason: reason })?;
        }

        handler.on_frame(&Frame::Data(frame));
        Ok(())
    }

    fn recv_headers<H: Handler>(
        &mut self,
        mut frame: frame::Headers,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        if frame.is_end_headers() {
            let fragment = frame.take_fragment();
            frame
                .load_hpack(&fragment, &mut self.hpack_decoder)
                .map_err(RecvError::from)?;

            return self.recv_headers_complete(frame, handler);
        }

        let fragment = frame.take_fragment();
        let mut buf = BytesMut::with_capacity(fragment.len());
        buf.extend_from_slice(&fragment);

        self.partial = Some(Partial {
            frame: Continuable::Headers(frame),
            buf: buf,
        });

        Ok(())
    }

    fn recv_headers_complete<H: Handler>(
        &mut self,
        frame: frame::Headers,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        let id = frame.stream_id();
        let eos = frame.is_end_stream();

        match self.classify(id) {
            Slot::Active => {
                let stream = self.streams.get_mut(&id).expect("active stream");
                stream
                    .state
                    .recv_headers(eos)
                    .map_err(|reason| RecvError::Stream { id: id, reason: reason })?;
            }
            Slot::Closed => {
                return Err(RecvError::Stream {
                    id: id,
                    reason: Reason::STREAM_CLOSED,
                })
            }
            Slot::Idle => {
                // Only a server sees peers opening streams with HEADERS,
                // and only with odd, increasing identifiers.
                let acceptable = self.role == Role::Server && id.is_client_initiated();

                if !acceptable {
                    debug!("HEADERS on an idle stream we cannot accept; id={:?}", id);
                    return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
                }

                // The identifier is consumed even if the stream is refused
                // below.
                self.last_remote_id = id;

                if self.going_away {
                    return Err(RecvError::Stream {
                        id: id,
                        reason: Reason::REFUSED_STREAM,
                    });
                }

                if let Some(max) = self.local_settings.max_concurrent_streams() {
                    if self.active_streams(false) >= max as usize {
                        return Err(RecvError::Stream {
                            id: id,
                            reason: Reason::REFUSED_STREAM,
                        });
                    }
                }

                let mut stream = Stream::new(
                    self.remote_settings.initial_window_size(),
                    self.local_settings.initial_window_size(),
                );

                stream
                    .state
                    .recv_headers(eos)
                    .map_err(|reason| RecvError::Stream { id: id, reason: reason })?;

                self.streams.insert(id, stream);
            }
        }

        handler.on_frame(&Frame::Headers(frame));
        Ok(())
    }

    fn recv_priority<H: Handler>(
        &mut self,
        frame: frame::Priority,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        // Permitted in every stream state; the dependency data itself is
        // not acted upon.
        handler.on_frame(&Frame::Priority(frame));
        Ok(())
    }

    fn recv_reset<H: Handler>(
        &mut self,
        frame: frame::Reset,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        let id = frame.stream_id();

        match self.classify(id) {
            Slot::Active => {
                {
                    let stream = self.streams.get_mut(&id).expect("active stream");
                    stream.state.recv_reset(frame.reason());
                }
                handler.on_frame(&Frame::Reset(frame));
                Ok(())
            }
            // RST_STREAM for unknown or finished streams is noise.
            Slot::Closed | Slot::Idle => {
                trace!("ignoring RST_STREAM; id={:?}", id);
                Ok(())
            }
        }
    }

    fn recv_settings<H: Handler>(
        &mut self,
        frame: frame::Settings,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        if frame.is_ack() {
            match self.pending_local.pop_front() {
                Some(set) => self.apply_local_settings(&set, handler),
                None => debug!("SETTINGS ACK with nothing pending"),
            }

            handler.on_frame(&Frame::Settings(frame));
            handler.on_settings_ack();
            return Ok(());
        }

        let old_initial = self.remote_settings.initial_window_size();

        self.remote_settings
            .apply(frame.values())
            .map_err(RecvError::Connection)?;

        if let Some(val) = frame.values().header_table_size() {
            // The peer's advertised limit caps our encoder; a size update
            // goes out at the head of the next block.
            self.hpack_encoder.update_max_size(val as usize);
        }

        if let Some(val) = frame.values().max_frame_size() {
            self.parser.set_max_frame_size(val);
        }

        // A change to the peer's initial window shifts every live stream's
        // send window by the delta.
        let delta = self.remote_settings.initial_window_size() as i64 - old_initial as i64;

        if delta != 0 {
            let mut broken = vec![];

            for (&id, stream) in self.streams.iter_mut() {
                if stream.state.is_idle() || stream.state.is_closed() {
                    continue;
                }

                if stream.send_flow.adjust(delta).is_err() {
                    broken.push(id);
                }
            }

            for id in broken {
                self.reset_stream(id, Reason::FLOW_CONTROL_ERROR, handler);
            }
        }

        handler.on_frame(&Frame::Settings(frame));

        // Acknowledge.
        let mut buf = BytesMut::new();
        frame::Settings::ack().encode(&mut buf);
        handler.on_send_bytes(buf.freeze());

        Ok(())
    }

    /// A peer ACK makes our previously sent settings take effect.
    fn apply_local_settings<H: Handler>(&mut self, set: &SettingSet, handler: &mut H) {
        if let Some(val) = set.header_table_size() {
            self.hpack_decoder.set_max_size_allowed(val as usize);
        }

        let old_initial = self.local_settings.initial_window_size();

        if self.local_settings.apply(set).is_err() {
            // Validated when queued; nothing to do beyond dropping it.
            debug!("pending local settings no longer valid");
            return;
        }

        let delta = self.local_settings.initial_window_size() as i64 - old_initial as i64;

        if delta != 0 {
            let mut broken = vec![];

            for (&id, stream) in self.streams.iter_mut() {
                if stream.state.is_idle() || stream.state.is_closed() {
                    continue;
                }

                if stream.recv_flow.adjust(delta).is_err() {
                    broken.push(id);
                }
            }

            for id in broken {
                self.reset_stream(id, Reason::FLOW_CONTROL_ERROR, handler);
            }
        }
    }

    fn recv_push_promise<H: Handler>(
        &mut self,
        mut frame: frame::PushPromise,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        if self.role == Role::Server {
            debug!("server received PUSH_PROMISE");
            return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
        }

        if !self.local_settings.enable_push() {
            debug!("PUSH_PROMISE with push disabled");
            return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
        }

        if frame.is_end_headers() {
            let fragment = frame.take_fragment();
            frame
                .load_hpack(&fragment, &mut self.hpack_decoder)
                .map_err(RecvError::from)?;

            return self.recv_push_promise_complete(frame, handler);
        }

        let fragment = frame.take_fragment();
        let mut buf = BytesMut::with_capacity(fragment.len());
        buf.extend_from_slice(&fragment);

        self.partial = Some(Partial {
            frame: Continuable::PushPromise(frame),
            buf: buf,
        });

        Ok(())
    }

    fn recv_push_promise_complete<H: Handler>(
        &mut self,
        frame: frame::PushPromise,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        let promised = frame.promised_id();

        // The parent stream must be live.
        match self.classify(frame.stream_id()) {
            Slot::Active => {}
            _ => {
                debug!("PUSH_PROMISE on a dead stream; id={:?}", frame.stream_id());
                return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
            }
        }

        // The promised stream must be fresh: even and above the watermark.
        if !promised.is_server_initiated() || self.classify(promised) != Slot::Idle {
            debug!("unacceptable promised stream; id={:?}", promised);
            return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
        }

        let mut stream = Stream::new(
            self.remote_settings.initial_window_size(),
            self.local_settings.initial_window_size(),
        );

        stream
            .state
            .recv_reserve()
            .map_err(RecvError::Connection)?;

        self.last_remote_id = promised;
        self.streams.insert(promised, stream);

        handler.on_frame(&Frame::PushPromise(frame));
        Ok(())
    }

    fn recv_ping<H: Handler>(
        &mut self,
        frame: frame::Ping,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        handler.on_frame(&Frame::Ping(frame));

        if frame.is_ack() {
            handler.on_ping_ack(&frame);
        } else {
            // Answer with the same opaque payload.
            let mut buf = BytesMut::new();
            frame::Ping::pong(frame.into_payload()).encode(&mut buf);
            handler.on_send_bytes(buf.freeze());
        }

        Ok(())
    }

    fn recv_go_away<H: Handler>(
        &mut self,
        frame: frame::GoAway,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        // New local streams are off; inbound processing continues for
        // streams at or below the peer's watermark.
        self.going_away = true;

        handler.on_frame(&Frame::GoAway(frame.clone()));
        handler.on_goaway(&frame);
        Ok(())
    }

    fn recv_window_update<H: Handler>(
        &mut self,
        frame: frame::WindowUpdate,
        handler: &mut H,
    ) -> Result<(), RecvError> {
        let id = frame.stream_id();
        let inc = frame.size_increment();

        if id.is_zero() {
            if inc == 0 {
                return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
            }

            self.send_flow.expand(inc).map_err(RecvError::Connection)?;

            handler.on_frame(&Frame::WindowUpdate(frame));
            return Ok(());
        }

        // The zero-increment check precedes stream-state validation, so a
        // bogus update still fails only its own stream.
        if inc == 0 {
            return Err(RecvError::Stream {
                id: id,
                reason: Reason::PROTOCOL_ERROR,
            });
        }

        match self.classify(id) {
            Slot::Active => {
                let stream = self.streams.get_mut(&id).expect("active stream");

                if !stream.state.can_recv_window_update() {
                    return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
                }

                stream
                    .send_flow
                    .expand(inc)
                    .map_err(|reason| RecvError::Stream { id: id, reason: reason })?;
            }
            // WINDOW_UPDATE has no business on idle or finished streams.
            Slot::Closed | Slot::Idle => {
                return Err(RecvError::Connection(Reason::PROTOCOL_ERROR));
            }
        }

        handler.on_frame(&Frame::WindowUpdate(frame));
        Ok(())
    }

    // ===== send path =====

    /// Send a SETTINGS frame. The values take effect locally once the peer
    /// acknowledges.
    pub fn send_settings<H: Handler>(
        &mut self,
        set: SettingSet,
        handler: &mut H,
    ) -> Result<(), SendError> {
        // Validate against a scratch copy; the real fold-in happens on ACK.
        let mut scratch = self.local_settings.clone();
        scratch.apply(&set).map_err(|_| SendError::InvalidSettings)?;

        let mut buf = BytesMut::new();
        frame::Settings::new(set.clone()).encode(&mut buf);
        handler.on_send_bytes(buf.freeze());

        self.pending_local.push_back(set);
        Ok(())
    }

    pub fn send_ping<H: Handler>(
        &mut self,
        payload: [u8; 8],
        ack: bool,
        handler: &mut H,
    ) -> Result<(), SendError> {
        let frame = if ack {
            frame::Ping::pong(payload)
        } else {
            frame::Ping::ping(payload)
        };

        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        handler.on_send_bytes(buf.freeze());
        Ok(())
    }

    pub fn send_goaway<H: Handler>(
        &mut self,
        last_id: StreamId,
        reason: Reason,
        debug_data: Bytes,
        handler: &mut H,
    ) -> Result<(), SendError> {
        let mut buf = BytesMut::new();
        frame::GoAway::new(last_id, reason, debug_data).encode(&mut buf);
        handler.on_send_bytes(buf.freeze());

        self.going_away = true;
        Ok(())
    }

    /// Emit a literal WINDOW_UPDATE without touching the receive-window
    /// accounting. Most callers want `release_capacity` instead.
    pub fn send_window_update<H: Handler>(
        &mut self,
        id: StreamId,
        inc: u32,
        handler: &mut H,
    ) -> Result<(), SendError> {
        if inc == 0 || inc > frame::MAX_WINDOW_SIZE {
            return Err(SendError::InvalidWindowUpdate);
        }

        if !id.is_zero() && self.classify(id) != Slot::Active {
            return Err(SendError::InactiveStreamId);
        }

        let mut buf = BytesMut::new();
        frame::WindowUpdate::new(id, inc).encode(&mut buf);
        handler.on_send_bytes(buf.freeze());
        Ok(())
    }

    /// The application consumed `inc` received octets: grow the local
    /// receive window and tell the peer.
    pub fn release_capacity<H: Handler>(
        &mut self,
        id: StreamId,
        inc: u32,
        handler: &mut H,
    ) -> Result<(), SendError> {
        if inc == 0 || inc > frame::MAX_WINDOW_SIZE {
            return Err(SendError::InvalidWindowUpdate);
        }

        if id.is_zero() {
            self.recv_flow
                .expand(inc)
                .map_err(|_| SendError::InvalidWindowUpdate)?;
        } else {
            match self.classify(id) {
                Slot::Active => {
                    let stream = self.streams.get_mut(&id).expect("active stream");
                    stream
                        .recv_flow
                        .expand(inc)
                        .map_err(|_| SendError::InvalidWindowUpdate)?;
                }
                _ => return Err(SendError::InactiveStreamId),
            }
        }

        let mut buf = BytesMut::new();
        frame::WindowUpdate::new(id, inc).encode(&mut buf);
        handler.on_send_bytes(buf.freeze());
        Ok(())
    }

    pub fn send_rst_stream<H: Handler>(
        &mut self,
        id: StreamId,
        reason: Reason,
        handler: &mut H,
    ) -> Result<(), SendError> {
        if id.is_zero() {
            return Err(SendError::InvalidStreamId);
        }

        match self.classify(id) {
            Slot::Active => {
                self.reset_stream(id, reason, handler);
                Ok(())
            }
            // Already torn down; nothing to do.
            Slot::Closed => Ok(()),
            Slot::Idle => Err(SendError::InactiveStreamId),
        }
    }

    /// Send application data, segmenting under the flow-control windows and
    /// the peer's max frame size.
    ///
    /// Returns how many octets were actually framed; short writes happen
    /// when the windows run dry mid-payload. END_STREAM travels only when
    /// the whole payload went out.
    pub fn send_data<H: Handler>(
        &mut self,
        id: StreamId,
        data: Bytes,
        end_stream: bool,
        handler: &mut H,
    ) -> Result<usize, SendError> {
        if id.is_zero() {
            return Err(SendError::InvalidStreamId);
        }

        let budget = {
            let stream = match self.streams.get(&id) {
                Some(stream) => stream,
                None => return Err(SendError::InactiveStreamId),
            };

            if !stream.state.is_send_open() {
                return Err(SendError::UnexpectedFrameType);
            }

            cmp::min(stream.send_flow.available(), self.send_flow.available()) as usize
        };

        // A bare END_STREAM travels even with both windows empty.
        if data.is_empty() {
            if !end_stream {
                return Ok(0);
            }

            let frames = framing::segment_data(id, data, end_stream, 1);
            self.emit_data(&frames, handler);

            if end_stream {
                let stream = self.streams.get_mut(&id).expect("active stream");
                stream
                    .state
                    .send_data(true)
                    .map_err(|_| SendError::UnexpectedFrameType)?;
            }

            return Ok(0);
        }

        let sendable = cmp::min(budget, data.len());

        if sendable == 0 {
            return Err(SendError::FlowControlViolation);
        }

        let all_sent = sendable == data.len();
        let chunk = data.slice_to(sendable);

        let frames = framing::segment_data(
            id,
            chunk,
            end_stream && all_sent,
            self.remote_settings.max_frame_size() as usize,
        );

        self.emit_data(&frames, handler);

        {
            let stream = self.streams.get_mut(&id).expect("active stream");
            stream.send_flow.send_data(sendable as WindowSize);

            if end_stream && all_sent {
                stream
                    .state
                    .send_data(true)
                    .map_err(|_| SendError::UnexpectedFrameType)?;
            }
        }

        self.send_flow.send_data(sendable as WindowSize);

        Ok(sendable)
    }

    fn emit_data<H: Handler>(&self, frames: &[frame::Data], handler: &mut H) {
        for frame in frames {
            let mut buf = BytesMut::new();
            frame.encode(&mut buf);
            handler.on_send_bytes(buf.freeze());
        }
    }

    /// Send a header list on a stream, opening it if necessary. Oversize
    /// blocks split into HEADERS + CONTINUATION automatically.
    pub fn send_headers<H: Handler>(
        &mut self,
        id: StreamId,
        headers: &[hpack::Header],
        end_stream: bool,
        priority: Option<StreamDependency>,
        pad_len: Option<u8>,
        handler: &mut H,
    ) -> Result<(), SendError> {
        if id.is_zero() {
            return Err(SendError::InvalidStreamId);
        }

        self.check_header_list_size(headers)?;

        match self.classify(id) {
            Slot::Active => {}
            Slot::Closed => return Err(SendError::InactiveStreamId),
            Slot::Idle => {
                // Opening a new stream: clients only, with the next odd
                // identifier.
                if self.role != Role::Client || !id.is_client_initiated()
                    || id < self.next_stream_id
                {
                    return Err(SendError::InvalidStreamId);
                }

                if self.going_away {
                    return Err(SendError::Rejected);
                }

                if let Some(max) = self.remote_settings.max_concurrent_streams() {
                    if self.active_streams(true) >= max as usize {
                        return Err(SendError::Rejected);
                    }
                }

                let stream = Stream::new(
                    self.remote_settings.initial_window_size(),
                    self.local_settings.initial_window_size(),
                );

                self.streams.insert(id, stream);

                self.next_stream_id = id;
                self.next_stream_id.increment();
            }
        }

        {
            let stream = self.streams.get_mut(&id).expect("active stream");
            stream
                .state
                .send_headers(end_stream)
                .map_err(|_| SendError::UnexpectedFrameType)?;
        }

        let sequence = framing::segment_headers(
            Kind::Headers,
            id,
            end_stream,
            pad_len,
            priority.as_ref(),
            None,
            headers,
            &mut self.hpack_encoder,
            self.remote_settings.max_frame_size() as usize,
        );

        handler.on_send_bytes(sequence.first);
        for continuation in sequence.continuations {
            handler.on_send_bytes(continuation);
        }

        Ok(())
    }

    /// Reserve `promised` and announce it on `assoc`. Servers only.
    pub fn send_push_promise<H: Handler>(
        &mut self,
        assoc: StreamId,
        promised: StreamId,
        headers: &[hpack::Header],
        pad_len: Option<u8>,
        handler: &mut H,
    ) -> Result<(), SendError> {
        if self.role != Role::Server {
            return Err(SendError::UnexpectedFrameType);
        }

        if self.going_away || !self.remote_settings.enable_push() {
            return Err(SendError::Rejected);
        }

        self.check_header_list_size(headers)?;

        if self.classify(assoc) != Slot::Active {
            return Err(SendError::InactiveStreamId);
        }

        if !promised.is_server_initiated() || promised < self.next_stream_id {
            return Err(SendError::InvalidStreamId);
        }

        let mut stream = Stream::new(
            self.remote_settings.initial_window_size(),
            self.local_settings.initial_window_size(),
        );

        stream
            .state
            .send_reserve()
            .map_err(|_| SendError::UnexpectedFrameType)?;

        self.streams.insert(promised, stream);

        self.next_stream_id = promised;
        self.next_stream_id.increment();

        let sequence = framing::segment_headers(
            Kind::PushPromise,
            assoc,
            false,
            pad_len,
            None,
            Some(promised),
            headers,
            &mut self.hpack_encoder,
            self.remote_settings.max_frame_size() as usize,
        );

        handler.on_send_bytes(sequence.first);
        for continuation in sequence.continuations {
            handler.on_send_bytes(continuation);
        }

        Ok(())
    }

    pub fn send_priority<H: Handler>(
        &mut self,
        id: StreamId,
        dependency: StreamDependency,
        handler: &mut H,
    ) -> Result<(), SendError> {
        if id.is_zero() || dependency.dependency_id == id {
            return Err(SendError::InvalidStreamId);
        }

        let mut buf = BytesMut::new();
        frame::Priority::new(id, dependency).encode(&mut buf);
        handler.on_send_bytes(buf.freeze());
        Ok(())
    }

    // ===== plumbing =====

    /// Terminate one stream: RST_STREAM goes out, the local state closes.
    fn reset_stream<H: Handler>(&mut self, id: StreamId, reason: Reason, handler: &mut H) {
        debug!("resetting stream; id={:?} reason={:?}", id, reason);

        if let Some(stream) = self.streams.get_mut(&id) {
            stream.state.send_reset(reason);
        }

        let mut buf = BytesMut::new();
        frame::Reset::new(id, reason).encode(&mut buf);
        handler.on_send_bytes(buf.freeze());
    }

    /// Terminate the connection: GOAWAY goes out, input is refused from
    /// here on.
    fn fatal_error<H: Handler>(&mut self, reason: Reason, handler: &mut H) {
        debug!("connection error; reason={:?}", reason);

        let mut buf = BytesMut::new();
        frame::GoAway::new(self.last_remote_id, reason, Bytes::new()).encode(&mut buf);
        handler.on_send_bytes(buf.freeze());

        self.going_away = true;
        self.fatal = Some(reason);
        self.partial = None;
    }

    fn check_header_list_size(&self, headers: &[hpack::Header]) -> Result<(), SendError> {
        if let Some(max) = self.remote_settings.max_header_list_size() {
            let size: usize = headers.iter().map(|h| h.len()).sum();

            if size > max as usize {
                return Err(SendError::HeaderListTooBig);
            }
        }

        Ok(())
    }

    /// Does this identifier belong to streams we initiate?
    fn is_local_parity(&self, id: StreamId) -> bool {
        match self.role {
            Role::Client => id.is_client_initiated(),
            Role::Server => id.is_server_initiated(),
        }
    }

    fn classify(&self, id: StreamId) -> Slot {
        if let Some(stream) = self.streams.get(&id) {
            return if stream.state.is_closed() {
                Slot::Closed
            } else {
                Slot::Active
            };
        }

        // Not in the map: the watermarks tell recycled identifiers apart
        // from genuinely idle ones.
        let seen = if self.is_local_parity(id) {
            id < self.next_stream_id
        } else {
            id <= self.last_remote_id
        };

        if seen {
            Slot::Closed
        } else {
            Slot::Idle
        }
    }

    /// Streams currently counting against a concurrency limit, for one
    /// initiator.
    fn active_streams(&self, local: bool) -> usize {
        self.streams
            .iter()
            .filter(|&(&id, stream)| {
                stream.state.is_counted() && self.is_local_parity(id) == local
            })
            .count()
    }

    fn drop_closed_streams(&mut self) {
        let closed: Vec<StreamId> = self.streams
            .iter()
            .filter(|&(_, stream)| stream.state.is_closed())
            .map(|(&id, _)| id)
            .collect();

        for id in closed {
            trace!("dropping closed stream; id={:?}", id);
            self.streams.remove(&id);
        }
    }
}
