use frame::Reason;

use self::Inner::*;

/// The state of an HTTP/2 stream.
///
/// ```not_rust
///                              +--------+
///                      send PP |        | recv PP
///                     ,--------|  idle  |--------.
///                    /         |        |         \
///                   v          +--------+          v
///            +----------+          |           +----------+
///            |          |          | send H /  |          |
///     ,------| reserved |          | recv H    | reserved |------.
///     |      | (local)  |          |           | (remote) |      |
///     |      +----------+          v           +----------+      |
///     |          |             +--------+             |          |
///     |          |     recv ES |        | send ES     |          |
///     |   send H |     ,-------|  open  |-------.     | recv H   |
///     |          |    /        |        |        \    |          |
///     |          v   v         +--------+         v   v          |
///     |      +----------+          |           +----------+      |
///     |      |   half   |          |           |   half   |      |
///     |      |  closed  |          | send R /  |  closed  |      |
///     |      | (remote) |          | recv R    | (local)  |      |
///     |      +----------+          |           +----------+      |
///     |           |                |                 |           |
///     |           | send ES /      |       recv ES / |           |
///     |           | send R /       v        send R / |           |
///     |           | recv R     +--------+   recv R   |           |
///     | send R /  `----------->|        |<-----------'  send R / |
///     | recv R                 | closed |               recv R   |
///     `----------------------->|        |<----------------------'
///                              +--------+
///
///        send:   this endpoint sends the frame
///        recv:   this endpoint receives the frame
///
///        H:  HEADERS frame (with implied CONTINUATIONs)
///        PP: PUSH_PROMISE frame (with implied CONTINUATIONs)
///        ES: END_STREAM flag
///        R:  RST_STREAM frame
/// ```
#[derive(Debug, Clone, Copy)]
pub struct State {
    inner: Inner,
}

#[derive(Debug, Clone, Copy)]
enum Inner {
    Idle,
    ReservedLocal,
    ReservedRemote,
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed(Option<Reason>),
}

impl State {
    /// Reserve the stream for a PUSH_PROMISE we are sending.
    pub fn send_reserve(&mut self) -> Result<(), Reason> {
        match self.inner {
            Idle => {
                self.inner = ReservedLocal;
                Ok(())
            }
            _ => Err(Reason::PROTOCOL_ERROR),
        }
    }

    /// Reserve the stream for a received PUSH_PROMISE.
    pub fn recv_reserve(&mut self) -> Result<(), Reason> {
        match self.inner {
            Idle => {
                self.inner = ReservedRemote;
                Ok(())
            }
            _ => Err(Reason::PROTOCOL_ERROR),
        }
    }

    /// Transition on a HEADERS frame we are sending.
    pub fn send_headers(&mut self, eos: bool) -> Result<(), Reason> {
        self.inner = match self.inner {
            Idle => {
                if eos {
                    HalfClosedLocal
                } else {
                    Open
                }
            }
            ReservedLocal => {
                if eos {
                    Closed(None)
                } else {
                    HalfClosedRemote
                }
            }
            // Trailers on an established stream.
            Open => {
                if eos {
                    HalfClosedLocal
                } else {
                    Open
                }
            }
            HalfClosedRemote => {
                if eos {
                    Closed(None)
                } else {
                    HalfClosedRemote
                }
            }
            _ => return Err(Reason::PROTOCOL_ERROR),
        };

        Ok(())
    }

    /// Transition on a received HEADERS frame.
    pub fn recv_headers(&mut self, eos: bool) -> Result<(), Reason> {
        self.inner = match self.inner {
            Idle => {
                if eos {
                    HalfClosedRemote
                } else {
                    Open
                }
            }
            ReservedRemote => {
                if eos {
                    Closed(None)
                } else {
                    HalfClosedLocal
                }
            }
            Open => {
                if eos {
                    HalfClosedRemote
                } else {
                    Open
                }
            }
            HalfClosedLocal => {
                if eos {
                    Closed(None)
                } else {
                    HalfClosedLocal
                }
            }
            // The peer already closed its half.
            HalfClosedRemote | Closed(..) => return Err(Reason::STREAM_CLOSED),
            ReservedLocal => return Err(Reason::PROTOCOL_ERROR),
        };

        Ok(())
    }

    pub fn send_data(&mut self, eos: bool) -> Result<(), Reason> {
        self.inner = match self.inner {
            Open => {
                if eos {
                    HalfClosedLocal
                } else {
                    Open
                }
            }
            HalfClosedRemote => {
                if eos {
                    Closed(None)
                } else {
                    HalfClosedRemote
                }
            }
            _ => return Err(Reason::PROTOCOL_ERROR),
        };

        Ok(())
    }

    pub fn recv_data(&mut self, eos: bool) -> Result<(), Reason> {
        self.inner = match self.inner {
            Open => {
                if eos {
                    HalfClosedRemote
                } else {
                    Open
                }
            }
            HalfClosedLocal => {
                if eos {
                    Closed(None)
                } else {
                    HalfClosedLocal
                }
            }
            _ => return Err(Reason::STREAM_CLOSED),
        };

        Ok(())
    }

    pub fn send_reset(&mut self, reason: Reason) {
        trace!("send_reset: {:?} => Closed", self.inner);
        self.inner = Closed(Some(reason));
    }

    pub fn recv_reset(&mut self, reason: Reason) {
        trace!("recv_reset: {:?} => Closed", self.inner);
        self.inner = Closed(Some(reason));
    }

    pub fn is_idle(&self) -> bool {
        match self.inner {
            Idle => true,
            _ => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        match self.inner {
            Closed(..) => true,
            _ => false,
        }
    }

    /// The peer may still send us data.
    pub fn is_recv_open(&self) -> bool {
        match self.inner {
            Open | HalfClosedLocal => true,
            _ => false,
        }
    }

    /// We may still send data.
    pub fn is_send_open(&self) -> bool {
        match self.inner {
            Open | HalfClosedRemote => true,
            _ => false,
        }
    }

    /// WINDOW_UPDATE is acceptable only while our sending half is live.
    pub fn can_recv_window_update(&self) -> bool {
        self.is_send_open()
    }

    /// Whether the stream counts against the concurrency limit: reserved
    /// and idle streams do not.
    pub fn is_counted(&self) -> bool {
        match self.inner {
            Open | HalfClosedLocal | HalfClosedRemote => true,
            _ => false,
        }
    }
}

impl Default for State {
    fn default() -> State {
        State { inner: Inner::Idle }
    }
}
