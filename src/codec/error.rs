use frame::{self, Reason, StreamId};
use hpack;

use std::{error, fmt};

/// Errors surfaced by the receive path, at one of the two RFC 7540
/// granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// A fault that terminates the whole connection: the engine emits
    /// GOAWAY and refuses further inbound frames.
    Connection(Reason),

    /// A fault that terminates exactly one stream via RST_STREAM; the
    /// connection continues.
    Stream { id: StreamId, reason: Reason },
}

// ===== impl RecvError =====

impl RecvError {
    pub fn reason(&self) -> Reason {
        match *self {
            RecvError::Connection(reason) => reason,
            RecvError::Stream { reason, .. } => reason,
        }
    }
}

impl From<frame::Error> for RecvError {
    fn from(src: frame::Error) -> RecvError {
        use frame::Error::*;

        match src {
            // Wrong fixed-size payloads and malformed settings lengths.
            BadFrameSize | PartialSettingLength | InvalidPayloadAckSettings => {
                RecvError::Connection(Reason::FRAME_SIZE_ERROR)
            }
            TooMuchPadding | InvalidStreamId | InvalidDependencyId => {
                RecvError::Connection(Reason::PROTOCOL_ERROR)
            }
            Hpack(_) => RecvError::Connection(Reason::COMPRESSION_ERROR),
        }
    }
}

impl From<hpack::DecoderError> for RecvError {
    fn from(_: hpack::DecoderError) -> RecvError {
        // Every HPACK fault compromises the shared compression context.
        RecvError::Connection(Reason::COMPRESSION_ERROR)
    }
}

impl fmt::Display for RecvError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RecvError::Connection(reason) => {
                write!(fmt, "connection error: {}", reason)
            }
            RecvError::Stream { id, reason } => {
                write!(fmt, "stream error on {:?}: {}", id, reason)
            }
        }
    }
}

impl error::Error for RecvError {
    fn description(&self) -> &str {
        match *self {
            RecvError::Connection(ref reason) => reason.description(),
            RecvError::Stream { ref reason, .. } => reason.description(),
        }
    }
}
