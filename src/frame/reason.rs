use std::fmt;

/// An HTTP/2 error code, carried by RST_STREAM and GOAWAY frames.
///
/// The same value can terminate a single stream or the whole connection
/// depending on which frame delivers it. Codes outside the RFC-defined set
/// round-trip untouched.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Reason(u32);

macro_rules! reasons {
    ($($name:ident = $code:tt, $desc:expr;)+) => {
        impl Reason {
            $(
                pub const $name: Reason = Reason($code);
            )+

            pub fn description(&self) -> &str {
                match self.0 {
                    $(
                        $code => $desc,
                    )+
                    _ => "unknown error code",
                }
            }

            fn name(&self) -> &str {
                match self.0 {
                    $(
                        $code => stringify!($name),
                    )+
                    _ => "UNKNOWN",
                }
            }
        }
    }
}

reasons! {
    NO_ERROR = 0, "graceful shutdown";
    PROTOCOL_ERROR = 1, "protocol error detected";
    INTERNAL_ERROR = 2, "internal error encountered";
    FLOW_CONTROL_ERROR = 3, "flow-control protocol violated";
    SETTINGS_TIMEOUT = 4, "settings not acknowledged in time";
    STREAM_CLOSED = 5, "frame received for closed stream";
    FRAME_SIZE_ERROR = 6, "frame with invalid size";
    REFUSED_STREAM = 7, "stream refused before any processing";
    CANCEL = 8, "stream no longer needed";
    COMPRESSION_ERROR = 9, "header compression context compromised";
    CONNECT_ERROR = 10, "connection for a CONNECT request was reset";
    ENHANCE_YOUR_CALM = 11, "excessive load detected";
    INADEQUATE_SECURITY = 12, "transport security properties inadequate";
    HTTP11_REQUIRED = 13, "endpoint requires HTTP/1.1";
}

impl From<u32> for Reason {
    fn from(src: u32) -> Reason {
        Reason(src)
    }
}

impl From<Reason> for u32 {
    fn from(src: Reason) -> u32 {
        src.0
    }
}

impl fmt::Debug for Reason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.name())
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.description())
    }
}
