//! The connection engine.
//!
//! `Connection` applies settings, tracks per-stream lifecycle, enforces
//! ordering constraints, maintains the two-level flow-control windows, and
//! produces directives (ACKs, RST_STREAM, GOAWAY) in response to received
//! frames. It is driven entirely by `feed_bytes` and the `send_*` API; all
//! output leaves through `Handler::on_send_bytes`.

mod connection;
mod flow_control;
mod settings;
mod state;
mod stream;

pub mod framing;

pub use self::connection::{Config, Connection, Handler, Role};
pub use self::flow_control::FlowControl;
pub use self::settings::Settings;
pub use self::state::State;

pub type WindowSize = u32;
