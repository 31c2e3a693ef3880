use proto::{FlowControl, State, WindowSize};

/// Per-stream record: lifecycle state plus the two flow-control windows.
#[derive(Debug)]
pub struct Stream {
    pub state: State,

    /// How much we may still send; replenished by peer WINDOW_UPDATEs.
    pub send_flow: FlowControl,

    /// How much the peer may still send; replenished when the application
    /// releases receive capacity.
    pub recv_flow: FlowControl,
}

impl Stream {
    pub fn new(send_window: WindowSize, recv_window: WindowSize) -> Stream {
        Stream {
            state: State::default(),
            send_flow: FlowControl::new(send_window),
            recv_flow: FlowControl::new(recv_window),
        }
    }
}
