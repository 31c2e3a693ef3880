use frame::{Reason, MAX_WINDOW_SIZE};
use proto::WindowSize;

use std::cmp;

/// One direction of a flow-control window, stream- or connection-level.
///
/// The counter is signed: a SETTINGS_INITIAL_WINDOW_SIZE reduction can push
/// an in-flight window below zero, and the debt is repaid before further
/// data moves. Enforcement happens at the next send/receive check, not at
/// the adjustment point.
#[derive(Debug, Copy, Clone)]
pub struct FlowControl {
    window_size: i32,
}

impl FlowControl {
    pub fn new(window_size: WindowSize) -> FlowControl {
        FlowControl {
            window_size: window_size as i32,
        }
    }

    pub fn window_size(&self) -> i32 {
        self.window_size
    }

    /// The usable portion of the window.
    pub fn available(&self) -> WindowSize {
        cmp::max(0, self.window_size) as WindowSize
    }

    /// Account for transmitted data.
    pub fn send_data(&mut self, sz: WindowSize) {
        debug_assert!(sz <= self.available());
        self.window_size -= sz as i32;
    }

    /// Account for received data.
    pub fn recv_data(&mut self, sz: WindowSize) {
        self.window_size -= sz as i32;
    }

    /// Grow the window by a WINDOW_UPDATE increment.
    ///
    /// Fails when the result would exceed 2^31-1.
    pub fn expand(&mut self, sz: WindowSize) -> Result<(), Reason> {
        let next = self.window_size as i64 + sz as i64;

        if next > MAX_WINDOW_SIZE as i64 {
            return Err(Reason::FLOW_CONTROL_ERROR);
        }

        self.window_size = next as i32;
        Ok(())
    }

    /// Shift the window by a settings-induced delta, in either direction.
    pub fn adjust(&mut self, delta: i64) -> Result<(), Reason> {
        let next = self.window_size as i64 + delta;

        if next > MAX_WINDOW_SIZE as i64 {
            return Err(Reason::FLOW_CONTROL_ERROR);
        }

        self.window_size = next as i32;
        Ok(())
    }
}
