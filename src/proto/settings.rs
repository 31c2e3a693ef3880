use frame::{Reason, SettingSet};
use frame::{DEFAULT_INITIAL_WINDOW_SIZE, DEFAULT_MAX_FRAME_SIZE, MAX_MAX_FRAME_SIZE,
            MAX_WINDOW_SIZE};
use hpack::DEFAULT_TABLE_SIZE;

/// The six connection settings with their concrete, in-effect values.
///
/// A connection holds two of these: `local` (what we advertise) and
/// `remote` (what the peer advertised).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    header_table_size: u32,
    enable_push: bool,
    max_concurrent_streams: Option<u32>,
    initial_window_size: u32,
    max_frame_size: u32,
    max_header_list_size: Option<u32>,
}

impl Settings {
    pub fn header_table_size(&self) -> u32 {
        self.header_table_size
    }

    pub fn enable_push(&self) -> bool {
        self.enable_push
    }

    /// `None` means unlimited.
    pub fn max_concurrent_streams(&self) -> Option<u32> {
        self.max_concurrent_streams
    }

    pub fn initial_window_size(&self) -> u32 {
        self.initial_window_size
    }

    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    /// `None` means unlimited.
    pub fn max_header_list_size(&self) -> Option<u32> {
        self.max_header_list_size
    }

    /// Validate and fold a wire-level update into the concrete values.
    ///
    /// Nothing is modified when any entry is out of range.
    pub fn apply(&mut self, set: &SettingSet) -> Result<(), Reason> {
        if let Some(val) = set.enable_push() {
            if val > 1 {
                return Err(Reason::PROTOCOL_ERROR);
            }
        }

        if let Some(val) = set.initial_window_size() {
            if val > MAX_WINDOW_SIZE {
                return Err(Reason::FLOW_CONTROL_ERROR);
            }
        }

        if let Some(val) = set.max_frame_size() {
            if val < DEFAULT_MAX_FRAME_SIZE || val > MAX_MAX_FRAME_SIZE {
                return Err(Reason::PROTOCOL_ERROR);
            }
        }

        if let Some(val) = set.header_table_size() {
            self.header_table_size = val;
        }

        if let Some(val) = set.enable_push() {
            self.enable_push = val == 1;
        }

        if let Some(val) = set.max_concurrent_streams() {
            self.max_concurrent_streams = Some(val);
        }

        if let Some(val) = set.initial_window_size() {
            self.initial_window_size = val;
        }

        if let Some(val) = set.max_frame_size() {
            self.max_frame_size = val;
        }

        if let Some(val) = set.max_header_list_size() {
            self.max_header_list_size = Some(val);
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            header_table_size: DEFAULT_TABLE_SIZE as u32,
            enable_push: true,
            max_concurrent_streams: None,
            initial_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_header_list_size: None,
        }
    }
}
