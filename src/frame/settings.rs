use frame::{Error, Frame, Head, Kind, StreamId};
use bytes::{BufMut, BytesMut, BigEndian};

/// A SETTINGS frame: a set of parameter updates, or a bare ACK.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Settings {
    ack: bool,
    values: SettingSet,
}

/// A partial update of connection parameters, as carried on the wire.
///
/// Entries left absent leave the corresponding parameter untouched, so a
/// default `SettingSet` is a no-op update.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SettingSet {
    header_table_size: Option<u32>,
    enable_push: Option<u32>,
    max_concurrent_streams: Option<u32>,
    initial_window_size: Option<u32>,
    max_frame_size: Option<u32>,
    max_header_list_size: Option<u32>,
}

/// One wire-level settings entry (RFC 7540 Section 6.5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    HeaderTableSize(u32),
    EnablePush(u32),
    MaxConcurrentStreams(u32),
    InitialWindowSize(u32),
    MaxFrameSize(u32),
    MaxHeaderListSize(u32),
}

const ACK: u8 = 0x1;

/// Octets per encoded entry: a u16 identifier and a u32 value.
const SETTING_LEN: usize = 6;

// ===== impl Settings =====

impl Settings {
    pub fn new(values: SettingSet) -> Settings {
        Settings {
            ack: false,
            values: values,
        }
    }

    pub fn ack() -> Settings {
        Settings {
            ack: true,
            values: SettingSet::default(),
        }
    }

    pub fn is_ack(&self) -> bool {
        self.ack
    }

    pub fn values(&self) -> &SettingSet {
        &self.values
    }

    pub fn into_set(self) -> SettingSet {
        self.values
    }

    pub fn load(head: Head, payload: &[u8]) -> Result<Settings, Error> {
        debug_assert_eq!(head.kind(), Kind::Settings);

        // SETTINGS frames always address the connection.
        if !head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        if head.flag() & ACK == ACK {
            if !payload.is_empty() {
                debug!("loading SETTINGS; ACK with a payload");
                return Err(Error::InvalidPayloadAckSettings);
            }

            return Ok(Settings::ack());
        }

        if payload.len() % SETTING_LEN != 0 {
            debug!("loading SETTINGS; fractional payload of {} octets", payload.len());
            return Err(Error::PartialSettingLength);
        }

        let mut values = SettingSet::default();

        for raw in payload.chunks(SETTING_LEN) {
            let id = ((raw[0] as u16) << 8) | raw[1] as u16;
            let value = unpack_octets_4!(raw, 2, u32);

            // Entries this endpoint does not recognize are ignored.
            if let Some(setting) = Setting::from_id(id, value) {
                values.push(setting);
            }
        }

        Ok(Settings::new(values))
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        let entries = self.values.entries();
        let payload_len = entries.len() * SETTING_LEN;

        debug_assert!(!self.ack || entries.is_empty());
        trace!("encoding SETTINGS; len={}", payload_len);

        let flag = if self.ack { ACK } else { 0 };
        let head = Head::new(Kind::Settings, flag, StreamId::zero());

        dst.reserve(super::HEADER_LEN + payload_len);
        head.encode(payload_len, dst);

        for setting in entries {
            let (id, value) = setting.pair();
            dst.put_u16::<BigEndian>(id);
            dst.put_u32::<BigEndian>(value);
        }
    }
}

impl From<Settings> for Frame {
    fn from(src: Settings) -> Frame {
        Frame::Settings(src)
    }
}

// ===== impl SettingSet =====

macro_rules! set_accessors {
    ($($field:ident, $set_field:ident;)+) => {
        $(
            pub fn $field(&self) -> Option<u32> {
                self.$field
            }

            pub fn $set_field(&mut self, val: Option<u32>) {
                self.$field = val;
            }
        )+
    }
}

impl SettingSet {
    set_accessors! {
        header_table_size, set_header_table_size;
        enable_push, set_enable_push;
        max_concurrent_streams, set_max_concurrent_streams;
        initial_window_size, set_initial_window_size;
        max_frame_size, set_max_frame_size;
        max_header_list_size, set_max_header_list_size;
    }

    /// Fold one wire entry into the set; later entries for the same
    /// identifier win.
    fn push(&mut self, setting: Setting) {
        use self::Setting::*;

        match setting {
            HeaderTableSize(v) => self.header_table_size = Some(v),
            EnablePush(v) => self.enable_push = Some(v),
            MaxConcurrentStreams(v) => self.max_concurrent_streams = Some(v),
            InitialWindowSize(v) => self.initial_window_size = Some(v),
            MaxFrameSize(v) => self.max_frame_size = Some(v),
            MaxHeaderListSize(v) => self.max_header_list_size = Some(v),
        }
    }

    /// The populated entries, in identifier order.
    fn entries(&self) -> Vec<Setting> {
        use self::Setting::*;

        let all = [
            self.header_table_size.map(HeaderTableSize),
            self.enable_push.map(EnablePush),
            self.max_concurrent_streams.map(MaxConcurrentStreams),
            self.initial_window_size.map(InitialWindowSize),
            self.max_frame_size.map(MaxFrameSize),
            self.max_header_list_size.map(MaxHeaderListSize),
        ];

        all.iter().filter_map(|entry| *entry).collect()
    }
}

// ===== impl Setting =====

impl Setting {
    /// Builds the variant corresponding to the given wire identifier, or
    /// `None` for identifiers this endpoint does not know.
    pub fn from_id(id: u16, value: u32) -> Option<Setting> {
        use self::Setting::*;

        match id {
            1 => Some(HeaderTableSize(value)),
            2 => Some(EnablePush(value)),
            3 => Some(MaxConcurrentStreams(value)),
            4 => Some(InitialWindowSize(value)),
            5 => Some(MaxFrameSize(value)),
            6 => Some(MaxHeaderListSize(value)),
            _ => None,
        }
    }

    fn pair(&self) -> (u16, u32) {
        use self::Setting::*;

        match *self {
            HeaderTableSize(v) => (1, v),
            EnablePush(v) => (2, v),
            MaxConcurrentStreams(v) => (3, v),
            InitialWindowSize(v) => (4, v),
            MaxFrameSize(v) => (5, v),
            MaxHeaderListSize(v) => (6, v),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use frame::{Head, Kind};

    #[test]
    fn load_rejects_ack_with_payload() {
        let head = Head::new(Kind::Settings, ACK, StreamId::zero());
        assert_eq!(
            Settings::load(head, &[0; 6]),
            Err(Error::InvalidPayloadAckSettings)
        );
    }

    #[test]
    fn load_rejects_fractional_payload() {
        let head = Head::new(Kind::Settings, 0, StreamId::zero());
        assert_eq!(
            Settings::load(head, &[0; 5]),
            Err(Error::PartialSettingLength)
        );
    }

    #[test]
    fn load_ignores_unknown_identifiers() {
        let head = Head::new(Kind::Settings, 0, StreamId::zero());

        // Identifier 0x99 does not exist; identifier 3 does.
        let payload = [
            0x00, 0x99, 0x00, 0x00, 0x00, 0x01,
            0x00, 0x03, 0x00, 0x00, 0x00, 0x64,
        ];

        let settings = Settings::load(head, &payload).unwrap();
        assert_eq!(settings.values().max_concurrent_streams(), Some(100));
        assert_eq!(settings.values().header_table_size(), None);
    }

    #[test]
    fn later_duplicate_entries_win() {
        let head = Head::new(Kind::Settings, 0, StreamId::zero());

        let payload = [
            0x00, 0x04, 0x00, 0x00, 0x00, 0x0a,
            0x00, 0x04, 0x00, 0x00, 0x00, 0x14,
        ];

        let settings = Settings::load(head, &payload).unwrap();
        assert_eq!(settings.values().initial_window_size(), Some(20));
    }
}
