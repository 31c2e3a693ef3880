use super::{DecoderError, Header};

use std::collections::VecDeque;

/// Number of entries in the static table.
pub const STATIC_TABLE_LEN: usize = 61;

/// First index addressing the dynamic table in the combined index space.
const DYN_OFFSET: usize = STATIC_TABLE_LEN + 1;

/// The static table of RFC 7541 Appendix A: 61 canonical `(name, value)`
/// pairs addressed by indices 1 through 61.
const STATIC_TABLE: [(&'static str, &'static str); STATIC_TABLE_LEN] = [
    (":authority", ""),
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("accept-charset", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("accept-ranges", ""),
    ("accept", ""),
    ("access-control-allow-origin", ""),
    ("age", ""),
    ("allow", ""),
    ("authorization", ""),
    ("cache-control", ""),
    ("content-disposition", ""),
    ("content-encoding", ""),
    ("content-language", ""),
    ("content-length", ""),
    ("content-location", ""),
    ("content-range", ""),
    ("content-type", ""),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("expect", ""),
    ("expires", ""),
    ("from", ""),
    ("host", ""),
    ("if-match", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("if-range", ""),
    ("if-unmodified-since", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("max-forwards", ""),
    ("proxy-authenticate", ""),
    ("proxy-authorization", ""),
    ("range", ""),
    ("referer", ""),
    ("refresh", ""),
    ("retry-after", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("strict-transport-security", ""),
    ("transfer-encoding", ""),
    ("user-agent", ""),
    ("vary", ""),
    ("via", ""),
    ("www-authenticate", ""),
];

/// Get the static entry at a 1-based index.
pub fn get_static(index: usize) -> Header {
    debug_assert!(index >= 1 && index <= STATIC_TABLE_LEN);

    let (name, value) = STATIC_TABLE[index - 1];
    Header::new(name, value)
}

/// Search the static table for the given header.
///
/// Returns the smallest matching index and whether the value matched as
/// well.
pub fn find_static(header: &Header) -> Option<(usize, bool)> {
    let mut name_match = None;

    for (i, &(name, value)) in STATIC_TABLE.iter().enumerate() {
        if name.as_bytes() == header.name() {
            if value.as_bytes() == header.value() {
                return Some((i + 1, true));
            }

            if name_match.is_none() {
                name_match = Some((i + 1, false));
            }
        }
    }

    name_match
}

/// The dynamic table: an LRU sequence of entries, newest first, bounded by
/// the entry-cost metric of RFC 7541 Section 4.1.
///
/// Indices 62 and up address this table in the combined index space.
#[derive(Debug)]
pub struct Table {
    entries: VecDeque<Header>,
    size: usize,
    max_size: usize,
}

// ===== impl Table =====

impl Table {
    pub fn new(max_size: usize) -> Table {
        Table {
            entries: VecDeque::new(),
            size: 0,
            max_size: max_size,
        }
    }

    /// Sum of entry costs currently held.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolve an index in the combined static/dynamic address space.
    pub fn get(&self, index: usize) -> Result<Header, DecoderError> {
        if index == 0 {
            return Err(DecoderError::IndexOutOfBounds);
        }

        if index <= STATIC_TABLE_LEN {
            return Ok(get_static(index));
        }

        match self.entries.get(index - DYN_OFFSET) {
            Some(entry) => Ok(entry.clone()),
            None => Err(DecoderError::IndexOutOfBounds),
        }
    }

    /// Search the dynamic table for the given header.
    ///
    /// Returns the combined-space index of the newest match and whether the
    /// value matched as well.
    pub fn find(&self, header: &Header) -> Option<(usize, bool)> {
        let mut name_match = None;

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.name() == header.name() {
                if entry.value() == header.value() {
                    return Some((DYN_OFFSET + i, true));
                }

                if name_match.is_none() {
                    name_match = Some((DYN_OFFSET + i, false));
                }
            }
        }

        name_match
    }

    /// Insert an entry, evicting from the oldest end until it fits.
    ///
    /// An entry larger than the whole table clears the table and is not
    /// stored (RFC 7541 Section 4.4).
    pub fn insert(&mut self, entry: Header) {
        let len = entry.len();

        if len > self.max_size {
            self.entries.clear();
            self.size = 0;
            return;
        }

        self.evict(len);

        self.size += len;
        self.entries.push_front(entry);
    }

    /// Change the table capacity, evicting oldest entries as needed.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.evict(0);
    }

    fn evict(&mut self, reserve: usize) {
        while self.size + reserve > self.max_size {
            let last = match self.entries.pop_back() {
                Some(entry) => entry,
                None => return,
            };

            self.size -= last.len();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hpack::Header;

    #[test]
    fn static_lookups() {
        let get = get_static(2);
        assert_eq!(get.name(), b":method");
        assert_eq!(get.value(), b"GET");

        assert_eq!(find_static(&Header::new(":method", "GET")), Some((2, true)));
        assert_eq!(find_static(&Header::new(":method", "PUT")), Some((2, false)));
        assert_eq!(
            find_static(&Header::new("accept-encoding", "gzip, deflate")),
            Some((16, true))
        );
        assert_eq!(find_static(&Header::new("x-custom", "1")), None);
    }

    #[test]
    fn insert_and_index() {
        let mut table = Table::new(4096);

        table.insert(Header::new("a", "one"));
        table.insert(Header::new("b", "two"));

        // Newest entry is index 62.
        assert_eq!(table.get(62).unwrap().name(), b"b");
        assert_eq!(table.get(63).unwrap().name(), b"a");
        assert!(table.get(64).is_err());
        assert_eq!(table.size(), 36 + 36);
    }

    #[test]
    fn eviction_keeps_newest_entries() {
        // Room for exactly two of these 36-octet entries.
        let mut table = Table::new(72);

        table.insert(Header::new("a", "one"));
        table.insert(Header::new("b", "two"));
        table.insert(Header::new("c", "tri"));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(62).unwrap().name(), b"c");
        assert_eq!(table.get(63).unwrap().name(), b"b");
        assert!(table.size() <= table.max_size());
    }

    #[test]
    fn oversize_entry_clears_table() {
        let mut table = Table::new(40);

        table.insert(Header::new("a", "one"));
        assert_eq!(table.len(), 1);

        table.insert(Header::new("name-too-long", "value-too-long"));
        assert_eq!(table.len(), 0);
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn shrinking_capacity_evicts() {
        let mut table = Table::new(4096);

        table.insert(Header::new("a", "one"));
        table.insert(Header::new("b", "two"));

        table.set_max_size(40);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(62).unwrap().name(), b"b");

        table.set_max_size(0);
        assert_eq!(table.len(), 0);
        assert_eq!(table.size(), 0);
    }
}
