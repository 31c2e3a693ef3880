use super::{huffman, Header};
use super::table::{self, Table};

use bytes::{BufMut, BytesMut};

use std::cmp;

/// Encodes header blocks using HPACK.
///
/// The encoder owns the outbound dynamic table. Its capacity tracks the
/// peer's advertised SETTINGS_HEADER_TABLE_SIZE; lowering it queues a size
/// update that is emitted at the start of the next block.
#[derive(Debug)]
pub struct Encoder {
    table: Table,

    /// Capacity change to signal ahead of the next block.
    size_update: Option<SizeUpdate>,
}

/// Pending capacity signaling.
///
/// When the limit drops and rises again between two blocks, the decoder must
/// see the low-water mark as well, so entries evicted there are evicted here
/// too.
#[derive(Debug, Clone, Copy)]
struct SizeUpdate {
    min: usize,
    latest: usize,
}

// ===== impl Encoder =====

impl Encoder {
    pub fn new() -> Encoder {
        Encoder {
            table: Table::new(super::DEFAULT_TABLE_SIZE),
            size_update: None,
        }
    }

    /// Update the maximum dynamic table capacity the peer will decode with.
    ///
    /// Called when a peer SETTINGS_HEADER_TABLE_SIZE arrives. Takes effect
    /// at the start of the next encoded block.
    pub fn update_max_size(&mut self, val: usize) {
        match self.size_update {
            Some(ref mut update) => {
                update.min = cmp::min(update.min, val);
                update.latest = val;
            }
            None => {
                if val != self.table.max_size() {
                    self.size_update = Some(SizeUpdate {
                        min: val,
                        latest: val,
                    });
                }
            }
        }
    }

    /// Sum of entry costs currently held by the dynamic table.
    pub fn table_size(&self) -> usize {
        self.table.size()
    }

    pub fn table_max_size(&self) -> usize {
        self.table.max_size()
    }

    /// Encode a header list into `dst` as one header block.
    pub fn encode(&mut self, headers: &[Header], dst: &mut BytesMut) {
        if let Some(update) = self.size_update.take() {
            if update.min < self.table.max_size() {
                trace!("encoding size update; size={}", update.min);
                encode_int(update.min, 5, 0b0010_0000, dst);
                self.table.set_max_size(update.min);
            }

            if update.latest != self.table.max_size() {
                trace!("encoding size update; size={}", update.latest);
                encode_int(update.latest, 5, 0b0010_0000, dst);
                self.table.set_max_size(update.latest);
            }
        }

        for header in headers {
            self.encode_header(header, dst);
        }
    }

    fn encode_header(&mut self, header: &Header, dst: &mut BytesMut) {
        let statik = table::find_static(header);

        // A full match in either table compresses to a single index.
        if let Some((index, true)) = statik {
            encode_int(index, 7, 0b1000_0000, dst);
            return;
        }

        let dynamic = self.table.find(header);

        if let Some((index, true)) = dynamic {
            encode_int(index, 7, 0b1000_0000, dst);
            return;
        }

        // Prefer the static table for the name reference.
        let name_index = match (statik, dynamic) {
            (Some((index, _)), _) => index,
            (None, Some((index, _))) => index,
            (None, None) => 0,
        };

        if header.is_sensitive() {
            // Never indexed: no table on the path may store the entry.
            encode_int(name_index, 4, 0b0001_0000, dst);
            self.encode_literal_parts(name_index, header, dst);
        } else if header.len() <= self.table.max_size() {
            encode_int(name_index, 6, 0b0100_0000, dst);
            self.encode_literal_parts(name_index, header, dst);
            self.table.insert(header.clone());
        } else {
            // The entry can never fit the table; do not bother indexing.
            encode_int(name_index, 4, 0, dst);
            self.encode_literal_parts(name_index, header, dst);
        }
    }

    fn encode_literal_parts(&mut self, name_index: usize, header: &Header, dst: &mut BytesMut) {
        if name_index == 0 {
            encode_string(header.name(), dst);
        }

        encode_string(header.value(), dst);
    }
}

/// Encode an integer under an N-bit prefix (RFC 7541 Section 5.1), OR-ing the
/// representation's pattern bits into the first octet.
pub fn encode_int(value: usize, prefix_bits: u8, pattern: u8, dst: &mut BytesMut) {
    debug_assert!(prefix_bits >= 1 && prefix_bits < 8);

    let mask = (1usize << prefix_bits) - 1;

    if value < mask {
        dst.reserve(1);
        dst.put_u8(pattern | value as u8);
        return;
    }

    dst.reserve(1 + (value / 127) + 1);
    dst.put_u8(pattern | mask as u8);

    let mut rem = value - mask;

    while rem >= 128 {
        dst.put_u8(0b1000_0000 | (rem % 128) as u8);
        rem /= 128;
    }

    dst.put_u8(rem as u8);
}

/// Encode a string literal (RFC 7541 Section 5.2).
///
/// The Huffman form is used only when it is strictly shorter than the
/// literal octets.
pub fn encode_string(src: &[u8], dst: &mut BytesMut) {
    let huff_len = huffman::encoded_len(src);

    if huff_len < src.len() {
        encode_int(huff_len, 7, 0b1000_0000, dst);
        huffman::encode(src, dst);
    } else {
        encode_int(src.len(), 7, 0, dst);
        dst.reserve(src.len());
        dst.put_slice(src);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::Decoder;
    use bytes::Bytes;

    fn encode_block(encoder: &mut Encoder, headers: &[Header]) -> Bytes {
        let mut dst = BytesMut::new();
        encoder.encode(headers, &mut dst);
        dst.freeze()
    }

    fn decode_block(decoder: &mut Decoder, src: &Bytes) -> Vec<Header> {
        let mut headers = vec![];
        decoder.decode(src, |h| headers.push(h)).unwrap();
        headers
    }

    #[test]
    fn encode_int_prefix_boundaries() {
        let mut dst = BytesMut::new();
        encode_int(10, 5, 0, &mut dst);
        assert_eq!(&dst[..], &[0x0a]);

        // RFC 7541 C.1.2: 1337 under a 5-bit prefix.
        let mut dst = BytesMut::new();
        encode_int(1337, 5, 0, &mut dst);
        assert_eq!(&dst[..], &[0x1f, 0x9a, 0x0a]);

        // RFC 7541 C.1.3: 42 on an 8-bit boundary... with a 7-bit prefix.
        let mut dst = BytesMut::new();
        encode_int(42, 7, 0, &mut dst);
        assert_eq!(&dst[..], &[0x2a]);
    }

    #[test]
    fn full_static_match_is_indexed() {
        let mut encoder = Encoder::new();
        let block = encode_block(&mut encoder, &[Header::new(":method", "GET")]);

        assert_eq!(&block[..], &[0x82]);
        assert_eq!(encoder.table_size(), 0);
    }

    #[test]
    fn uncached_literal_with_zero_capacity() {
        let mut encoder = Encoder::new();
        encoder.update_max_size(0);

        let block = encode_block(&mut encoder, &[Header::new(":path", "/sample/path")]);

        // A size update to zero, then a literal without indexing under the
        // :path name (index 4). Nothing may enter the table.
        assert_eq!(block[0], 0x20);
        assert_eq!(block[1], 0x04);
        assert_eq!(encoder.table_size(), 0);

        let mut decoder = Decoder::new(64 * 1024);
        let headers = decode_block(&mut decoder, &block);
        assert_eq!(headers, vec![Header::new(":path", "/sample/path")]);
        assert_eq!(decoder.table_size(), 0);
    }

    #[test]
    fn incremental_indexing_inserts_on_both_sides() {
        let mut encoder = Encoder::new();
        let mut decoder = Decoder::new(64 * 1024);

        let headers = vec![Header::new("custom-key", "custom-header")];
        let block = encode_block(&mut encoder, &headers);

        assert_eq!(decode_block(&mut decoder, &block), headers);
        assert_eq!(encoder.table_size(), 55);
        assert_eq!(decoder.table_size(), 55);

        // The second block compresses to a single dynamic index.
        let block = encode_block(&mut encoder, &headers);
        assert_eq!(&block[..], &[0xbe]);
        assert_eq!(decode_block(&mut decoder, &block), headers);
    }

    #[test]
    fn sensitive_header_never_indexed() {
        let mut encoder = Encoder::new();
        let block = encode_block(&mut encoder, &[Header::sensitive("password", "secret")]);

        // Never-indexed pattern with a literal name.
        assert_eq!(block[0], 0x10);
        assert_eq!(encoder.table_size(), 0);

        let mut decoder = Decoder::new(64 * 1024);
        let headers = decode_block(&mut decoder, &block);
        assert!(headers[0].is_sensitive());
        assert_eq!(decoder.table_size(), 0);
    }

    #[test]
    fn sensitive_header_references_name_index() {
        let mut encoder = Encoder::new();
        let block = encode_block(
            &mut encoder,
            &[Header::sensitive("authorization", "Basic dGVzdA==")],
        );

        // authorization is static index 23: 0001xxxx with 23 in 4 bits
        // overflows into a continuation (15 + 8).
        assert_eq!(&block[..2], &[0x1f, 0x08]);
        assert_eq!(encoder.table_size(), 0);
    }

    #[test]
    fn huffman_used_only_when_shorter() {
        let mut encoder = Encoder::new();

        // "ab" is 2 octets literal, 2 octets Huffman-coded; the literal
        // form wins ties.
        let block = encode_block(&mut encoder, &[Header::sensitive("x", "ab")]);
        // name literal: length 1, 'x'... value literal: H bit clear.
        assert_eq!(block[0], 0x10);
        let value_len_octet = block[1 + 1 + 1];
        assert_eq!(value_len_octet & 0x80, 0);
    }

    #[test]
    fn stateful_round_trip() {
        let mut encoder = Encoder::new();
        let mut decoder = Decoder::new(64 * 1024);

        let blocks: Vec<Vec<Header>> = vec![
            vec![
                Header::new(":method", "GET"),
                Header::new(":scheme", "http"),
                Header::new(":path", "/"),
                Header::new(":authority", "www.example.com"),
            ],
            vec![
                Header::new(":method", "GET"),
                Header::new(":scheme", "http"),
                Header::new(":path", "/"),
                Header::new(":authority", "www.example.com"),
                Header::new("cache-control", "no-cache"),
            ],
            vec![
                Header::new(":method", "GET"),
                Header::new(":scheme", "https"),
                Header::new(":path", "/index.html"),
                Header::new(":authority", "www.example.com"),
                Header::new("custom-key", "custom-value"),
            ],
        ];

        for headers in &blocks {
            let block = encode_block(&mut encoder, headers);
            assert_eq!(&decode_block(&mut decoder, &block), headers);
            assert_eq!(encoder.table_size(), decoder.table_size());
        }
    }

    #[test]
    fn shrinking_capacity_signals_decoder() {
        let mut encoder = Encoder::new();
        let mut decoder = Decoder::new(64 * 1024);

        let headers = vec![Header::new("custom-key", "custom-header")];
        let block = encode_block(&mut encoder, &headers);
        decode_block(&mut decoder, &block);
        assert_eq!(decoder.table_size(), 55);

        encoder.update_max_size(0);
        encoder.update_max_size(4096);

        let block = encode_block(&mut encoder, &headers);
        let decoded = decode_block(&mut decoder, &block);

        // Both tables dropped through the low-water mark; the entry was
        // re-inserted afterwards.
        assert_eq!(decoded, headers);
        assert_eq!(encoder.table_size(), 55);
        assert_eq!(decoder.table_size(), 55);
    }
}
