use super::{huffman, Header};
use super::table::Table;

use bytes::{Buf, Bytes};

use std::io::Cursor;

/// Decodes header blocks using HPACK.
///
/// The decoder owns the inbound dynamic table; it lives for the whole
/// connection and carries state from one header block to the next.
#[derive(Debug)]
pub struct Decoder {
    table: Table,

    /// Largest dynamic table capacity the peer may select with a size
    /// update; follows our advertised SETTINGS_HEADER_TABLE_SIZE.
    max_size_allowed: usize,

    /// Cap on a single decoded string, defending against decompression
    /// bombs.
    max_string_len: usize,
}

/// Errors encountered while decoding an HPACK header block.
///
/// Every variant is fatal at the block level; the owning connection treats
/// all of them as a connection-level COMPRESSION_ERROR.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecoderError {
    /// A structural fault: an unrecognized representation prefix, or a
    /// dynamic table size update that is misplaced or exceeds the
    /// advertised limit.
    InvalidRepresentation,

    /// An integer's continuation bytes accumulate past what a 64-bit value
    /// can hold.
    IntegerOverflow,

    /// A bit path left the Huffman code trie.
    InvalidHuffmanCode,

    /// Huffman input stopped on a path that is not a short EOS prefix.
    InvalidPadding,

    /// An index pointing at neither the static nor the dynamic table.
    IndexOutOfBounds,

    /// The input ended mid-field, or a decoded string overran the
    /// configured cap.
    BufferTooSmall,
}

enum Representation {
    /// Indexed header field representation
    ///
    /// ```text
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 1 |        Index (7+)         |
    /// +---+---------------------------+
    /// ```
    Indexed,

    /// Literal header field with incremental indexing
    ///
    /// ```text
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 0 | 1 |      Index (6+)       |
    /// +---+---+-----------------------+
    /// ```
    LiteralWithIndexing,

    /// Literal header field without indexing
    ///
    /// ```text
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 0 | 0 | 0 | 0 |  Index (4+)   |
    /// +---+---+-----------------------+
    /// ```
    LiteralWithoutIndexing,

    /// Literal header field never indexed
    ///
    /// ```text
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 0 | 0 | 0 | 1 |  Index (4+)   |
    /// +---+---+-----------------------+
    /// ```
    LiteralNeverIndexed,

    /// Dynamic table size update
    ///
    /// ```text
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 0 | 0 | 1 |   Max size (5+)   |
    /// +---+---------------------------+
    /// ```
    SizeUpdate,
}

// ===== impl Decoder =====

impl Decoder {
    /// Creates a decoder with the default 4096-octet table capacity and the
    /// given cap on individual decoded strings.
    pub fn new(max_string_len: usize) -> Decoder {
        Decoder {
            table: Table::new(super::DEFAULT_TABLE_SIZE),
            max_size_allowed: super::DEFAULT_TABLE_SIZE,
            max_string_len: max_string_len,
        }
    }

    /// Update the largest table capacity the peer may select.
    ///
    /// Called when our advertised SETTINGS_HEADER_TABLE_SIZE takes effect.
    /// Shrinking below the current capacity evicts immediately.
    pub fn set_max_size_allowed(&mut self, val: usize) {
        self.max_size_allowed = val;

        if val < self.table.max_size() {
            self.table.set_max_size(val);
        }
    }

    /// Sum of entry costs currently held by the dynamic table.
    pub fn table_size(&self) -> usize {
        self.table.size()
    }

    pub fn table_max_size(&self) -> usize {
        self.table.max_size()
    }

    /// Decodes the header block in the given buffer, passing each header to
    /// `f` in order.
    pub fn decode<F>(&mut self, src: &Bytes, mut f: F) -> Result<(), DecoderError>
    where
        F: FnMut(Header),
    {
        use self::Representation::*;

        let mut buf = Cursor::new(src);
        let mut seen_field = false;

        while buf.has_remaining() {
            // The representation of each block is determined by its first
            // byte.
            match Representation::load(peek_u8(&buf))? {
                Indexed => {
                    seen_field = true;

                    let index = decode_int(&mut buf, 7)?;
                    f(self.table.get(index)?);
                }
                LiteralWithIndexing => {
                    seen_field = true;

                    let entry = self.decode_literal(&mut buf, 6, false)?;
                    self.table.insert(entry.clone());
                    f(entry);
                }
                LiteralWithoutIndexing => {
                    seen_field = true;

                    f(self.decode_literal(&mut buf, 4, false)?);
                }
                LiteralNeverIndexed => {
                    seen_field = true;

                    f(self.decode_literal(&mut buf, 4, true)?);
                }
                SizeUpdate => {
                    // A size update must precede every header field of the
                    // block, and may not exceed the advertised limit.
                    if seen_field {
                        return Err(DecoderError::InvalidRepresentation);
                    }

                    let size = decode_int(&mut buf, 5)?;

                    if size > self.max_size_allowed {
                        return Err(DecoderError::InvalidRepresentation);
                    }

                    trace!("dynamic table size update; size={}", size);
                    self.table.set_max_size(size);
                }
            }
        }

        Ok(())
    }

    fn decode_literal(
        &mut self,
        buf: &mut Cursor<&Bytes>,
        prefix: u8,
        sensitive: bool,
    ) -> Result<Header, DecoderError> {
        // Table index of the name, or zero when the name follows literally.
        let index = decode_int(buf, prefix)?;

        let name = if index == 0 {
            self.decode_string(buf)?
        } else {
            self.table.get(index)?.name_bytes().clone()
        };

        let value = self.decode_string(buf)?;

        if sensitive {
            Ok(Header::sensitive(name, value))
        } else {
            Ok(Header::new(name, value))
        }
    }

    fn decode_string(&self, buf: &mut Cursor<&Bytes>) -> Result<Bytes, DecoderError> {
        const HUFF_FLAG: u8 = 0b1000_0000;

        if !buf.has_remaining() {
            return Err(DecoderError::BufferTooSmall);
        }

        let huff = peek_u8(buf) & HUFF_FLAG == HUFF_FLAG;
        let len = decode_int(buf, 7)?;

        if len > buf.remaining() {
            trace!("string declares {} octets; {} remain", len, buf.remaining());
            return Err(DecoderError::BufferTooSmall);
        }

        let pos = buf.position() as usize;
        let src: &Bytes = *buf.get_ref();

        let ret = if huff {
            huffman::decode(&src[pos..pos + len], self.max_string_len)?.freeze()
        } else {
            src.slice(pos, pos + len)
        };

        buf.advance(len);
        Ok(ret)
    }
}

// ===== impl Representation =====

impl Representation {
    pub fn load(byte: u8) -> Result<Representation, DecoderError> {
        if byte & 0b1000_0000 == 0b1000_0000 {
            Ok(Representation::Indexed)
        } else if byte & 0b1100_0000 == 0b0100_0000 {
            Ok(Representation::LiteralWithIndexing)
        } else if byte & 0b1110_0000 == 0b0010_0000 {
            Ok(Representation::SizeUpdate)
        } else if byte & 0b1111_0000 == 0b0001_0000 {
            Ok(Representation::LiteralNeverIndexed)
        } else if byte & 0b1111_0000 == 0 {
            Ok(Representation::LiteralWithoutIndexing)
        } else {
            Err(DecoderError::InvalidRepresentation)
        }
    }
}

/// Decode an integer under an N-bit prefix (RFC 7541 Section 5.1).
fn decode_int<B: Buf>(buf: &mut B, prefix_size: u8) -> Result<usize, DecoderError> {
    const VARINT_MASK: u8 = 0b0111_1111;
    const VARINT_FLAG: u8 = 0b1000_0000;

    debug_assert!(prefix_size >= 1 && prefix_size < 8);

    if !buf.has_remaining() {
        return Err(DecoderError::BufferTooSmall);
    }

    let mask = (1u8 << prefix_size) - 1;
    let mut ret = (buf.get_u8() & mask) as u64;

    if ret < mask as u64 {
        // The value fit in the prefix bits.
        return Ok(ret as usize);
    }

    // The remainder is base-128 little-endian groups, each byte carrying a
    // continuation bit. The shift is bounded so that trailing zero-valued
    // continuation bytes cannot be fed indefinitely.
    let mut shift: u32 = 0;

    loop {
        if !buf.has_remaining() {
            return Err(DecoderError::BufferTooSmall);
        }

        let byte = buf.get_u8();
        let group = (byte & VARINT_MASK) as u64;

        if shift > 63 {
            return Err(DecoderError::IntegerOverflow);
        }

        let add = group << shift;
        if add >> shift != group {
            return Err(DecoderError::IntegerOverflow);
        }

        ret = match ret.checked_add(add) {
            Some(ret) => ret,
            None => return Err(DecoderError::IntegerOverflow),
        };

        if byte & VARINT_FLAG == 0 {
            return Ok(ret as usize);
        }

        shift += 7;
    }
}

fn peek_u8<B: Buf>(buf: &B) -> u8 {
    buf.bytes()[0]
}
