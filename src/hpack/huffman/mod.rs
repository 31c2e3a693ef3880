mod table;

use self::table::CODES;
use hpack::DecoderError;

use bytes::{BufMut, BytesMut};

/// Index of the EOS symbol in the code table.
const EOS: usize = 256;

lazy_static! {
    /// The decode trie, built once from the 257 canonical codes and shared
    /// by every decoder in the process.
    static ref DECODE_TREE: Tree = Tree::new();
}

/// Binary trie over the canonical Huffman codes.
///
/// Nodes on the EOS path are flagged so that end-of-input can distinguish
/// valid all-ones padding from a truncated code.
#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: [Option<u16>; 2],
    symbol: Option<u8>,
    eos_prefix: bool,
}

// ===== impl Tree =====

impl Tree {
    fn new() -> Tree {
        let mut tree = Tree {
            nodes: vec![Node::default()],
        };

        for (symbol, &(code, bits)) in CODES.iter().enumerate() {
            tree.add(symbol, code, bits);
        }

        tree
    }

    fn add(&mut self, symbol: usize, code: u32, bits: u8) {
        let mut current = 0;

        for shift in (0..bits).rev() {
            let bit = ((code >> shift) & 1) as usize;

            let next = match self.nodes[current].children[bit] {
                Some(next) => next as usize,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[current].children[bit] = Some(next as u16);
                    next
                }
            };

            current = next;

            if symbol == EOS {
                self.nodes[current].eos_prefix = true;
            }
        }

        if symbol != EOS {
            self.nodes[current].symbol = Some(symbol as u8);
        }
    }
}

/// Decode a Huffman-coded string.
///
/// `max_len` bounds the decoded output as a defense against decompression
/// bombs; exceeding it yields `BufferTooSmall`. Input that stops partway
/// through a code is accepted only when the dangling bit path is a proper
/// prefix of the EOS code no longer than 7 bits.
pub fn decode(src: &[u8], max_len: usize) -> Result<BytesMut, DecoderError> {
    let tree: &Tree = &DECODE_TREE;

    // The shortest code is 5 bits, so the output cannot exceed this.
    let mut dst = BytesMut::with_capacity(src.len() * 8 / 5 + 1);

    let mut current = 0usize;
    let mut partial_bits = 0usize;

    for byte in src {
        for shift in (0..8).rev() {
            let bit = ((byte >> shift) & 1) as usize;

            current = match tree.nodes[current].children[bit] {
                Some(next) => next as usize,
                None => return Err(DecoderError::InvalidHuffmanCode),
            };

            match tree.nodes[current].symbol {
                Some(symbol) => {
                    if dst.len() == max_len {
                        return Err(DecoderError::BufferTooSmall);
                    }

                    dst.put_u8(symbol);
                    current = 0;
                    partial_bits = 0;
                }
                None => {
                    partial_bits += 1;
                }
            }
        }
    }

    if current != 0 {
        // Padding must be the most significant bits of the EOS code and
        // strictly shorter than one octet.
        if !tree.nodes[current].eos_prefix || partial_bits > 7 {
            return Err(DecoderError::InvalidPadding);
        }
    }

    Ok(dst)
}

/// Huffman-code the input, padding the final octet with the most significant
/// bits of the EOS code.
pub fn encode(src: &[u8], dst: &mut BytesMut) {
    let mut acc: u64 = 0;
    let mut pending: usize = 0;

    dst.reserve(encoded_len(src));

    for &byte in src {
        let (code, bits) = CODES[byte as usize];

        acc = (acc << bits) | code as u64;
        pending += bits as usize;

        while pending >= 8 {
            pending -= 8;
            dst.put_u8((acc >> pending) as u8);
        }
    }

    if pending > 0 {
        let pad = 8 - pending;
        acc = (acc << pad) | ((1 << pad) - 1);
        dst.put_u8(acc as u8);
    }
}

/// Exact octet length `encode` would produce for the input.
pub fn encoded_len(src: &[u8]) -> usize {
    let bits: usize = src.iter()
        .map(|&byte| CODES[byte as usize].1 as usize)
        .sum();

    (bits + 7) / 8
}

#[cfg(test)]
mod test {
    use super::*;

    fn decoded(src: &[u8]) -> BytesMut {
        decode(src, 64 * 1024).unwrap()
    }

    #[test]
    fn encode_rfc_vectors() {
        let vectors: &[(&[u8], &[u8])] = &[
            (b"www.example.com", &[
                0xf1, 0xe3, 0xc2, 0xe5, 0xf2, 0x3a, 0x6b, 0xa0,
                0xab, 0x90, 0xf4, 0xff,
            ]),
            (b"no-cache", &[0xa8, 0xeb, 0x10, 0x64, 0x9c, 0xbf]),
            (b"custom-key", &[0x25, 0xa8, 0x49, 0xe9, 0x5b, 0xa9, 0x7d, 0x7f]),
            (b"302", &[0x64, 0x02]),
            (b"gzip", &[0x9b, 0xd9, 0xab]),
        ];

        for &(plain, coded) in vectors {
            let mut dst = BytesMut::new();
            encode(plain, &mut dst);

            assert_eq!(&dst[..], coded);
            assert_eq!(encoded_len(plain), coded.len());
            assert_eq!(&decoded(coded)[..], plain);
        }
    }

    #[test]
    fn round_trips_all_octets(){
        let src: Vec<u8> = (0..256).map(|b| b as u8).collect();

        let mut coded = BytesMut::new();
        encode(&src, &mut coded);

        assert_eq!(&decoded(&coded)[..], &src[..]);
    }

    #[test]
    fn rejects_zero_padding() {
        // '0' (00000) followed by three zero bits of padding; padding must
        // be all ones.
        assert_eq!(decode(&[0x00], 1024), Err(DecoderError::InvalidPadding));
    }

    #[test]
    fn rejects_overlong_padding() {
        // '1' (00001) followed by eleven one bits: an EOS prefix, but wider
        // than 7 bits.
        assert_eq!(
            decode(&[0x0f, 0xff], 1024),
            Err(DecoderError::InvalidPadding)
        );
    }

    #[test]
    fn rejects_data_after_eos() {
        // 32 one bits: the full 30-bit EOS code has no children.
        assert_eq!(
            decode(&[0xff, 0xff, 0xff, 0xff], 1024),
            Err(DecoderError::InvalidHuffmanCode)
        );
    }

    #[test]
    fn enforces_output_cap() {
        let mut coded = BytesMut::new();
        encode(b"www.example.com", &mut coded);

        assert_eq!(decode(&coded, 3), Err(DecoderError::BufferTooSmall));
    }
}
