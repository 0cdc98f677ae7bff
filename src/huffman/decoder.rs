use super::tables::{
    decode_distance, decode_length, distance_extra_bits, length_extra_bits, CODE_LENGTH_ORDER,
    MAX_CODE_LENGTH, NUM_CL_SYMBOLS, NUM_DISTANCE_SYMBOLS, NUM_LITERALS, NUM_LITLEN_SYMBOLS,
};
use crate::bits::writer::reverse_bits;
use crate::bits::BitReader;
use crate::error::{Corruption, Result};
use crate::lz77::Token;

/// Codes up to this length resolve with a single table lookup
const LOOKUP_BITS: u8 = 10;

/// Canonical Huffman decoder
pub struct HuffmanDecoder {
    /// Maximum code length
    max_bits: u8,
    /// For each bit length, the starting code and starting index
    /// (first_code, first_symbol_index)
    bit_info: [(u32, usize); 16],
    /// Symbols sorted by code length, then by symbol value
    symbols: Vec<u16>,
    /// Indexed by the next LOOKUP_BITS stream bits: `symbol << 4 | length`, 0 if
    /// the code is longer than LOOKUP_BITS or unassigned
    lookup: Vec<u32>,
}

impl HuffmanDecoder {
    /// Build from code lengths, rejecting sets that are not a prefix code
    pub fn from_code_lengths(lengths: &[u8]) -> Result<Self> {
        let max_bits = *lengths.iter().max().unwrap_or(&0);
        if max_bits > MAX_CODE_LENGTH {
            return Err(Corruption::InvalidCodeLength(max_bits).into());
        }

        // Count codes of each length
        let mut bl_count = [0u32; 16];
        for &len in lengths {
            if len > 0 {
                bl_count[len as usize] += 1;
            }
        }

        // More codes of some length than the code space allows
        let mut left: i64 = 1;
        for &count in &bl_count[1..] {
            left = (left << 1) - count as i64;
            if left < 0 {
                return Err(Corruption::HuffmanOversubscribed.into());
            }
        }

        // Compute first code for each bit length
        let mut next_code = [0u32; 16];
        let mut code = 0u32;
        for bits in 1..16 {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        // Sort symbols by code length, then by symbol value
        let mut symbols: Vec<(u16, u8)> = lengths
            .iter()
            .enumerate()
            .filter(|(_, &len)| len > 0)
            .map(|(sym, &len)| (sym as u16, len))
            .collect();
        symbols.sort_by_key(|&(sym, len)| (len, sym));

        let mut bit_info = [(0u32, 0usize); 16];
        let mut symbol_idx = 0;
        for bits in 1..16 {
            bit_info[bits] = (next_code[bits], symbol_idx);
            symbol_idx += bl_count[bits] as usize;
        }

        // Fill every lookup slot whose low bits match a short code
        let mut lookup = vec![0u32; 1 << LOOKUP_BITS];
        for &(sym, len) in &symbols {
            let code = next_code[len as usize];
            next_code[len as usize] += 1;
            if len > LOOKUP_BITS {
                continue;
            }
            let reversed = reverse_bits(code, len) as usize;
            let entry = (sym as u32) << 4 | len as u32;
            for fill in 0..(1usize << (LOOKUP_BITS - len)) {
                lookup[reversed | (fill << len)] = entry;
            }
        }

        Ok(Self {
            max_bits,
            bit_info,
            symbols: symbols.iter().map(|&(sym, _)| sym).collect(),
            lookup,
        })
    }

    /// Decode next symbol from bitstream
    pub fn decode(&self, bits: &mut BitReader<'_>) -> Result<u16> {
        if self.max_bits == 0 {
            return Err(Corruption::EmptyTable.into());
        }

        let (peeked, available) = bits.peek_bits(LOOKUP_BITS);
        let entry = self.lookup[peeked as usize];
        let len = (entry & 0xF) as u8;
        if len > 0 && len <= available {
            bits.consume_bits(len);
            return Ok((entry >> 4) as u16);
        }

        self.decode_slow(bits)
    }

    /// Walk the canonical code one bit at a time
    fn decode_slow(&self, bits: &mut BitReader<'_>) -> Result<u16> {
        let mut code = 0u32;
        for len in 1..=self.max_bits as usize {
            code = (code << 1) | bits.read_bits(1)?;
            let (first_code, first_idx) = self.bit_info[len];

            let count = if len < 15 {
                self.bit_info[len + 1].1 - first_idx
            } else {
                self.symbols.len() - first_idx
            };

            if count > 0 && code >= first_code && code < first_code + count as u32 {
                let idx = first_idx + (code - first_code) as usize;
                return Ok(self.symbols[idx]);
            }
        }

        Err(Corruption::InvalidHuffmanSymbol(code).into())
    }

    /// Check if this decoder is empty (no symbols)
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Literal/length and distance decoders for one block
pub struct TokenDecoder {
    litlen: HuffmanDecoder,
    distance: HuffmanDecoder,
}

impl TokenDecoder {
    /// Read the serialized code lengths written by `HuffmanTable::write`
    pub fn read_table(bits: &mut BitReader<'_>) -> Result<Self> {
        let num_litlen = bits.read_bits(9)? as usize + 1;
        if num_litlen > NUM_LITLEN_SYMBOLS {
            return Err(Corruption::AlphabetOverflow {
                alphabet: "literal/length",
                found: num_litlen,
                max: NUM_LITLEN_SYMBOLS,
            }
            .into());
        }
        let num_distance = bits.read_bits(6)? as usize;
        if num_distance > NUM_DISTANCE_SYMBOLS {
            return Err(Corruption::AlphabetOverflow {
                alphabet: "distance",
                found: num_distance,
                max: NUM_DISTANCE_SYMBOLS,
            }
            .into());
        }
        let hclen = bits.read_bits(4)? as usize + 4;

        let mut cl_lengths = [0u8; NUM_CL_SYMBOLS];
        for &sym in CODE_LENGTH_ORDER.iter().take(hclen) {
            cl_lengths[sym] = bits.read_bits(3)? as u8;
        }
        let cl_decoder = HuffmanDecoder::from_code_lengths(&cl_lengths)?;

        let total = num_litlen + num_distance;
        let mut lengths: Vec<u8> = Vec::with_capacity(total);
        while lengths.len() < total {
            let sym = cl_decoder.decode(bits)?;
            let (value, count) = match sym {
                0..=15 => (sym as u8, 1),
                16 => {
                    let prev = *lengths.last().ok_or(Corruption::RepeatWithoutPrevious)?;
                    (prev, 3 + bits.read_bits(2)? as usize)
                }
                17 => (0, 3 + bits.read_bits(3)? as usize),
                18 => (0, 11 + bits.read_bits(7)? as usize),
                _ => return Err(Corruption::InvalidHuffmanSymbol(sym as u32).into()),
            };
            if lengths.len() + count > total {
                return Err(Corruption::CodeLengthCount {
                    expected: total,
                    found: lengths.len() + count,
                }
                .into());
            }
            lengths.resize(lengths.len() + count, value);
        }

        let litlen = HuffmanDecoder::from_code_lengths(&lengths[..num_litlen])?;
        let distance = HuffmanDecoder::from_code_lengths(&lengths[num_litlen..])?;
        if litlen.is_empty() {
            return Err(Corruption::EmptyTable.into());
        }
        Ok(Self { litlen, distance })
    }

    /// Decode the next literal or match
    pub fn read_token(&self, bits: &mut BitReader<'_>) -> Result<Token> {
        let sym = self.litlen.decode(bits)?;
        if (sym as usize) < NUM_LITERALS {
            return Ok(Token::Literal(sym as u8));
        }

        let extra_bits = length_extra_bits(sym).ok_or(Corruption::InvalidLengthCode(sym))?;
        let extra = bits.read_bits(extra_bits)?;
        let length = decode_length(sym, extra).ok_or(Corruption::InvalidLengthCode(sym))?;

        let dist_sym = self.distance.decode(bits)?;
        let extra_bits =
            distance_extra_bits(dist_sym).ok_or(Corruption::InvalidDistanceCode(dist_sym))?;
        let extra = bits.read_bits(extra_bits)?;
        let offset =
            decode_distance(dist_sym, extra).ok_or(Corruption::InvalidDistanceCode(dist_sym))?;

        Ok(Token::Match { offset, length })
    }
}
