use super::tables::{
    encode_distance, encode_length, CODE_LENGTH_ORDER, MAX_CL_CODE_LENGTH, MAX_CODE_LENGTH,
    NUM_CL_SYMBOLS, NUM_DISTANCE_SYMBOLS, NUM_LITLEN_SYMBOLS,
};
use crate::bits::BitWriter;
use crate::error::{Error, Result};
use crate::lz77::Token;

/// Frequency counter for per-block Huffman code generation
#[derive(Clone, Debug)]
pub struct FrequencyCounter {
    /// Frequencies for literals (0-255) and length classes (256-287)
    pub litlen_freq: [u32; NUM_LITLEN_SYMBOLS],
    /// Frequencies for distance classes (0-43)
    pub distance_freq: [u32; NUM_DISTANCE_SYMBOLS],
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self { litlen_freq: [0; NUM_LITLEN_SYMBOLS], distance_freq: [0; NUM_DISTANCE_SYMBOLS] }
    }

    /// Count frequencies from tokens
    pub fn count_tokens(&mut self, tokens: &[Token]) -> Result<()> {
        for token in tokens {
            match *token {
                Token::Literal(byte) => {
                    self.litlen_freq[byte as usize] += 1;
                }
                Token::Match { offset, length } => {
                    let (len_sym, _, _) = encode_length(length).ok_or_else(|| {
                        Error::Internal(format!("match length {} out of range", length))
                    })?;
                    let (dist_sym, _, _) = encode_distance(offset).ok_or_else(|| {
                        Error::Internal(format!("match offset {} out of range", offset))
                    })?;
                    self.litlen_freq[len_sym as usize] += 1;
                    self.distance_freq[dist_sym as usize] += 1;
                }
            }
        }
        Ok(())
    }
}

impl Default for FrequencyCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute optimal Huffman code lengths for given frequencies with a maximum length limit.
///
/// Symbols with zero frequency get length 0. Lengths are handed out shortest
/// first to the most frequent symbols, ties broken by ascending symbol value,
/// so the result depends only on the frequencies.
pub fn compute_code_lengths(frequencies: &[u32], max_bits: u8) -> Vec<u8> {
    let n = frequencies.len();
    let mut lengths = vec![0u8; n];

    // Collect symbols with non-zero frequency
    let symbols: Vec<(usize, u32)> =
        frequencies.iter().enumerate().filter(|(_, &f)| f > 0).map(|(i, &f)| (i, f)).collect();

    match symbols.len() {
        0 => return lengths,
        1 => {
            lengths[symbols[0].0] = 1;
            return lengths;
        }
        _ => {}
    }

    // Histogram of tree depths, clamped to max_bits
    let mut bl_count = vec![0u32; max_bits as usize + 1];
    for depth in huffman_depths(&symbols) {
        bl_count[depth.min(max_bits as u32) as usize] += 1;
    }
    limit_code_lengths(&mut bl_count, max_bits);

    // Most frequent symbols take the shortest lengths
    let mut sorted_syms = symbols;
    sorted_syms.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut next = sorted_syms.iter();
    for (bits, &count) in bl_count.iter().enumerate().skip(1) {
        for _ in 0..count {
            if let Some(&(sym, _)) = next.next() {
                lengths[sym] = bits as u8;
            }
        }
    }

    lengths
}

/// Depth of every leaf in a Huffman tree built by the two-queue merge.
///
/// Leaves are sorted by frequency; merged nodes are produced in
/// non-decreasing weight order, so the two lightest nodes are always at the
/// front of one of the two queues. Returned depths follow `symbols` order.
fn huffman_depths(symbols: &[(usize, u32)]) -> Vec<u32> {
    let n = symbols.len();
    let total = 2 * n - 1;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (symbols[i].1, symbols[i].0));

    // Node ids: 0..n leaves in sorted order, n..total merged nodes
    let mut weight: Vec<u64> = order.iter().map(|&i| symbols[i].1 as u64).collect();
    weight.reserve(n - 1);
    let mut parent = vec![0usize; total];

    let mut next_leaf = 0;
    let mut next_merged = n;

    for node in n..total {
        let mut pick = || {
            let take_leaf = next_leaf < n
                && (next_merged >= node || weight[next_leaf] <= weight[next_merged]);
            if take_leaf {
                next_leaf += 1;
                next_leaf - 1
            } else {
                next_merged += 1;
                next_merged - 1
            }
        };
        let a = pick();
        let b = pick();
        weight.push(weight[a] + weight[b]);
        parent[a] = node;
        parent[b] = node;
    }

    // Parents always have larger ids than children, so walk downwards from the root
    let mut depth = vec![0u32; total];
    for node in (0..total - 1).rev() {
        depth[node] = depth[parent[node]] + 1;
    }

    let mut depths = vec![0u32; n];
    for (leaf, &sym_idx) in order.iter().enumerate() {
        depths[sym_idx] = depth[leaf];
    }
    depths
}

/// Restore the Kraft inequality after lengths were clamped to max_bits
///
/// Clamping only makes codes shorter, which can oversubscribe the code
/// space. Each step pushes one code from the deepest non-full length one
/// level down until the total fits again.
fn limit_code_lengths(bl_count: &mut [u32], max_bits: u8) {
    let max = max_bits as usize;
    let capacity = 1u64 << max;
    let mut kraft: u64 =
        bl_count.iter().enumerate().skip(1).map(|(bits, &c)| (c as u64) << (max - bits)).sum();

    while kraft > capacity {
        let Some(bits) = (1..max).rev().find(|&b| bl_count[b] > 0) else {
            // More symbols than max_bits can address; callers never get here
            break;
        };
        bl_count[bits] -= 1;
        bl_count[bits + 1] += 1;
        kraft -= 1u64 << (max - bits - 1);
    }
}

/// Build canonical Huffman codes from code lengths
pub fn build_codes_from_lengths(lengths: &[u8]) -> Vec<(u32, u8)> {
    let max_bits = *lengths.iter().max().unwrap_or(&0);

    // Count codes of each length
    let mut bl_count = vec![0u32; max_bits as usize + 1];
    for &len in lengths {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }

    // Compute first code for each bit length
    let mut next_code = vec![0u32; max_bits as usize + 1];
    let mut code = 0u32;
    for bits in 1..=max_bits as usize {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    // Assign codes to symbols
    let mut codes = vec![(0u32, 0u8); lengths.len()];
    for (sym, &len) in lengths.iter().enumerate() {
        if len > 0 {
            codes[sym] = (next_code[len as usize], len);
            next_code[len as usize] += 1;
        }
    }

    codes
}

/// Canonical Huffman table for one block
///
/// Built once from the block's token stream and never modified afterwards;
/// the code lengths alone describe it on the wire.
#[derive(Clone, Debug)]
pub struct HuffmanTable {
    litlen_lengths: Vec<u8>,
    distance_lengths: Vec<u8>,
    litlen_codes: Vec<(u32, u8)>,
    distance_codes: Vec<(u32, u8)>,
}

impl HuffmanTable {
    /// Build the table from the symbol histogram of `tokens`
    pub fn build(tokens: &[Token]) -> Result<Self> {
        let mut freq = FrequencyCounter::new();
        freq.count_tokens(tokens)?;
        Ok(Self::from_frequencies(&freq))
    }

    pub fn from_frequencies(freq: &FrequencyCounter) -> Self {
        let litlen_lengths = compute_code_lengths(&freq.litlen_freq, MAX_CODE_LENGTH);
        let distance_lengths = compute_code_lengths(&freq.distance_freq, MAX_CODE_LENGTH);
        let litlen_codes = build_codes_from_lengths(&litlen_lengths);
        let distance_codes = build_codes_from_lengths(&distance_lengths);
        Self { litlen_lengths, distance_lengths, litlen_codes, distance_codes }
    }

    pub fn distance_lengths(&self) -> &[u8] {
        &self.distance_lengths
    }

    /// Serialize the code lengths
    ///
    /// Layout: `num_litlen - 1` (9 bits), `num_distance` (6 bits),
    /// `hclen - 4` (4 bits), `hclen` code length code lengths (3 bits each,
    /// in `CODE_LENGTH_ORDER`), then the run-length coded lengths.
    pub fn write(&self, writer: &mut BitWriter) -> Result<()> {
        let num_litlen = used_prefix(&self.litlen_lengths).max(1);
        let num_distance = used_prefix(&self.distance_lengths);

        // RLE encode the code lengths
        let combined_lengths: Vec<u8> = self.litlen_lengths[..num_litlen]
            .iter()
            .chain(self.distance_lengths[..num_distance].iter())
            .copied()
            .collect();
        let rle_encoded = rle_encode_lengths(&combined_lengths);

        // Count frequencies of code length symbols (0-18)
        let mut cl_freq = [0u32; NUM_CL_SYMBOLS];
        for &(sym, _) in &rle_encoded {
            cl_freq[sym as usize] += 1;
        }

        let cl_lengths = compute_code_lengths(&cl_freq, MAX_CL_CODE_LENGTH);
        let cl_codes = build_codes_from_lengths(&cl_lengths);

        // Code lengths are sent in special order, find last non-zero
        let hclen = CODE_LENGTH_ORDER
            .iter()
            .rposition(|&sym| cl_lengths[sym] > 0)
            .map_or(4, |i| i + 1)
            .max(4);

        writer.write_bits((num_litlen - 1) as u32, 9)?;
        writer.write_bits(num_distance as u32, 6)?;
        writer.write_bits((hclen - 4) as u32, 4)?;

        for &sym in CODE_LENGTH_ORDER.iter().take(hclen) {
            writer.write_bits(cl_lengths[sym] as u32, 3)?;
        }

        for &(sym, extra) in &rle_encoded {
            let (code, len) = cl_codes[sym as usize];
            writer.write_bits_reversed(code, len)?;

            match sym {
                16 => writer.write_bits(extra as u32, 2)?, // 3-6 repeats
                17 => writer.write_bits(extra as u32, 3)?, // 3-10 zeros
                18 => writer.write_bits(extra as u32, 7)?, // 11-138 zeros
                _ => {}
            }
        }

        Ok(())
    }

    /// Encode tokens with this table's codes plus raw extra bits
    pub fn encode(&self, writer: &mut BitWriter, tokens: &[Token]) -> Result<()> {
        for token in tokens {
            match *token {
                Token::Literal(byte) => {
                    let (code, len) = self.litlen_codes[byte as usize];
                    writer.write_bits_reversed(code, len)?;
                }
                Token::Match { offset, length } => {
                    let (len_sym, extra_val, extra_bits) = encode_length(length).ok_or_else(
                        || Error::Internal(format!("match length {} out of range", length)),
                    )?;
                    let (code, code_len) = self.litlen_codes[len_sym as usize];
                    writer.write_bits_reversed(code, code_len)?;
                    writer.write_bits(extra_val, extra_bits)?;

                    let (dist_sym, extra_val, extra_bits) = encode_distance(offset).ok_or_else(
                        || Error::Internal(format!("match offset {} out of range", offset)),
                    )?;
                    let (code, code_len) = self.distance_codes[dist_sym as usize];
                    writer.write_bits_reversed(code, code_len)?;
                    writer.write_bits(extra_val, extra_bits)?;
                }
            }
        }
        Ok(())
    }
}

/// Number of leading entries up to and including the last non-zero length
fn used_prefix(lengths: &[u8]) -> usize {
    lengths.iter().rposition(|&l| l > 0).map_or(0, |i| i + 1)
}

/// RLE encode code lengths using symbols 16, 17, 18
fn rle_encode_lengths(lengths: &[u8]) -> Vec<(u8, u8)> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];

        // Count consecutive same values
        let run = lengths[i..].iter().take_while(|&&l| l == len).count();
        let mut remaining = run;

        if len == 0 {
            while remaining > 0 {
                if remaining >= 11 {
                    // Symbol 18: 11-138 zeros
                    let count = remaining.min(138);
                    result.push((18, (count - 11) as u8));
                    remaining -= count;
                } else if remaining >= 3 {
                    // Symbol 17: 3-10 zeros
                    let count = remaining.min(10);
                    result.push((17, (count - 3) as u8));
                    remaining -= count;
                } else {
                    result.push((0, 0));
                    remaining -= 1;
                }
            }
        } else {
            result.push((len, 0));
            remaining -= 1;

            // Symbol 16: repeat previous 3-6 times
            while remaining > 0 {
                if remaining >= 3 {
                    let count = remaining.min(6);
                    result.push((16, (count - 3) as u8));
                    remaining -= count;
                } else {
                    result.push((len, 0));
                    remaining -= 1;
                }
            }
        }

        i += run;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kraft_sum(lengths: &[u8]) -> f64 {
        lengths.iter().filter(|&&l| l > 0).map(|&l| 2f64.powi(-(l as i32))).sum()
    }

    #[test]
    fn test_frequency_counter() {
        let mut freq = FrequencyCounter::new();
        let tokens = vec![
            Token::Literal(b'a'),
            Token::Literal(b'a'),
            Token::Literal(b'b'),
            Token::Match { offset: 1, length: 3 },
        ];
        freq.count_tokens(&tokens).unwrap();

        assert_eq!(freq.litlen_freq[b'a' as usize], 2);
        assert_eq!(freq.litlen_freq[b'b' as usize], 1);
        // Length 3 -> symbol 256, distance 1 -> class 0
        assert_eq!(freq.litlen_freq[256], 1);
        assert_eq!(freq.distance_freq[0], 1);
    }

    #[test]
    fn test_frequency_counter_rejects_bad_match() {
        let mut freq = FrequencyCounter::new();
        let err = freq.count_tokens(&[Token::Match { offset: 0, length: 3 }]).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_compute_code_lengths_equal() {
        let freqs = [1u32, 1, 1, 1];
        let lengths = compute_code_lengths(&freqs, 15);
        assert_eq!(lengths, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_compute_code_lengths_skewed() {
        let freqs = [100u32, 1, 1, 1];
        let lengths = compute_code_lengths(&freqs, 15);
        assert_eq!(lengths[0], 1);
        assert!(lengths[0] <= lengths[1]);
        assert!((kraft_sum(&lengths) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_code_lengths_single_and_empty() {
        assert_eq!(compute_code_lengths(&[0, 0, 7, 0], 15), vec![0, 0, 1, 0]);
        assert_eq!(compute_code_lengths(&[0, 0, 0], 15), vec![0, 0, 0]);
        assert_eq!(compute_code_lengths(&[], 15), Vec::<u8>::new());
    }

    #[test]
    fn test_compute_code_lengths_optimal_cost() {
        // Classic example: optimal weighted length is 224
        let freqs = [45u32, 13, 12, 16, 9, 5];
        let lengths = compute_code_lengths(&freqs, 15);
        let cost: u32 = freqs.iter().zip(&lengths).map(|(&f, &l)| f * l as u32).sum();
        assert_eq!(cost, 224);
        assert_eq!(lengths[0], 1);
    }

    #[test]
    fn test_compute_code_lengths_ties_by_symbol() {
        // Three symbols with equal weight: the lowest symbol gets the short code
        let lengths = compute_code_lengths(&[5, 5, 5], 15);
        assert_eq!(lengths, vec![1, 2, 2]);
    }

    #[test]
    fn test_compute_code_lengths_limited() {
        // Fibonacci frequencies produce a maximally deep tree
        let mut freqs = vec![1u32, 1];
        while freqs.len() < 30 {
            let n = freqs.len();
            freqs.push(freqs[n - 1] + freqs[n - 2]);
        }
        let lengths = compute_code_lengths(&freqs, 15);
        assert!(lengths.iter().all(|&l| (1..=15).contains(&l)));
        assert!(kraft_sum(&lengths) <= 1.0 + 1e-9);

        let cl = compute_code_lengths(&freqs[..19], 7);
        assert!(cl.iter().all(|&l| (1..=7).contains(&l)));
        assert!(kraft_sum(&cl) <= 1.0 + 1e-9);
    }

    #[test]
    fn test_build_codes_canonical() {
        // Lengths (2, 1, 3, 3) -> codes 10, 0, 110, 111
        let codes = build_codes_from_lengths(&[2, 1, 3, 3]);
        assert_eq!(codes, vec![(0b10, 2), (0b0, 1), (0b110, 3), (0b111, 3)]);
    }

    #[test]
    fn test_rle_encode_zeros() {
        let encoded = rle_encode_lengths(&[0u8; 20]);
        assert_eq!(encoded, vec![(18, 9)]);

        let encoded = rle_encode_lengths(&[0u8; 140]);
        assert_eq!(encoded, vec![(18, 127), (0, 0), (0, 0)]);
    }

    #[test]
    fn test_rle_encode_repeat() {
        let encoded = rle_encode_lengths(&[5u8; 10]);
        // First 5, repeat 6, then repeat 3
        assert_eq!(encoded, vec![(5, 0), (16, 3), (16, 0)]);
    }

    #[test]
    fn test_table_write_is_deterministic() {
        let tokens = vec![
            Token::Literal(b'x'),
            Token::Literal(b'y'),
            Token::Match { offset: 2, length: 10 },
        ];
        let write = || {
            let table = HuffmanTable::build(&tokens).unwrap();
            let mut writer = BitWriter::new();
            table.write(&mut writer).unwrap();
            table.encode(&mut writer, &tokens).unwrap();
            writer.finish().unwrap()
        };
        assert_eq!(write(), write());
    }

    #[test]
    fn test_table_respects_writer_limit() {
        let tokens: Vec<Token> = (0..=255u8).map(Token::Literal).collect();
        let table = HuffmanTable::build(&tokens).unwrap();
        let mut writer = BitWriter::with_limit(16);
        let result = table.write(&mut writer).and_then(|_| table.encode(&mut writer, &tokens));
        assert!(matches!(result, Err(Error::BufferTooSmall { capacity: 16 })));
    }
}
