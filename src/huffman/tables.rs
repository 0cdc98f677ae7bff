//! Symbol alphabets shared by the encoder and decoder.
//!
//! Lengths and distances are split into a class (the Huffman-coded symbol)
//! plus raw extra bits. For a value `v` (length minus `MIN_MATCH`, or
//! distance minus one) the classes are:
//!
//! - `v < 4`: class `v`, no extra bits
//! - otherwise, with `n = floor(log2(v))`: class `2n + bit(n-1)` followed by
//!   `n - 1` extra bits
//!
//! which gives two classes per power of two.

/// Shortest match any engine emits
pub const MIN_MATCH: u32 = 3;

/// Longest representable match (32 length classes)
pub const MAX_MATCH: u32 = MIN_MATCH + (1 << 16) - 1;

/// Largest representable back-reference distance (44 distance classes)
pub const MAX_DISTANCE: u32 = 1 << 22;

/// Literal byte symbols 0-255
pub const NUM_LITERALS: usize = 256;

/// Length class symbols 256-287
pub const NUM_LENGTH_CLASSES: usize = 32;

/// Size of the combined literal/length alphabet
pub const NUM_LITLEN_SYMBOLS: usize = NUM_LITERALS + NUM_LENGTH_CLASSES;

/// Size of the distance alphabet
pub const NUM_DISTANCE_SYMBOLS: usize = 44;

/// Maximum code length for the literal/length and distance alphabets
pub const MAX_CODE_LENGTH: u8 = 15;

/// Maximum code length for the code length alphabet
pub const MAX_CL_CODE_LENGTH: u8 = 7;

/// Code length alphabet: 0-15 literal lengths, 16-18 run-length codes
pub const NUM_CL_SYMBOLS: usize = 19;

/// Order in which code length code lengths are serialized
///
/// Symbols that are rarely used come last so the trailing zeros can be cut.
pub const CODE_LENGTH_ORDER: [usize; NUM_CL_SYMBOLS] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// Split a value into (class, extra_value, extra_bits)
#[inline]
pub fn value_class(v: u32) -> (u16, u32, u8) {
    if v < 4 {
        return (v as u16, 0, 0);
    }
    let n = 31 - v.leading_zeros();
    let extra_bits = n - 1;
    let high = (v >> extra_bits) & 1;
    let base = (2 | high) << extra_bits;
    ((2 * n + high) as u16, v - base, extra_bits as u8)
}

/// Base value and number of extra bits for a class
#[inline]
pub fn class_base(class: u16) -> (u32, u8) {
    if class < 4 {
        return (class as u32, 0);
    }
    let n = (class / 2) as u32;
    let high = (class & 1) as u32;
    let extra_bits = n - 1;
    ((2 | high) << extra_bits, extra_bits as u8)
}

/// Find the literal/length symbol for a match length
/// Returns (symbol, extra_value, extra_bits)
pub fn encode_length(length: u32) -> Option<(u16, u32, u8)> {
    if !(MIN_MATCH..=MAX_MATCH).contains(&length) {
        return None;
    }
    let (class, extra, bits) = value_class(length - MIN_MATCH);
    Some((NUM_LITERALS as u16 + class, extra, bits))
}

/// Find the distance symbol for a back-reference distance
/// Returns (symbol, extra_value, extra_bits)
pub fn encode_distance(distance: u32) -> Option<(u16, u32, u8)> {
    if !(1..=MAX_DISTANCE).contains(&distance) {
        return None;
    }
    Some(value_class(distance - 1))
}

/// Number of extra bits that follow a length symbol (256-287)
pub fn length_extra_bits(symbol: u16) -> Option<u8> {
    let class = symbol.checked_sub(NUM_LITERALS as u16)?;
    if class as usize >= NUM_LENGTH_CLASSES {
        return None;
    }
    Some(class_base(class).1)
}

/// Number of extra bits that follow a distance symbol (0-43)
pub fn distance_extra_bits(symbol: u16) -> Option<u8> {
    if symbol as usize >= NUM_DISTANCE_SYMBOLS {
        return None;
    }
    Some(class_base(symbol).1)
}

/// Decode a match length from a length symbol (256-287) and extra bits
pub fn decode_length(symbol: u16, extra: u32) -> Option<u32> {
    let class = symbol.checked_sub(NUM_LITERALS as u16)?;
    if class as usize >= NUM_LENGTH_CLASSES {
        return None;
    }
    let (base, _) = class_base(class);
    Some(base + extra + MIN_MATCH)
}

/// Decode a distance from a distance symbol (0-43) and extra bits
pub fn decode_distance(symbol: u16, extra: u32) -> Option<u32> {
    if symbol as usize >= NUM_DISTANCE_SYMBOLS {
        return None;
    }
    let (base, _) = class_base(symbol);
    Some(base + extra + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_class_small() {
        assert_eq!(value_class(0), (0, 0, 0));
        assert_eq!(value_class(3), (3, 0, 0));
        assert_eq!(value_class(4), (4, 0, 1));
        assert_eq!(value_class(5), (4, 1, 1));
        assert_eq!(value_class(6), (5, 0, 1));
        assert_eq!(value_class(8), (6, 0, 2));
        assert_eq!(value_class(12), (7, 0, 2));
    }

    #[test]
    fn test_class_base() {
        assert_eq!(class_base(4), (4, 1));
        assert_eq!(class_base(5), (6, 1));
        assert_eq!(class_base(6), (8, 2));
        assert_eq!(class_base(7), (12, 2));
    }

    #[test]
    fn test_encode_length() {
        assert_eq!(encode_length(3), Some((256, 0, 0)));
        assert_eq!(encode_length(6), Some((259, 0, 0)));
        assert_eq!(encode_length(7), Some((260, 0, 1)));
        assert_eq!(encode_length(MAX_MATCH), Some((287, (1 << 14) - 1, 14)));
        assert_eq!(encode_length(2), None);
        assert_eq!(encode_length(MAX_MATCH + 1), None);
    }

    #[test]
    fn test_encode_distance() {
        assert_eq!(encode_distance(1), Some((0, 0, 0)));
        assert_eq!(encode_distance(5), Some((4, 0, 1)));
        assert_eq!(encode_distance(6), Some((4, 1, 1)));
        assert_eq!(encode_distance(MAX_DISTANCE).map(|e| e.0), Some(43));
        assert_eq!(encode_distance(0), None);
        assert_eq!(encode_distance(MAX_DISTANCE + 1), None);
    }

    #[test]
    fn test_extra_bits_lookup() {
        assert_eq!(length_extra_bits(256), Some(0));
        assert_eq!(length_extra_bits(287), Some(14));
        assert_eq!(length_extra_bits(255), None);
        assert_eq!(length_extra_bits(288), None);
        assert_eq!(distance_extra_bits(43), Some(20));
        assert_eq!(distance_extra_bits(44), None);
    }

    #[test]
    fn test_length_roundtrip() {
        for len in MIN_MATCH..=MAX_MATCH {
            let (sym, extra, bits) = encode_length(len).unwrap();
            assert!(extra < (1 << bits));
            assert_eq!(length_extra_bits(sym), Some(bits));
            assert_eq!(decode_length(sym, extra), Some(len), "length {}", len);
        }
    }

    #[test]
    fn test_distance_roundtrip_sampled() {
        let mut dist = 1u32;
        while dist <= MAX_DISTANCE {
            let (sym, extra, bits) = encode_distance(dist).unwrap();
            assert_eq!(distance_extra_bits(sym), Some(bits));
            assert_eq!(decode_distance(sym, extra), Some(dist), "distance {}", dist);
            dist += 1 + dist / 7;
        }
        let (sym, extra, _) = encode_distance(MAX_DISTANCE).unwrap();
        assert_eq!(decode_distance(sym, extra), Some(MAX_DISTANCE));
    }
}
