//! Match finding over one chunk
//!
//! Two strategies share the hash chains in [`super::window`]:
//! - Greedy (fast engine): walk the chain and take the first candidate that
//!   reaches the minimum match length.
//! - Lazy (deep engine): search up to the configured depth for the longest
//!   candidate, then defer by one byte whenever the next position has a
//!   strictly longer match.
//!
//! The deep search stops early once a candidate reaches the engine's
//! `nice_match` length, and a match of at least `good_match` bytes is taken
//! without looking at the next position.
//!
//! Candidates are visited nearest first, and a candidate only replaces the
//! current best when strictly longer, so equal lengths keep the smaller offset.

use super::tokens::Token;
use super::window::HashChains;
use crate::codec::{EngineDescriptor, MatchStrategy};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Match {
    length: usize,
    offset: usize,
}

/// Tokenizes one chunk with the strategy of an engine descriptor
pub struct Matcher<'a> {
    data: &'a [u8],
    engine: &'a EngineDescriptor,
    chains: HashChains,
    /// Positions below this have been inserted into the chains
    next_insert: usize,
}

impl<'a> Matcher<'a> {
    pub fn new(data: &'a [u8], engine: &'a EngineDescriptor) -> Self {
        Self {
            data,
            engine,
            chains: HashChains::new(engine.window_size, data.len()),
            next_insert: 0,
        }
    }

    /// Insert every position before `pos` into the chains
    #[inline]
    fn insert_up_to(&mut self, pos: usize) {
        while self.next_insert < pos {
            self.chains.insert(self.data, self.next_insert);
            self.next_insert += 1;
        }
    }

    /// Number of equal bytes at `earlier` and `pos`, capped at `max_len`
    #[inline]
    fn match_length(&self, earlier: usize, pos: usize, max_len: usize) -> usize {
        let a = &self.data[earlier..earlier + max_len];
        let b = &self.data[pos..pos + max_len];

        // Compare 8 bytes at a time, then locate the first differing byte
        let mut length = 0;
        for (x, y) in a.chunks_exact(8).zip(b.chunks_exact(8)) {
            let diff = load_u64(x) ^ load_u64(y);
            if diff != 0 {
                return length + (diff.trailing_zeros() / 8) as usize;
            }
            length += 8;
        }
        length + a[length..].iter().zip(&b[length..]).take_while(|(x, y)| x == y).count()
    }

    /// Find a match at `pos` longer than `floor` bytes
    ///
    /// A `floor` below the engine minimum is raised to it, so `find_match(pos, 0)`
    /// is an ordinary search.
    fn find_match(&mut self, pos: usize, floor: usize) -> Option<Match> {
        self.insert_up_to(pos);

        let max_len = self.engine.max_match.min(self.data.len() - pos);
        let mut best_len = floor.max(self.engine.min_match - 1);
        if max_len <= best_len {
            return None;
        }

        let first_fit = self.engine.strategy == MatchStrategy::Greedy;
        let mut best: Option<Match> = None;

        for cand in self.chains.candidates(self.data, pos).take(self.engine.search_depth) {
            // A longer match must agree one byte past the current best
            if self.data[cand + best_len] != self.data[pos + best_len] {
                continue;
            }
            let length = self.match_length(cand, pos, max_len);
            if length > best_len {
                best_len = length;
                best = Some(Match { length, offset: pos - cand });
                if first_fit || length >= self.engine.nice_match || length == max_len {
                    break;
                }
            }
        }

        best
    }

    /// Produce the token stream for the whole chunk
    pub fn tokenize(mut self) -> Vec<Token> {
        let len = self.data.len();
        let mut tokens = Vec::with_capacity(len / 4 + 16);
        let mut pos = 0;

        match self.engine.strategy {
            MatchStrategy::Greedy => {
                while pos < len {
                    match self.find_match(pos, 0) {
                        Some(m) => {
                            tokens.push(to_token(m));
                            pos += m.length;
                        }
                        None => {
                            tokens.push(Token::Literal(self.data[pos]));
                            pos += 1;
                        }
                    }
                }
            }
            MatchStrategy::Lazy => {
                let mut pending: Option<Match> = None;
                while pos < len {
                    let current = match pending.take() {
                        Some(m) => Some(m),
                        None => self.find_match(pos, 0),
                    };
                    let Some(m) = current else {
                        tokens.push(Token::Literal(self.data[pos]));
                        pos += 1;
                        continue;
                    };

                    if m.length < self.engine.good_match && pos + 1 < len {
                        if let Some(next) = self.find_match(pos + 1, m.length) {
                            tokens.push(Token::Literal(self.data[pos]));
                            pos += 1;
                            pending = Some(next);
                            continue;
                        }
                    }

                    tokens.push(to_token(m));
                    pos += m.length;
                }
            }
        }

        tokens
    }
}

#[inline]
fn load_u64(bytes: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(bytes);
    u64::from_le_bytes(word)
}

#[inline]
fn to_token(m: Match) -> Token {
    Token::Match { offset: m.offset as u32, length: m.length as u32 }
}

/// Tokenize `data` with the given engine
pub fn tokenize(data: &[u8], engine: &EngineDescriptor) -> Vec<Token> {
    Matcher::new(data, engine).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lz77::replay::replay_tokens;
    use crate::lz77::tokens::uncompressed_size;
    use crate::CompressionLevel;

    fn engine(level: i32) -> EngineDescriptor {
        EngineDescriptor::for_level(CompressionLevel::try_from(level).unwrap())
    }

    fn check_roundtrip(data: &[u8], engine: &EngineDescriptor) -> Vec<Token> {
        let tokens = tokenize(data, engine);
        assert_eq!(uncompressed_size(&tokens), data.len());
        for token in &tokens {
            if let Token::Match { offset, length } = *token {
                assert!(length as usize >= engine.min_match);
                assert!(length as usize <= engine.max_match);
                assert!(offset as usize <= engine.window_size);
            }
        }
        assert_eq!(replay_tokens(&tokens, data.len()).unwrap(), data);
        tokens
    }

    #[test]
    fn test_empty_and_short_inputs() {
        for level in 1..=9 {
            let e = engine(level);
            assert!(tokenize(b"", &e).is_empty());
            assert_eq!(tokenize(b"a", &e), vec![Token::Literal(b'a')]);
            assert_eq!(tokenize(b"aa", &e), vec![Token::Literal(b'a'), Token::Literal(b'a')]);
        }
    }

    #[test]
    fn test_repeated_pattern() {
        let data = b"abcabcabcabcabcabc";
        let tokens = check_roundtrip(data, &engine(9));
        assert_eq!(tokens[..3], [Token::Literal(b'a'), Token::Literal(b'b'), Token::Literal(b'c')]);
        assert_eq!(tokens[3], Token::Match { offset: 3, length: 15 });
    }

    #[test]
    fn test_run_of_single_byte() {
        let data = vec![b'z'; 1000];
        let tokens = check_roundtrip(&data, &engine(9));
        assert_eq!(tokens, vec![Token::Literal(b'z'), Token::Match { offset: 1, length: 999 }]);

        // Fast engine caps each match at 258 bytes
        let tokens = check_roundtrip(&data, &engine(1));
        assert_eq!(tokens[1], Token::Match { offset: 1, length: 258 });
    }

    #[test]
    fn test_fast_engine_min_match_four() {
        // "abc" repeats but a 3-byte match is below the fast minimum
        let data = b"abcXabcY";
        let tokens = check_roundtrip(data, &engine(1));
        assert!(tokens.iter().all(|t| matches!(t, Token::Literal(_))));

        let tokens = check_roundtrip(data, &engine(9));
        assert!(tokens.contains(&Token::Match { offset: 4, length: 3 }));
    }

    #[test]
    fn test_equal_length_prefers_smaller_offset() {
        // "abcd" occurs at 0 and 5; both give a 4-byte match at 10
        let data = b"abcd1abcd2abcd3";
        let tokens = check_roundtrip(data, &engine(9));
        assert!(tokens.contains(&Token::Match { offset: 5, length: 4 }));
        assert!(!tokens.contains(&Token::Match { offset: 10, length: 4 }));
    }

    #[test]
    fn test_lazy_defers_to_longer_match() {
        // At "abcde" (pos 12) greedy takes "abc" (3 bytes, from 0);
        // one byte later "bcdef" matches 5 bytes, so lazy emits a literal first.
        let data = b"abcQQQbcdefQabcdefZ";
        let lazy = check_roundtrip(data, &engine(6));
        assert!(lazy.contains(&Token::Match { offset: 7, length: 5 }));
        assert_eq!(lazy[12], Token::Literal(b'a'));
    }

    #[test]
    fn test_nice_match_stops_chain_walk() {
        // A 200-byte run of distinct bytes, a 150-byte copy of its prefix, then the
        // full run again. Level 6 stops at the nearer 150-byte candidate; level 9
        // keeps walking and finds the full 200 bytes further back.
        let run: Vec<u8> = (0..200u32).map(|i| (i * 7 % 251) as u8).collect();
        let mut data = run.clone();
        data.extend_from_slice(&[252, 253, 254]);
        data.extend_from_slice(&run[..150]);
        data.extend_from_slice(&[255, 254, 253]);
        data.extend_from_slice(&run);

        let level6 = check_roundtrip(&data, &engine(6));
        assert!(level6.contains(&Token::Match { offset: 153, length: 150 }));
        assert!(!level6.contains(&Token::Match { offset: 356, length: 200 }));

        let level9 = check_roundtrip(&data, &engine(9));
        assert!(level9.contains(&Token::Match { offset: 356, length: 200 }));
    }

    #[test]
    fn test_good_match_skips_lookahead() {
        // At pos 27 "abcdefghij" matches 10 bytes; one byte later 15 bytes match.
        // Level 6 keeps a match of 8 or more bytes, level 9 defers below 32.
        let data = b"abcdefghij#bcdefghijklmnop%abcdefghijklmnop";

        let level6 = check_roundtrip(data, &engine(6));
        assert!(level6.contains(&Token::Match { offset: 27, length: 10 }));

        let level9 = check_roundtrip(data, &engine(9));
        let at = level9.iter().position(|t| *t == Token::Match { offset: 17, length: 15 });
        assert!(matches!(at, Some(i) if level9[i - 1] == Token::Literal(b'a')));
        assert!(!level9.contains(&Token::Match { offset: 27, length: 10 }));
    }

    #[test]
    fn test_match_length_across_words() {
        // Mismatches at every offset around the 8-byte comparison boundary
        for split in [1usize, 7, 8, 9, 15, 16, 17, 40] {
            let mut data: Vec<u8> = (0..64u8).collect();
            let mut copy = data.clone();
            copy[split] ^= 0xFF;
            data.extend_from_slice(&copy);
            let e = engine(9);
            let matcher = Matcher::new(&data, &e);
            assert_eq!(matcher.match_length(0, 64, 64), split);
            assert_eq!(matcher.match_length(0, 0, 64), 64);
        }
    }

    #[test]
    fn test_window_bounds_offsets() {
        // Repeat separated by 70 000 bytes: outside a 64 KiB window, inside 256 KiB
        let mut data: Vec<u8> = (0..2000u32).map(|i| (i * 7 % 251) as u8).collect();
        let mut state = 0x1234_5678u32;
        for _ in 0..70_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            data.push((state >> 24) as u8);
        }
        let prefix = data[..2000].to_vec();
        data.extend_from_slice(&prefix);

        let far = |tokens: &[Token]| {
            tokens.iter().any(|t| matches!(t, Token::Match { offset, length } if *offset >= 70_000 && *length >= 100))
        };
        assert!(!far(&check_roundtrip(&data, &engine(6))));
        assert!(far(&check_roundtrip(&data, &engine(7))));
    }

    #[test]
    fn test_deterministic() {
        let data: Vec<u8> = (0..20_000u32).map(|i| ((i * 31) ^ (i >> 3)) as u8).collect();
        for level in [1, 5, 6, 9] {
            let e = engine(level);
            assert_eq!(tokenize(&data, &e), tokenize(&data, &e));
            check_roundtrip(&data, &e);
        }
    }
}
