//! The codec facade: engine selection, chunking and the compress/decompress pipeline

pub mod parallel;

use std::fmt;

use log::debug;

use crate::block::constants::{
    CHUNK_INDEX_ENTRY_LEN, ENGINE_DEEP, ENGINE_FAST, FRAME_HEADER_LEN, MIN_FRAME_LEN,
    PER_CHUNK_OVERHEAD,
};
use crate::block::{decode_block, encode_block, parse_frame, write_frame};
use crate::error::{Error, Result};
use crate::huffman::tables::MAX_MATCH;
use crate::{CodecConfig, CompressionLevel};

/// Which match engine produced a block
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Greedy matching, levels 1-5
    Fast,
    /// Lazy matching with deep chain search, levels 6-9
    Deep,
}

impl Engine {
    /// Identifier stored in block headers
    pub fn id(self) -> u8 {
        match self {
            Engine::Fast => ENGINE_FAST,
            Engine::Deep => ENGINE_DEEP,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            ENGINE_FAST => Some(Engine::Fast),
            ENGINE_DEEP => Some(Engine::Deep),
            _ => None,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Fast => write!(f, "fast"),
            Engine::Deep => write!(f, "deep"),
        }
    }
}

/// How the match finder picks among candidates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStrategy {
    /// First candidate reaching the minimum length, no lookahead
    Greedy,
    /// Longest candidate within the search depth, deferred by one byte
    /// when the next position matches strictly longer
    Lazy,
}

/// Immutable match engine parameters, fixed by the compression level
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineDescriptor {
    pub engine: Engine,
    pub level: CompressionLevel,
    pub strategy: MatchStrategy,
    /// Maximum back-reference distance, a power of two
    pub window_size: usize,
    pub min_match: usize,
    pub max_match: usize,
    /// Chain candidates examined per position
    pub search_depth: usize,
    /// Lazy matching keeps a match at least this long without trying the next byte
    pub good_match: usize,
    /// A chain search stops at the first candidate reaching this length
    pub nice_match: usize,
}

impl EngineDescriptor {
    pub fn for_level(level: CompressionLevel) -> Self {
        let n = level.level() as usize;
        if level.uses_deep_engine() {
            let window_log = 16 + 2 * (n - 6);
            let (good_match, nice_match) = if n < 8 { (8, 128) } else { (32, 258) };
            Self {
                engine: Engine::Deep,
                level,
                strategy: MatchStrategy::Lazy,
                window_size: 1 << window_log,
                min_match: 3,
                max_match: MAX_MATCH as usize,
                search_depth: 1 << (window_log - 10),
                good_match,
                nice_match,
            }
        } else {
            Self {
                engine: Engine::Fast,
                level,
                strategy: MatchStrategy::Greedy,
                window_size: 1 << 16,
                min_match: 4,
                max_match: 258,
                search_depth: 4 * n,
                good_match: 258,
                nice_match: 258,
            }
        }
    }
}

/// Block compressor with an engine fixed at construction
///
/// Holds no mutable state, so one instance can serve concurrent calls.
#[derive(Clone, Debug)]
pub struct Codec {
    config: CodecConfig,
    engine: EngineDescriptor,
}

impl Codec {
    /// Create a codec for `level` (1-9) with default chunking and threads
    pub fn new(level: i32) -> Result<Self> {
        let compression_level = CompressionLevel::try_from(level)?;
        Self::with_config(CodecConfig { compression_level, ..Default::default() })
    }

    pub fn with_config(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        let engine = EngineDescriptor::for_level(config.compression_level);
        debug!(
            "Codec level {}: {} engine, window {} bytes, search depth {}, nice match {}",
            config.compression_level.level(),
            engine.engine,
            engine.window_size,
            engine.search_depth,
            engine.nice_match
        );
        Ok(Self { config, engine })
    }

    pub fn engine(&self) -> &EngineDescriptor {
        &self.engine
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn chunk_count(&self, len: usize) -> usize {
        let size = self.config.effective_chunk_size();
        (len / size + usize::from(len % size != 0)).max(1)
    }

    /// Largest frame `compress` can produce for `len` input bytes
    pub fn compress_bound(&self, len: usize) -> usize {
        FRAME_HEADER_LEN + self.chunk_count(len) * PER_CHUNK_OVERHEAD + len
    }

    /// Compress `data` into a frame of at most `max_output_size` bytes
    pub fn compress(&self, data: &[u8], max_output_size: usize) -> Result<Vec<u8>> {
        if max_output_size < MIN_FRAME_LEN {
            return Err(Error::BufferTooSmall { capacity: max_output_size });
        }

        let chunks: Vec<&[u8]> = if data.is_empty() {
            vec![data]
        } else {
            data.chunks(self.config.effective_chunk_size()).collect()
        };
        let budget = max_output_size
            .checked_sub(FRAME_HEADER_LEN + chunks.len() * CHUNK_INDEX_ENTRY_LEN)
            .ok_or(Error::BufferTooSmall { capacity: max_output_size })?;
        let num_threads = self.config.effective_threads().min(chunks.len());

        let encoded: Result<Vec<Vec<u8>>> = if num_threads > 1 {
            // Every block gets the whole budget; the frame total is checked below
            parallel::map_ordered(&chunks, num_threads, |chunk| {
                encode_block(chunk, &self.engine, budget)
            })
        } else {
            let mut remaining = budget;
            chunks
                .iter()
                .map(|chunk| {
                    let block = encode_block(chunk, &self.engine, remaining)?;
                    remaining -= block.len();
                    Ok(block)
                })
                .collect()
        };
        let blocks = encoded.map_err(|e| match e {
            Error::BufferTooSmall { .. } => Error::BufferTooSmall { capacity: max_output_size },
            other => other,
        })?;

        let output = write_frame(&blocks, max_output_size)?;
        debug!(
            "Compressed {} bytes into {} bytes ({} chunks, {} threads)",
            data.len(),
            output.len(),
            blocks.len(),
            num_threads
        );
        Ok(output)
    }

    /// Decompress a frame whose content must be exactly `original_size` bytes
    pub fn decompress(&self, data: &[u8], original_size: usize) -> Result<Vec<u8>> {
        let blocks = parse_frame(data)?;

        let declared: u64 = blocks.iter().map(|b| b.header.uncompressed_len as u64).sum();
        if declared != original_size as u64 {
            return Err(Error::SizeMismatch { expected: original_size as u64, found: declared });
        }

        let num_threads = self.config.effective_threads().min(blocks.len());
        let parts = if num_threads > 1 {
            parallel::map_ordered(&blocks, num_threads, decode_block)?
        } else {
            blocks.iter().map(decode_block).collect::<Result<Vec<_>>>()?
        };

        let mut output = Vec::with_capacity(original_size);
        for part in parts {
            output.extend_from_slice(&part);
        }
        debug!(
            "Decompressed {} bytes into {} bytes ({} chunks, {} threads)",
            data.len(),
            output.len(),
            blocks.len(),
            num_threads
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::inspect;
    use crate::block::BlockKind;

    #[test]
    fn test_engine_table() {
        let expect = [
            (1, Engine::Fast, 1 << 16, 4, 258, 4, 258),
            (5, Engine::Fast, 1 << 16, 4, 258, 20, 258),
            (6, Engine::Deep, 1 << 16, 3, 65_538, 64, 128),
            (7, Engine::Deep, 1 << 18, 3, 65_538, 256, 128),
            (8, Engine::Deep, 1 << 20, 3, 65_538, 1024, 258),
            (9, Engine::Deep, 1 << 22, 3, 65_538, 4096, 258),
        ];
        for (level, engine, window, min, max, depth, nice) in expect {
            let d = EngineDescriptor::for_level(CompressionLevel::try_from(level).unwrap());
            assert_eq!(d.engine, engine);
            assert_eq!(d.window_size, window);
            assert_eq!(d.min_match, min);
            assert_eq!(d.max_match, max);
            assert_eq!(d.search_depth, depth);
            assert_eq!(d.nice_match, nice);
            assert!(d.min_match < d.good_match && d.good_match <= d.nice_match);
            assert!(d.nice_match <= d.max_match);
        }
    }

    #[test]
    fn test_engine_ids() {
        for engine in [Engine::Fast, Engine::Deep] {
            assert_eq!(Engine::from_id(engine.id()), Some(engine));
        }
        assert_eq!(Engine::from_id(0), None);
        assert_eq!(Engine::Deep.to_string(), "deep");
    }

    #[test]
    fn test_invalid_level() {
        assert!(matches!(Codec::new(0), Err(Error::InvalidConfig(_))));
        assert!(matches!(Codec::new(10), Err(Error::InvalidConfig(_))));
        let config = CodecConfig { chunk_size: 100, ..Default::default() };
        assert!(matches!(Codec::with_config(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_roundtrip_small() {
        let codec = Codec::new(6).unwrap();
        for data in [&b""[..], b"a", b"ab", b"hello hello hello hello"] {
            let compressed = codec.compress(data, codec.compress_bound(data.len())).unwrap();
            assert_eq!(codec.decompress(&compressed, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn test_capacity_below_minimal_frame() {
        let codec = Codec::new(9).unwrap();
        assert!(matches!(
            codec.compress(b"", MIN_FRAME_LEN - 1),
            Err(Error::BufferTooSmall { capacity }) if capacity == MIN_FRAME_LEN - 1
        ));
        assert_eq!(codec.compress(b"", MIN_FRAME_LEN).unwrap().len(), MIN_FRAME_LEN);
    }

    #[test]
    fn test_size_mismatch_checked_before_decoding() {
        let codec = Codec::new(9).unwrap();
        let compressed = codec.compress(&[b'A'; 1024], 1100).unwrap();
        assert!(matches!(
            codec.decompress(&compressed, 924),
            Err(Error::SizeMismatch { expected: 924, found: 1024 })
        ));
    }

    #[test]
    fn test_chunked_parallel_matches_sequential() {
        let data: Vec<u8> = (0..40_000u32).map(|i| ((i / 7) ^ (i % 13)) as u8).collect();
        let config = |num_threads| CodecConfig {
            compression_level: CompressionLevel::Level6,
            chunk_size: 4096,
            num_threads,
        };
        let sequential = Codec::with_config(config(1)).unwrap();
        let parallel = Codec::with_config(config(4)).unwrap();

        let a = sequential.compress(&data, usize::MAX).unwrap();
        let b = parallel.compress(&data, usize::MAX).unwrap();
        assert_eq!(a, b);
        assert_eq!(inspect(&a).unwrap().chunk_count(), 10);
        assert_eq!(parallel.decompress(&a, data.len()).unwrap(), data);
        assert_eq!(sequential.decompress(&b, data.len()).unwrap(), data);
    }

    #[test]
    fn test_bound_holds_for_incompressible_input() {
        let mut state = 0x2545_F491u32;
        let data: Vec<u8> = (0..10_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 8) as u8
            })
            .collect();
        let codec = Codec::with_config(CodecConfig { chunk_size: 4096, ..Default::default() })
            .unwrap();
        let bound = codec.compress_bound(data.len());
        assert_eq!(bound, 7 + 3 * 18 + 10_000);
        let compressed = codec.compress(&data, bound).unwrap();
        assert!(compressed.len() <= bound);
        let info = inspect(&compressed).unwrap();
        assert!(info.blocks.iter().all(|b| b.kind == BlockKind::Stored));
        assert_eq!(codec.decompress(&compressed, data.len()).unwrap(), data);
    }
}
