pub mod bits;
pub mod block;
pub mod codec;
pub mod error;
pub mod huffman;
pub mod lz77;

pub use block::{inspect, is_frame, BlockInfo, BlockKind, FrameInfo};
pub use codec::{Codec, Engine, EngineDescriptor, MatchStrategy};
pub use error::{Corruption, Error, Result};
pub use lz77::Token;

/// Smallest accepted chunk size when chunking is enabled
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Default uncompressed bytes per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Compression level (1-9)
///
/// - Levels 1-5: fast engine, greedy matching over a 64 KiB window
/// - Levels 6-9: deep engine, lazy matching over a 64 KiB to 4 MiB window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionLevel {
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    Level6 = 6,
    Level7 = 7,
    Level8 = 8,
    #[default]
    Level9 = 9,
}

impl CompressionLevel {
    /// Get numeric level (1-9)
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Whether this level selects the deep engine (levels 6-9)
    pub fn uses_deep_engine(&self) -> bool {
        self.level() >= 6
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        Ok(match level {
            1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            4 => Self::Level4,
            5 => Self::Level5,
            6 => Self::Level6,
            7 => Self::Level7,
            8 => Self::Level8,
            9 => Self::Level9,
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "compression level {} out of range 1-9",
                    level
                )))
            }
        })
    }
}

/// Configuration for a codec instance
#[derive(Clone, Debug)]
pub struct CodecConfig {
    /// Compression level, fixes the engine for the codec's lifetime
    pub compression_level: CompressionLevel,
    /// Uncompressed bytes per chunk (default 1 MiB, 0 = one block per call)
    pub chunk_size: usize,
    /// Number of worker threads (0 = auto, 1 = single-threaded)
    pub num_threads: usize,
}

impl CodecConfig {
    /// Check the settings a codec cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size != 0
            && !(MIN_CHUNK_SIZE..=block::constants::MAX_BLOCK_LEN).contains(&self.chunk_size)
        {
            return Err(Error::InvalidConfig(format!(
                "chunk size {} must be 0 or between {} and {}",
                self.chunk_size,
                MIN_CHUNK_SIZE,
                block::constants::MAX_BLOCK_LEN
            )));
        }
        Ok(())
    }

    /// Chunk length actually used to split input
    pub fn effective_chunk_size(&self) -> usize {
        match self.chunk_size {
            0 => block::constants::MAX_BLOCK_LEN,
            n => n,
        }
    }

    /// Worker count after resolving auto and clamping
    pub fn effective_threads(&self) -> usize {
        match self.num_threads {
            0 => num_cpus::get().clamp(1, 32),
            n => n.clamp(1, 32),
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_level: CompressionLevel::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            num_threads: 0,
        }
    }
}
