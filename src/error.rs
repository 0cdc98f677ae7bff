use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Capacity errors
    #[error("Output buffer too small: encoded result exceeds {capacity} bytes")]
    BufferTooSmall { capacity: usize },

    // Size errors
    #[error("Size mismatch: expected {expected} bytes, got {found}")]
    SizeMismatch { expected: u64, found: u64 },

    // Stream errors
    #[error("Corrupt stream: {0}")]
    CorruptStream(#[from] Corruption),

    #[error("Unexpected end of input")]
    TruncatedInput,

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// What was malformed in a compressed frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    // Frame and block headers
    #[error("invalid frame magic: expected 0x485a, got 0x{0:04x}")]
    InvalidMagic(u16),

    #[error("unsupported frame version: {0}")]
    UnsupportedVersion(u8),

    #[error("frame declares no chunks")]
    EmptyFrame,

    #[error("unknown engine id: {0}")]
    UnknownEngine(u8),

    #[error("unknown block kind: {0}")]
    UnknownBlockKind(u8),

    #[error("header declares {declared} bytes but only {available} remain")]
    LengthOutOfBounds { declared: u64, available: u64 },

    #[error("block section lengths disagree: index says {indexed}, header says {declared}")]
    BlockLengthMismatch { indexed: u64, declared: u64 },

    #[error("{0} trailing bytes after end of data")]
    TrailingData(usize),

    // Huffman tables
    #[error("invalid Huffman code length: {0} (max 15)")]
    InvalidCodeLength(u8),

    #[error("Huffman code oversubscribed: more codes than possible for bit length")]
    HuffmanOversubscribed,

    #[error("Huffman table has no codes")]
    EmptyTable,

    #[error("Huffman table declares {found} {alphabet} symbols, at most {max} exist")]
    AlphabetOverflow { alphabet: &'static str, found: usize, max: usize },

    #[error("Huffman table describes {found} code lengths, expected {expected}")]
    CodeLengthCount { expected: usize, found: usize },

    #[error("repeat code with no previous length")]
    RepeatWithoutPrevious,

    #[error("invalid Huffman symbol: {0}")]
    InvalidHuffmanSymbol(u32),

    // Token stream
    #[error("invalid length code: {0}")]
    InvalidLengthCode(u16),

    #[error("invalid distance code: {0}")]
    InvalidDistanceCode(u16),

    #[error("back-reference distance {distance} exceeds available window {available}")]
    InvalidBackReference { distance: u32, available: usize },

    #[error("token overruns block: {produced} bytes produced, block holds {declared}")]
    BlockOverrun { produced: u64, declared: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
