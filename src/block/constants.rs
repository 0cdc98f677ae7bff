/// Frame magic bytes
pub const MAGIC: [u8; 2] = *b"HZ";

/// Frame format version
pub const VERSION: u8 = 1;

/// Frame header size (magic + version + chunk count)
pub const FRAME_HEADER_LEN: usize = 7;

/// Size of one chunk index entry (block length)
pub const CHUNK_INDEX_ENTRY_LEN: usize = 4;

/// Block header size (engine + kind + three u32 lengths)
pub const BLOCK_HEADER_LEN: usize = 14;

/// Smallest well-formed frame: one empty block
pub const MIN_FRAME_LEN: usize = FRAME_HEADER_LEN + CHUNK_INDEX_ENTRY_LEN + BLOCK_HEADER_LEN;

/// Engine identifiers stored in block headers
pub const ENGINE_FAST: u8 = 1;
pub const ENGINE_DEEP: u8 = 2;

/// Block kinds
pub const KIND_HUFFMAN: u8 = 0;
pub const KIND_STORED: u8 = 1;

/// Largest chunk a single block can describe
pub const MAX_BLOCK_LEN: usize = u32::MAX as usize;

/// Worst-case bytes added per chunk (index entry + block header)
pub const PER_CHUNK_OVERHEAD: usize = CHUNK_INDEX_ENTRY_LEN + BLOCK_HEADER_LEN;
