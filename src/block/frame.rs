//! Frame assembly, parsing and inspection
//!
//! A frame is `"HZ"`, a version byte, a u32 chunk count and one u32 block
//! length per chunk, followed by the blocks in chunk order. The index lets a
//! reader split the frame into independently decodable blocks without
//! touching any payload.

use super::constants::{
    BLOCK_HEADER_LEN, CHUNK_INDEX_ENTRY_LEN, FRAME_HEADER_LEN, MAGIC, VERSION,
};
use super::header::{read_u32, BlockHeader, BlockKind};
use crate::codec::Engine;
use crate::error::{Corruption, Error, Result};

/// One block of a frame, split into its sections
#[derive(Clone, Copy, Debug)]
pub struct Block<'a> {
    pub header: BlockHeader,
    pub table: &'a [u8],
    pub payload: &'a [u8],
}

impl<'a> Block<'a> {
    /// Parse a block occupying exactly `data`
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = BlockHeader::parse(data)?;
        if header.block_len() != data.len() as u64 {
            return Err(Corruption::BlockLengthMismatch {
                indexed: data.len() as u64,
                declared: header.block_len(),
            }
            .into());
        }
        let (table, payload) = data[BLOCK_HEADER_LEN..].split_at(header.table_len as usize);
        Ok(Block { header, table, payload })
    }
}

/// Summary of one block, as reported by [`inspect`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub engine: Engine,
    pub kind: BlockKind,
    pub uncompressed_len: u32,
    pub compressed_len: u32,
}

/// Summary of a frame, as reported by [`inspect`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    pub version: u8,
    pub blocks: Vec<BlockInfo>,
    /// Total frame size in bytes
    pub compressed_len: u64,
    /// Sum of block uncompressed lengths
    pub uncompressed_len: u64,
}

impl FrameInfo {
    pub fn chunk_count(&self) -> usize {
        self.blocks.len()
    }

    /// Blocks that fell back to raw storage
    pub fn stored_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.kind == BlockKind::Stored).count()
    }
}

/// Size of a frame holding blocks of the given lengths
pub fn frame_len(block_lens: impl IntoIterator<Item = usize>) -> usize {
    block_lens
        .into_iter()
        .fold(FRAME_HEADER_LEN, |acc, len| acc.saturating_add(CHUNK_INDEX_ENTRY_LEN + len))
}

/// Assemble encoded blocks into a frame of at most `capacity` bytes
pub fn write_frame(blocks: &[Vec<u8>], capacity: usize) -> Result<Vec<u8>> {
    if blocks.is_empty() || blocks.len() > u32::MAX as usize {
        return Err(Error::Internal(format!("cannot frame {} blocks", blocks.len())));
    }
    let total = frame_len(blocks.iter().map(Vec::len));
    if total > capacity {
        return Err(Error::BufferTooSmall { capacity });
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&(blocks.len() as u32).to_le_bytes());
    for block in blocks {
        out.extend_from_slice(&(block.len() as u32).to_le_bytes());
    }
    for block in blocks {
        out.extend_from_slice(block);
    }
    Ok(out)
}

/// Split a frame into its block slices using the chunk index
fn split_blocks(data: &[u8]) -> Result<Vec<&[u8]>> {
    if data.len() < MAGIC.len() {
        return Err(Error::TruncatedInput);
    }
    if data[..2] != MAGIC {
        return Err(Corruption::InvalidMagic(u16::from_be_bytes([data[0], data[1]])).into());
    }
    if data.len() < FRAME_HEADER_LEN {
        return Err(Error::TruncatedInput);
    }
    if data[2] != VERSION {
        return Err(Corruption::UnsupportedVersion(data[2]).into());
    }

    let chunk_count = read_u32(data, 3) as usize;
    if chunk_count == 0 {
        return Err(Corruption::EmptyFrame.into());
    }
    let index_end = (chunk_count as u64) * CHUNK_INDEX_ENTRY_LEN as u64 + FRAME_HEADER_LEN as u64;
    if index_end > data.len() as u64 {
        return Err(Error::TruncatedInput);
    }

    let mut blocks = Vec::with_capacity(chunk_count);
    let mut offset = index_end as usize;
    for i in 0..chunk_count {
        let len = read_u32(data, FRAME_HEADER_LEN + i * CHUNK_INDEX_ENTRY_LEN) as usize;
        let available = data.len() - offset;
        if len > available {
            return Err(Corruption::LengthOutOfBounds {
                declared: len as u64,
                available: available as u64,
            }
            .into());
        }
        blocks.push(&data[offset..offset + len]);
        offset += len;
    }

    if offset < data.len() {
        return Err(Corruption::TrailingData(data.len() - offset).into());
    }
    Ok(blocks)
}

/// Parse a frame and every block header, without decoding payloads
pub fn parse_frame(data: &[u8]) -> Result<Vec<Block<'_>>> {
    split_blocks(data)?.into_iter().map(Block::parse).collect()
}

/// Validate a frame's structure and describe its blocks
pub fn inspect(data: &[u8]) -> Result<FrameInfo> {
    let blocks = parse_frame(data)?;
    let blocks: Vec<BlockInfo> = blocks
        .iter()
        .map(|b| BlockInfo {
            engine: b.header.engine,
            kind: b.header.kind,
            uncompressed_len: b.header.uncompressed_len,
            compressed_len: b.header.block_len() as u32,
        })
        .collect();
    let uncompressed_len = blocks.iter().map(|b| b.uncompressed_len as u64).sum();

    Ok(FrameInfo { version: VERSION, blocks, compressed_len: data.len() as u64, uncompressed_len })
}

/// Cheap check for the frame magic and version
pub fn is_frame(data: &[u8]) -> bool {
    data.len() >= FRAME_HEADER_LEN && data[..2] == MAGIC && data[2] == VERSION
}
