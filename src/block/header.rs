use super::constants::{BLOCK_HEADER_LEN, KIND_HUFFMAN, KIND_STORED};
use crate::codec::Engine;
use crate::error::{Corruption, Error, Result};

/// How a block's payload is encoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Serialized Huffman table followed by the coded token stream
    Huffman,
    /// Raw chunk bytes
    Stored,
}

impl BlockKind {
    pub fn id(self) -> u8 {
        match self {
            BlockKind::Huffman => KIND_HUFFMAN,
            BlockKind::Stored => KIND_STORED,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            KIND_HUFFMAN => Some(BlockKind::Huffman),
            KIND_STORED => Some(BlockKind::Stored),
            _ => None,
        }
    }
}

/// Parsed block header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub engine: Engine,
    pub kind: BlockKind,
    pub uncompressed_len: u32,
    pub table_len: u32,
    pub payload_len: u32,
}

impl BlockHeader {
    /// Parse a header from the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < BLOCK_HEADER_LEN {
            return Err(Error::TruncatedInput);
        }

        let engine = Engine::from_id(data[0]).ok_or(Corruption::UnknownEngine(data[0]))?;
        let kind = BlockKind::from_id(data[1]).ok_or(Corruption::UnknownBlockKind(data[1]))?;
        let uncompressed_len = read_u32(data, 2);
        let table_len = read_u32(data, 6);
        let payload_len = read_u32(data, 10);

        Ok(BlockHeader { engine, kind, uncompressed_len, table_len, payload_len })
    }

    /// Append the encoded header to `out`
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.engine.id());
        out.push(self.kind.id());
        out.extend_from_slice(&self.uncompressed_len.to_le_bytes());
        out.extend_from_slice(&self.table_len.to_le_bytes());
        out.extend_from_slice(&self.payload_len.to_le_bytes());
    }

    /// Full block size this header describes, header included
    pub fn block_len(&self) -> u64 {
        BLOCK_HEADER_LEN as u64 + self.table_len as u64 + self.payload_len as u64
    }
}

/// Read a little-endian u32 at `offset`; caller checks bounds
#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}
