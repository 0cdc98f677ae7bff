//! Block encoding with stored fallback
//!
//! A chunk is Huffman coded when the table plus token stream is no larger
//! than the chunk itself; otherwise the raw bytes are stored. Every bit
//! writer is capped at `min(chunk length, budget)`, so encoding stops as soon
//! as either bound is crossed. The choice depends only on the chunk: when the
//! budget is what ran out and the chunk would not fit raw either, the block
//! fails instead of switching kind.

use log::trace;

use super::constants::{BLOCK_HEADER_LEN, MAX_BLOCK_LEN};
use super::header::{BlockHeader, BlockKind};
use crate::bits::BitWriter;
use crate::codec::EngineDescriptor;
use crate::error::{Error, Result};
use crate::huffman::HuffmanTable;
use crate::lz77::tokenize;

/// Encode one chunk as a complete block of at most `budget` bytes
pub fn encode_block(chunk: &[u8], engine: &EngineDescriptor, budget: usize) -> Result<Vec<u8>> {
    if chunk.len() > MAX_BLOCK_LEN {
        return Err(Error::Internal(format!("chunk of {} bytes exceeds block limit", chunk.len())));
    }
    let body_budget =
        budget.checked_sub(BLOCK_HEADER_LEN).ok_or(Error::BufferTooSmall { capacity: budget })?;

    let mut header = BlockHeader {
        engine: engine.engine,
        kind: BlockKind::Huffman,
        uncompressed_len: chunk.len() as u32,
        table_len: 0,
        payload_len: 0,
    };

    if chunk.is_empty() {
        let mut out = Vec::with_capacity(BLOCK_HEADER_LEN);
        header.write(&mut out);
        return Ok(out);
    }

    let limit = chunk.len().min(body_budget);
    match encode_huffman(chunk, engine, limit) {
        Ok((table, payload)) => {
            header.table_len = table.len() as u32;
            header.payload_len = payload.len() as u32;
            let mut out = Vec::with_capacity(BLOCK_HEADER_LEN + table.len() + payload.len());
            header.write(&mut out);
            out.extend_from_slice(&table);
            out.extend_from_slice(&payload);
            Ok(out)
        }
        Err(Error::BufferTooSmall { .. }) if chunk.len() <= body_budget => {
            trace!("Storing {} byte chunk raw: Huffman coding does not shrink it", chunk.len());
            header.kind = BlockKind::Stored;
            header.payload_len = chunk.len() as u32;
            let mut out = Vec::with_capacity(BLOCK_HEADER_LEN + chunk.len());
            header.write(&mut out);
            out.extend_from_slice(chunk);
            Ok(out)
        }
        Err(Error::BufferTooSmall { .. }) => Err(Error::BufferTooSmall { capacity: budget }),
        Err(e) => Err(e),
    }
}

/// Huffman code a chunk into (table bytes, payload bytes), `limit` bytes total
fn encode_huffman(
    chunk: &[u8],
    engine: &EngineDescriptor,
    limit: usize,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let tokens = tokenize(chunk, engine);
    let table = HuffmanTable::build(&tokens)?;

    let mut writer = BitWriter::with_limit(limit);
    table.write(&mut writer)?;
    let table_bytes = writer.finish()?;

    let mut writer = BitWriter::with_limit(limit - table_bytes.len());
    table.encode(&mut writer, &tokens)?;
    let payload = writer.finish()?;

    trace!(
        "Huffman block: {} bytes -> {} tokens, table {} + payload {} bytes",
        chunk.len(),
        tokens.len(),
        table_bytes.len(),
        payload.len()
    );
    Ok((table_bytes, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::decoder::decode_block;
    use crate::block::frame::Block;
    use crate::CompressionLevel;

    fn deep() -> EngineDescriptor {
        EngineDescriptor::for_level(CompressionLevel::Level9)
    }

    fn decode(block: &[u8]) -> Vec<u8> {
        decode_block(&Block::parse(block).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_chunk() {
        let block = encode_block(b"", &deep(), 100).unwrap();
        assert_eq!(block.len(), BLOCK_HEADER_LEN);
        let header = BlockHeader::parse(&block).unwrap();
        assert_eq!(header.kind, BlockKind::Huffman);
        assert_eq!(header.uncompressed_len, 0);
        assert_eq!(header.table_len, 0);
        assert_eq!(decode(&block), b"");
    }

    #[test]
    fn test_tiny_chunk_is_stored() {
        for data in [&b"x"[..], b"xy", b"xyz"] {
            let block = encode_block(data, &deep(), 1000).unwrap();
            let header = BlockHeader::parse(&block).unwrap();
            assert_eq!(header.kind, BlockKind::Stored);
            assert_eq!(header.payload_len as usize, data.len());
            assert_eq!(decode(&block), data);
        }
    }

    #[test]
    fn test_repetitive_chunk_is_huffman() {
        let data = vec![b'A'; 4096];
        let block = encode_block(&data, &deep(), usize::MAX).unwrap();
        let header = BlockHeader::parse(&block).unwrap();
        assert_eq!(header.kind, BlockKind::Huffman);
        assert_eq!(header.engine, crate::codec::Engine::Deep);
        assert!(block.len() < 64);
        assert_eq!(decode(&block), data);
    }

    #[test]
    fn test_budget_too_small() {
        let data = vec![b'A'; 4096];
        let full = encode_block(&data, &deep(), usize::MAX).unwrap();
        assert!(matches!(
            encode_block(&data, &deep(), full.len() - 1),
            Err(Error::BufferTooSmall { capacity }) if capacity == full.len() - 1
        ));
        assert_eq!(encode_block(&data, &deep(), full.len()).unwrap(), full);
        assert!(matches!(encode_block(&data, &deep(), 3), Err(Error::BufferTooSmall { .. })));
    }

    #[test]
    fn test_kind_independent_of_budget() {
        // Incompressible: stored whenever the raw bytes fit
        let mut state = 0x9E37_79B9u32;
        let data: Vec<u8> = (0..2048)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();
        let exact = BLOCK_HEADER_LEN + data.len();
        let block = encode_block(&data, &deep(), exact).unwrap();
        assert_eq!(BlockHeader::parse(&block).unwrap().kind, BlockKind::Stored);
        assert_eq!(encode_block(&data, &deep(), exact * 2).unwrap(), block);
        assert!(encode_block(&data, &deep(), exact - 1).is_err());
    }
}
