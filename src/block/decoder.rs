use super::frame::Block;
use super::header::BlockKind;
use crate::bits::BitReader;
use crate::error::{Corruption, Result};
use crate::huffman::TokenDecoder;
use crate::lz77::Replay;

/// Decode one parsed block into exactly `uncompressed_len` bytes
pub fn decode_block(block: &Block<'_>) -> Result<Vec<u8>> {
    let declared = block.header.uncompressed_len as usize;

    match block.header.kind {
        BlockKind::Stored => {
            if !block.table.is_empty() {
                return Err(Corruption::TrailingData(block.table.len()).into());
            }
            if block.payload.len() != declared {
                return Err(Corruption::BlockLengthMismatch {
                    indexed: block.payload.len() as u64,
                    declared: declared as u64,
                }
                .into());
            }
            Ok(block.payload.to_vec())
        }
        BlockKind::Huffman => {
            if declared == 0 {
                let extra = block.table.len() + block.payload.len();
                if extra > 0 {
                    return Err(Corruption::TrailingData(extra).into());
                }
                return Ok(Vec::new());
            }

            let mut bits = BitReader::new(block.table);
            let decoder = TokenDecoder::read_table(&mut bits)?;
            check_fully_consumed(&bits)?;

            let mut bits = BitReader::new(block.payload);
            let mut replay = Replay::new(declared);
            while !replay.is_complete() {
                replay.apply(decoder.read_token(&mut bits)?)?;
            }
            check_fully_consumed(&bits)?;

            Ok(replay.finish())
        }
    }
}

/// Only zero padding bits of the final byte may remain
fn check_fully_consumed(bits: &BitReader<'_>) -> Result<()> {
    let remaining = bits.remaining_bytes();
    if remaining > 0 || !bits.padding_is_zero() {
        return Err(Corruption::TrailingData(remaining).into());
    }
    Ok(())
}
