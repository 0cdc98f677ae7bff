//! Block and frame wire format
//!
//! Every chunk becomes one self-describing block: a 14-byte header, then
//! either a serialized Huffman table and coded token stream or the raw
//! chunk bytes. Blocks are gathered into a frame behind a chunk index.

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod header;

pub use decoder::decode_block;
pub use encoder::encode_block;
pub use frame::{inspect, is_frame, parse_frame, write_frame, Block, BlockInfo, FrameInfo};
pub use header::{BlockHeader, BlockKind};
