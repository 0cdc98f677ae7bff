//! Canonical Huffman coding for the literal/length and distance alphabets
//!
//! Each Huffman block carries its own code lengths, serialized with the
//! run-length scheme used by DEFLATE dynamic blocks.

pub mod decoder;
pub mod encoder;
pub mod tables;

pub use decoder::{HuffmanDecoder, TokenDecoder};
pub use encoder::HuffmanTable;
